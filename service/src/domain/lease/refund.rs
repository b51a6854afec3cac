//! Refund owed to a tenant on an early termination of a [`Lease`].
//!
//! Every month is considered to have [`DAYS_IN_MONTH`] days, regardless of
//! the calendar.

use common::{DateTime, Money};
use rust_decimal::Decimal;

#[cfg(doc)]
use crate::domain::Lease;

use super::rent::Evaluation;

/// Number of days in a month used for prorating.
pub const DAYS_IN_MONTH: u32 = 30;

/// Calculates the refund owed to the tenant of a [`Lease`] terminated at the
/// provided [`DateTime`], given its rent [`Evaluation`] at that moment.
///
/// Nothing is owed unless the rent is paid up. Otherwise, the days left until
/// the next due date are [`prorate`]d, where any started day counts as a
/// whole one.
///
/// Returns [`None`] if the refund overflows.
#[must_use]
pub fn calculate(
    monthly_price: Money,
    evaluation: &Evaluation,
    now: DateTime,
) -> Option<Money> {
    let Some(next_due_at) = evaluation.next_due_at.filter(|_| evaluation.is_paid())
    else {
        return Some(Money::zero(monthly_price.currency));
    };

    let days_remaining = now.days_until(next_due_at).max(0);
    prorate(
        monthly_price,
        u32::try_from(days_remaining).unwrap_or(u32::MAX),
    )
}

/// Prorates the provided monthly price over the provided number of days,
/// rounding the result to whole minor units.
///
/// Returns [`None`] if the refund overflows.
#[must_use]
pub fn prorate(monthly_price: Money, days_remaining: u32) -> Option<Money> {
    let daily_rate = monthly_price.amount / Decimal::from(DAYS_IN_MONTH);
    let full_months = Decimal::from(days_remaining / DAYS_IN_MONTH);
    let remaining_days = Decimal::from(days_remaining % DAYS_IN_MONTH);

    let amount = full_months
        .checked_mul(monthly_price.amount)?
        .checked_add(remaining_days.checked_mul(daily_rate)?)?;
    Some(
        Money {
            amount,
            currency: monthly_price.currency,
        }
        .round(),
    )
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::domain::lease::{
        rent::{self, Evaluation},
        spec::{at, gbp},
    };

    use super::{calculate, prorate};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn paid_until(next_due_at: &str) -> Evaluation {
        Evaluation {
            status: rent::Status::Paid,
            next_due_at: Some(at(next_due_at).coerce()),
        }
    }

    #[test]
    fn prorates_full_months_and_days() {
        assert_eq!(prorate(gbp("1200"), 45), Some(gbp("1800")));
        assert_eq!(prorate(gbp("1200"), 30), Some(gbp("1200")));
        assert_eq!(prorate(gbp("1200"), 60), Some(gbp("2400")));
        assert_eq!(prorate(gbp("900"), 0), Some(gbp("0")));
        assert_eq!(prorate(gbp("900"), 1), Some(gbp("30")));
    }

    #[test]
    fn returns_monthly_price_for_a_month() {
        for price in ["1", "999.99", "1234.56", "0.07"] {
            assert_eq!(prorate(gbp(price), 30), Some(gbp(price)), "{price}");
        }
    }

    #[test]
    fn rounds_to_minor_units() {
        // 1000 / 30 * 15 = 499.999...
        assert_eq!(prorate(gbp("1000"), 15), Some(gbp("500")));
        // 100 / 30 * 1 = 3.333...
        assert_eq!(prorate(gbp("100"), 1), Some(gbp("3.33")));
        // 100 / 30 * 2 = 6.666...
        assert_eq!(prorate(gbp("100"), 2), Some(gbp("6.67")));
    }

    #[test]
    fn nothing_is_owed_unless_paid() {
        let now = at("2026-10-01T00:00:00Z");

        let due = Evaluation {
            status: rent::Status::Due,
            next_due_at: Some(at("2026-09-01T00:00:00Z").coerce()),
        };
        assert_eq!(calculate(gbp("1200"), &due, now), Some(gbp("0")));

        let inactive = Evaluation {
            status: rent::Status::Inactive,
            next_due_at: None,
        };
        assert_eq!(calculate(gbp("1200"), &inactive, now), Some(gbp("0")));
    }

    #[test]
    fn counts_started_days() {
        let eval = paid_until("2026-11-15T12:00:00Z");

        assert_eq!(
            calculate(gbp("1200"), &eval, at("2026-10-01T12:00:00Z")),
            Some(gbp("1800")),
        );
        assert_eq!(
            calculate(gbp("1200"), &eval, at("2026-10-01T13:00:00Z")),
            Some(gbp("1800")),
        );
        assert_eq!(
            calculate(gbp("1200"), &eval, at("2026-10-01T11:00:00Z")),
            Some(gbp("1840")),
        );
    }

    #[test]
    fn is_zero_at_due_date() {
        let eval = paid_until("2026-11-15T12:00:00Z");

        assert_eq!(
            calculate(gbp("900"), &eval, at("2026-11-15T12:00:00Z")),
            Some(gbp("0")),
        );
    }

    #[test]
    fn never_increases_nor_goes_negative_towards_due_date() {
        let next_due_at = at("2026-12-31T00:00:00Z");
        let eval = paid_until("2026-12-31T00:00:00Z");

        let mut now = at("2026-09-01T05:00:00Z");
        let mut previous = calculate(gbp("1234.56"), &eval, now).unwrap();
        while now < next_due_at {
            now = now + DAY / 3;
            let refund = calculate(gbp("1234.56"), &eval, now).unwrap();
            assert!(refund.amount <= previous.amount, "at {}", now.to_rfc3339());
            assert!(!refund.amount.is_sign_negative());
            previous = refund;
        }
    }

    #[test]
    fn overflows_without_panicking() {
        let price = gbp("4000000000000000000000000000");

        assert_eq!(prorate(price, 730), None);
        let eval = paid_until("2028-10-01T00:00:00Z");
        assert_eq!(calculate(price, &eval, at("2026-10-01T00:00:00Z")), None);
    }
}
