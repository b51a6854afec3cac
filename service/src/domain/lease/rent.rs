//! Rent-due evaluation of a [`Lease`].

use common::{DateTime, DateTimeOf};
use derive_more::Display;

use crate::domain::{Lease, Transaction};

/// Status of the rent owed for a [`Lease`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Status {
    /// Rent is paid up until the next due [`DateTime`].
    #[display("PAID")]
    Paid,

    /// Next due [`DateTime`] has passed without a payment.
    #[display("DUE")]
    Due,

    /// [`Lease`] is not running, so no rent is owed.
    #[display("INACTIVE")]
    Inactive,
}

/// Result of evaluating the rent owed for a [`Lease`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Evaluation {
    /// [`Status`] of the rent.
    pub status: Status,

    /// [`DateTime`] when the next rent payment is due, if the [`Lease`] is
    /// running.
    pub next_due_at: Option<DueDateTime>,
}

impl Evaluation {
    /// Indicates whether the rent is paid up.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == Status::Paid
    }

    /// Returns the next due date in a form suitable for people.
    #[must_use]
    pub fn next_due_date(&self) -> Option<String> {
        self.next_due_at.map(|at| at.to_human_date())
    }
}

/// Evaluates whether rent is due for the provided [`Lease`] at the provided
/// [`DateTime`], given its [`Transaction`]s.
///
/// Only completed rent [`Transaction`]s of the [`Lease`] are considered: the
/// latest one covers its months starting from its payment. Without any, the
/// rent is due since the [`Lease`] start.
#[must_use]
pub fn evaluate(
    lease: &Lease,
    transactions: &[Transaction],
    now: DateTime,
) -> Evaluation {
    if !lease.is_running() {
        return Evaluation {
            status: Status::Inactive,
            next_due_at: None,
        };
    }

    let next_due_at = next_due_at(lease, transactions);
    let status = if now > next_due_at.coerce() {
        Status::Due
    } else {
        Status::Paid
    };

    Evaluation {
        status,
        next_due_at: Some(next_due_at),
    }
}

/// Calculates the [`DateTime`] when the next rent payment for the provided
/// [`Lease`] is due, regardless of its status.
#[must_use]
pub fn next_due_at(lease: &Lease, transactions: &[Transaction]) -> DueDateTime {
    transactions
        .iter()
        .filter(|tx| tx.lease_id == lease.id && tx.is_completed_rent())
        .max_by_key(|tx| tx.paid_at)
        .map_or_else(
            || lease.starts_at.coerce(),
            |tx| {
                tx.paid_at
                    .checked_add_months(tx.months_covered().into())
                    .unwrap_or(tx.paid_at)
                    .coerce()
            },
        )
}

/// Marker type describing a moment rent becomes due.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`DateTime`] when rent for a [`Lease`] becomes due.
pub type DueDateTime = DateTimeOf<(Lease, Due)>;

#[cfg(test)]
mod spec {
    use crate::domain::{
        lease::{
            self,
            spec::{at, gbp, lease},
            Months,
        },
        transaction, Lease, Transaction,
    };

    use super::{evaluate, Status};

    fn active(starts_at: &str) -> Lease {
        let mut lease = lease();
        lease.starts_at = at(starts_at).coerce();
        lease.status = lease::Status::Active;
        lease
    }

    fn rent(
        lease: &Lease,
        paid_at: &str,
        months: Option<u8>,
        status: transaction::Status,
    ) -> Transaction {
        Transaction {
            id: transaction::Id::new(),
            lease_id: lease.id,
            property_id: lease.property_id,
            tenant_id: lease.tenant_id,
            amount: gbp("1200"),
            kind: transaction::Kind::Rent,
            status,
            months_covered: months.and_then(Months::new),
            paid_at: at(paid_at).coerce(),
            reference: None,
        }
    }

    fn completed(lease: &Lease, paid_at: &str, months: Option<u8>) -> Transaction {
        rent(lease, paid_at, months, transaction::Status::Completed)
    }

    #[test]
    fn not_running_lease_is_inactive() {
        for status in [lease::Status::Pending, lease::Status::Expired] {
            let mut lease = active("2026-09-01T00:00:00Z");
            lease.status = status;
            let txs = [completed(&lease, "2026-09-01T00:00:00Z", None)];

            let eval = evaluate(&lease, &txs, at("2026-12-01T00:00:00Z"));

            assert_eq!(eval.status, Status::Inactive, "{status}");
            assert_eq!(eval.next_due_at, None, "{status}");
        }
    }

    #[test]
    fn terminating_lease_is_evaluated_as_active() {
        let mut lease = active("2026-09-01T00:00:00Z");
        lease.status = lease::Status::Terminating;

        let eval = evaluate(&lease, &[], at("2026-09-02T00:00:00Z"));

        assert_eq!(eval.status, Status::Due);
    }

    #[test]
    fn without_payments_is_due_after_start() {
        let lease = active("2026-09-01T00:00:00Z");

        let before = evaluate(&lease, &[], at("2026-08-31T23:59:59Z"));
        assert_eq!(before.status, Status::Paid);
        assert_eq!(before.next_due_at, Some(lease.starts_at.coerce()));

        let exactly = evaluate(&lease, &[], at("2026-09-01T00:00:00Z"));
        assert_eq!(exactly.status, Status::Paid);

        let after = evaluate(&lease, &[], at("2026-09-01T00:00:01Z"));
        assert_eq!(after.status, Status::Due);
        assert_eq!(after.next_due_date().as_deref(), Some("September 1, 2026"));
    }

    #[test]
    fn payment_covers_its_months() {
        let lease = active("2026-09-01T00:00:00Z");
        let txs = [completed(&lease, "2026-09-05T10:00:00Z", Some(3))];

        let paid = evaluate(&lease, &txs, at("2026-12-05T10:00:00Z"));
        assert_eq!(paid.status, Status::Paid);
        assert_eq!(
            paid.next_due_at,
            Some(at("2026-12-05T10:00:00Z").coerce()),
        );

        let due = evaluate(&lease, &txs, at("2026-12-05T10:00:01Z"));
        assert_eq!(due.status, Status::Due);
    }

    #[test]
    fn missing_months_cover_one_month() {
        let lease = active("2026-09-01T00:00:00Z");
        let txs = [completed(&lease, "2026-01-31T00:00:00Z", None)];

        let eval = evaluate(&lease, &txs, at("2026-02-01T00:00:00Z"));

        assert_eq!(eval.next_due_at, Some(at("2026-02-28T00:00:00Z").coerce()));
        assert_eq!(eval.next_due_date().as_deref(), Some("February 28, 2026"));
    }

    #[test]
    fn latest_completed_rent_wins() {
        let lease = active("2026-09-01T00:00:00Z");
        let mut deposit = completed(&lease, "2026-11-20T00:00:00Z", Some(6));
        deposit.kind = transaction::Kind::Deposit;
        let mut other_lease = completed(&lease, "2026-11-25T00:00:00Z", Some(6));
        other_lease.lease_id = lease::Id::new();
        let txs = [
            completed(&lease, "2026-10-01T00:00:00Z", None),
            completed(&lease, "2026-09-01T00:00:00Z", Some(12)),
            rent(
                &lease,
                "2026-11-01T00:00:00Z",
                Some(12),
                transaction::Status::Failed,
            ),
            rent(
                &lease,
                "2026-11-02T00:00:00Z",
                Some(12),
                transaction::Status::Pending,
            ),
            deposit,
            other_lease,
        ];

        let eval = evaluate(&lease, &txs, at("2026-11-15T00:00:00Z"));

        assert_eq!(eval.status, Status::Due);
        assert_eq!(eval.next_due_at, Some(at("2026-11-01T00:00:00Z").coerce()));
    }
}
