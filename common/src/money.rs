//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal, RoundingStrategy};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Number of decimal places every supported [`Currency`] is settled in.
    pub const MINOR_UNIT_DIGITS: u32 = 2;

    /// Creates a zero amount of the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Rounds this [`Money`] to whole minor units (cents, pence), with
    /// midpoints rounded away from zero.
    #[must_use]
    pub fn round(self) -> Self {
        Self {
            amount: self.amount.round_dp_with_strategy(
                Self::MINOR_UNIT_DIGITS,
                RoundingStrategy::MidpointAwayFromZero,
            ),
            currency: self.currency,
        }
    }

    /// Returns the amount of this [`Money`] in minor units (cents, pence).
    ///
    /// [`None`] is returned if the amount has a fraction of a minor unit or
    /// doesn't fit into [`i64`].
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        let minor = self.amount * Decimal::ONE_HUNDRED;
        minor.is_integer().then(|| minor.to_i64()).flatten()
    }

    /// Indicates whether this [`Money`] is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        match amount.is_integer().then(|| amount.to_i128()).flatten() {
            Some(whole) => write!(f, "{whole}{currency}"),
            None => write!(f, "{}{currency}", amount.normalize()),
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Pound Sterling."]
        Gbp = 3,

        #[doc = "Canadian Dollar."]
        Cad = 4,

        #[doc = "Australian Dollar."]
        Aud = 5,
    }
}

impl Currency {
    /// Returns the lowercase [ISO 4217] code of this [`Currency`], as payment
    /// gateways expect it.
    ///
    /// [ISO 4217]: https://en.wikipedia.org/wiki/ISO_4217
    #[must_use]
    pub fn iso_code(self) -> String {
        self.to_string().to_ascii_lowercase()
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn money(amount: &str, currency: Currency) -> Money {
        Money {
            amount: amount.parse::<Decimal>().unwrap(),
            currency,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("1200.50GBP").unwrap(),
            money("1200.50", Currency::Gbp),
        );
        assert_eq!(
            Money::from_str("99EUR").unwrap(),
            money("99", Currency::Eur),
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Gb").is_err());
        assert!(Money::from_str("123.45Pounds").is_err());
        assert!(Money::from_str("12£").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("1200.00", Currency::Gbp).to_string(), "1200GBP");
        assert_eq!(money("33.30", Currency::Usd).to_string(), "33.3USD");
        assert_eq!(money("0", Currency::Aud).to_string(), "0AUD");
    }

    #[test]
    fn rounds_to_minor_units() {
        assert_eq!(
            money("33.335", Currency::Gbp).round(),
            money("33.34", Currency::Gbp),
        );
        assert_eq!(
            money("33.3349", Currency::Gbp).round(),
            money("33.33", Currency::Gbp),
        );
    }

    #[test]
    fn converts_to_minor_units() {
        assert_eq!(money("1200.50", Currency::Usd).minor_units(), Some(120_050));
        assert_eq!(money("0.001", Currency::Usd).minor_units(), None);
    }

    #[test]
    fn lowercases_iso_code() {
        assert_eq!(Currency::Gbp.iso_code(), "gbp");
    }
}
