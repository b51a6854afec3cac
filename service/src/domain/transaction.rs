//! [`Transaction`] definitions.

use common::{define_kind, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{lease, property, user, Lease};

/// Record of money moving between a tenant and a landlord.
///
/// [`Transaction`]s are never updated once recorded.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// ID of this [`Transaction`].
    pub id: Id,

    /// ID of the [`Lease`] this [`Transaction`] is made for.
    pub lease_id: lease::Id,

    /// ID of the [`Property`] this [`Transaction`] is made for.
    pub property_id: property::Id,

    /// ID of the tenant who paid.
    pub tenant_id: user::Id,

    /// Amount of this [`Transaction`].
    pub amount: Money,

    /// [`Kind`] of this [`Transaction`].
    pub kind: Kind,

    /// [`Status`] of this [`Transaction`].
    pub status: Status,

    /// Number of months this [`Transaction`] covers, if it's a rent payment.
    ///
    /// Rent payments recorded without it cover a single month.
    pub months_covered: Option<lease::Months>,

    /// [`DateTime`] when this [`Transaction`] was made.
    pub paid_at: PaymentDateTime,

    /// [`Reference`] of this [`Transaction`] at the payment gateway, if it
    /// was made by card.
    pub reference: Option<Reference>,
}

impl Transaction {
    /// Records a rent [`Transaction`] of the provided [`lease::Payment`] made
    /// for the provided [`Lease`].
    #[must_use]
    pub fn rent(
        lease: &Lease,
        payment: lease::Payment,
        status: Status,
        reference: Option<Reference>,
        paid_at: DateTime,
    ) -> Self {
        Self {
            id: Id::new(),
            lease_id: lease.id,
            property_id: lease.property_id,
            tenant_id: lease.tenant_id,
            amount: payment.amount,
            kind: Kind::Rent,
            status,
            months_covered: Some(payment.months),
            paid_at: paid_at.coerce(),
            reference,
        }
    }

    /// Indicates whether this [`Transaction`] is a completed rent payment.
    #[must_use]
    pub fn is_completed_rent(&self) -> bool {
        self.kind == Kind::Rent && self.status == Status::Completed
    }

    /// Returns the number of months covered by this [`Transaction`].
    #[must_use]
    pub fn months_covered(&self) -> lease::Months {
        self.months_covered.unwrap_or(lease::Months::ONE)
    }
}

/// ID of a [`Transaction`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Reference of a [`Transaction`] at the payment gateway.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        Self::check(&reference).then_some(Self(reference))
    }

    /// Checks whether the given `reference` is a valid [`Reference`].
    fn check(reference: impl AsRef<str>) -> bool {
        let reference = reference.as_ref();
        reference.trim() == reference
            && !reference.is_empty()
            && reference.len() <= 255
    }
}

impl FromStr for Reference {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Reference`")
    }
}

define_kind! {
    #[doc = "Kind of a [`Transaction`]."]
    enum Kind {
        #[doc = "Monthly rent payment."]
        Rent = 1,

        #[doc = "Security deposit."]
        Deposit = 2,

        #[doc = "Service fee."]
        Fee = 3,

        #[doc = "Money returned to the tenant."]
        Refund = 4,
    }
}

define_kind! {
    #[doc = "Status of a [`Transaction`]."]
    enum Status {
        #[doc = "Money hasn't moved yet."]
        Pending = 1,

        #[doc = "Money has been received."]
        Completed = 2,

        #[doc = "Payment has been declined."]
        Failed = 3,
    }
}

/// Marker of a payment moment.
#[derive(Clone, Copy, Debug)]
pub struct Payment;

/// [`DateTime`] when a [`Transaction`] was made.
pub type PaymentDateTime = DateTimeOf<(Transaction, Payment)>;
