//! [`Property`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;

/// Property let by a landlord.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the landlord owning this [`Property`].
    pub landlord_id: user::Id,

    /// [`Name`] of this [`Property`].
    pub name: Name,

    /// Monthly rent price of this [`Property`].
    pub price: Money,

    /// [`PayoutAccount`] card payments for this [`Property`] are routed to.
    pub payout_account: Option<PayoutAccount>,

    /// [`Occupancy`] of this [`Property`].
    pub occupancy: Occupancy,

    /// ID of the tenant currently living in this [`Property`], if any.
    pub current_tenant_id: Option<user::Id>,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,
}

impl Property {
    /// Maximum monthly price of a [`Property`].
    pub const MAX_PRICE: Decimal =
        Decimal::from_parts(1_000_000, 0, 0, false, 0);

    /// Indicates whether this [`Property`] can be let to a new tenant.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.occupancy == Occupancy::Available
    }

    /// Marks this [`Property`] as occupied by the provided tenant.
    pub fn occupy(&mut self, tenant_id: user::Id) {
        self.occupancy = Occupancy::Occupied;
        self.current_tenant_id = Some(tenant_id);
    }

    /// Marks this [`Property`] as available again, if it's currently occupied
    /// by the provided tenant.
    ///
    /// Returns `false` if the [`Property`] is occupied by someone else (or
    /// nobody), leaving it untouched.
    pub fn vacate(&mut self, tenant_id: user::Id) -> bool {
        if self.current_tenant_id != Some(tenant_id) {
            return false;
        }
        self.occupancy = Occupancy::Available;
        self.current_tenant_id = None;
        true
    }
}

/// ID of a [`Property`].
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

/// Name of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Account of a landlord at the payment gateway, receiving card payments.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct PayoutAccount(String);

impl PayoutAccount {
    /// Creates a new [`PayoutAccount`] if the given `account` is valid.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Option<Self> {
        let account = account.into();
        Self::check(&account).then_some(Self(account))
    }

    /// Checks whether the given `account` is a valid [`PayoutAccount`].
    fn check(account: impl AsRef<str>) -> bool {
        let account = account.as_ref();
        !account.is_empty()
            && account.len() <= 255
            && account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl FromStr for PayoutAccount {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `PayoutAccount`")
    }
}

define_kind! {
    #[doc = "Occupancy of a [`Property`]."]
    enum Occupancy {
        #[doc = "[`Property`] is free to be let."]
        Available = 1,

        #[doc = "[`Property`] is let to a tenant."]
        Occupied = 2,
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime, Money};

    use crate::domain::user;

    use super::{Id, Name, Occupancy, PayoutAccount, Property};

    fn property() -> Property {
        Property {
            id: Id::new(),
            landlord_id: user::Id::new(),
            name: Name::new("Flat 4, Rose Court").unwrap(),
            price: Money::zero(Currency::Gbp),
            payout_account: None,
            occupancy: Occupancy::Available,
            current_tenant_id: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn vacates_only_for_current_tenant() {
        let tenant = user::Id::new();
        let mut p = property();

        p.occupy(tenant);
        assert!(!p.is_available());

        assert!(!p.vacate(user::Id::new()));
        assert_eq!(p.current_tenant_id, Some(tenant));

        assert!(p.vacate(tenant));
        assert!(p.is_available());
        assert_eq!(p.current_tenant_id, None);
    }

    #[test]
    fn validates_payout_account() {
        assert!(PayoutAccount::new("acct_1Nv0FGQ9RKHgCVdK").is_some());
        assert!(PayoutAccount::new("").is_none());
        assert!(PayoutAccount::new("acct 1").is_none());
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("Studio").is_some());
        assert!(Name::new(" Studio").is_none());
        assert!(Name::new("").is_none());
    }
}
