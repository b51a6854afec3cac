//! [`RentalRequest`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{property, user};

/// Request of a tenant to rent a [`Property`].
#[derive(Clone, Debug)]
pub struct RentalRequest {
    /// ID of this [`RentalRequest`].
    pub id: Id,

    /// ID of the requested [`Property`].
    pub property_id: property::Id,

    /// ID of the landlord owning the requested [`Property`].
    pub landlord_id: user::Id,

    /// ID of the tenant who made this [`RentalRequest`].
    pub tenant_id: user::Id,

    /// [`Message`] of the tenant to the landlord.
    pub message: Option<Message>,

    /// [`Status`] of this [`RentalRequest`].
    pub status: Status,

    /// [`DateTime`] when this [`RentalRequest`] was created.
    pub created_at: CreationDateTime,
}

impl RentalRequest {
    /// Accepts this [`RentalRequest`].
    ///
    /// # Errors
    ///
    /// If this [`RentalRequest`] has been decided already.
    pub fn accept(&mut self) -> Result<(), AlreadyDecided> {
        self.decide(Status::Accepted)
    }

    /// Rejects this [`RentalRequest`].
    ///
    /// # Errors
    ///
    /// If this [`RentalRequest`] has been decided already.
    pub fn reject(&mut self) -> Result<(), AlreadyDecided> {
        self.decide(Status::Rejected)
    }

    /// Moves this [`RentalRequest`] out of [`Status::Pending`].
    fn decide(&mut self, status: Status) -> Result<(), AlreadyDecided> {
        if self.status != Status::Pending {
            return Err(AlreadyDecided(self.status));
        }
        self.status = status;
        Ok(())
    }
}

/// Error of deciding a [`RentalRequest`] that isn't [`Status::Pending`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`RentalRequest` is already `{_0}`")]
pub struct AlreadyDecided(#[error(not(source))] pub Status);

/// ID of a [`RentalRequest`].
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

/// Free-form message attached to a [`RentalRequest`] or its rejection.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Message(String);

impl Message {
    /// Creates a new [`Message`] if the given `message` is valid.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        Self::check(&message).then_some(Self(message))
    }

    /// Checks whether the given `message` is a valid [`Message`].
    fn check(message: impl AsRef<str>) -> bool {
        let message = message.as_ref();
        !message.trim().is_empty() && message.len() <= 4096
    }
}

impl FromStr for Message {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Message`")
    }
}

define_kind! {
    #[doc = "Status of a [`RentalRequest`]."]
    enum Status {
        #[doc = "Awaiting a decision of the landlord."]
        Pending = 1,

        #[doc = "Accepted by the landlord, a lease has been generated."]
        Accepted = 2,

        #[doc = "Rejected by the landlord."]
        Rejected = 3,
    }
}

/// [`DateTime`] when a [`RentalRequest`] was created.
pub type CreationDateTime = DateTimeOf<(RentalRequest, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{property, user};

    use super::{AlreadyDecided, Id, RentalRequest, Status};

    fn request() -> RentalRequest {
        RentalRequest {
            id: Id::new(),
            property_id: property::Id::new(),
            landlord_id: user::Id::new(),
            tenant_id: user::Id::new(),
            message: None,
            status: Status::Pending,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn is_decided_once() {
        let mut req = request();
        req.accept().unwrap();
        assert_eq!(req.status, Status::Accepted);

        assert!(matches!(req.reject(), Err(AlreadyDecided(Status::Accepted))));
        assert!(matches!(req.accept(), Err(AlreadyDecided(Status::Accepted))));
        assert_eq!(req.status, Status::Accepted);
    }
}
