//! [`RentalRequest`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// A request of a tenant to rent a property.
#[derive(Clone, Debug, From, Into)]
pub struct RentalRequest(domain::RentalRequest);

/// A request of a tenant to rent a `Property`.
#[graphql_object(context = Context)]
impl RentalRequest {
    /// Unique identifier of this `RentalRequest`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Requested `Property`.
    #[expect(unsafe_code, reason = "properties are never deleted")]
    #[must_use]
    pub fn property(&self) -> api::Property {
        unsafe { api::Property::new_unchecked(self.0.property_id) }
    }

    /// ID of the landlord owning the requested `Property`.
    #[must_use]
    pub fn landlord_id(&self) -> api::user::Id {
        self.0.landlord_id.into()
    }

    /// ID of the tenant who made this `RentalRequest`.
    #[must_use]
    pub fn tenant_id(&self) -> api::user::Id {
        self.0.tenant_id.into()
    }

    /// Message of the tenant to the landlord, if any.
    #[must_use]
    pub fn message(&self) -> Option<Message> {
        self.0.message.clone().map(Into::into)
    }

    /// Status of this `RentalRequest`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `DateTime` when this `RentalRequest` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `RentalRequest`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::rental_request::Id)]
#[into(domain::rental_request::Id)]
#[graphql(name = "RentalRequestId", transparent)]
pub struct Id(Uuid);

/// Free-form message attached to a `RentalRequest`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RentalRequestMessage",
    with = scalar::Via::<domain::rental_request::Message>,
)]
pub struct Message(domain::rental_request::Message);

/// Status of a `RentalRequest`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "RentalRequestStatus")]
pub enum Status {
    /// Awaiting a decision of the landlord.
    Pending,

    /// Accepted by the landlord, a `Lease` has been generated.
    Accepted,

    /// Rejected by the landlord.
    Rejected,
}

impl From<domain::rental_request::Status> for Status {
    fn from(status: domain::rental_request::Status) -> Self {
        use domain::rental_request::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Accepted => Self::Accepted,
            S::Rejected => Self::Rejected,
        }
    }
}

impl AsError for domain::rental_request::AlreadyDecided {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "RENTAL_REQUEST_ALREADY_DECIDED"]
                #[status = CONFLICT]
                #[message = "`RentalRequest` has been accepted or rejected \
                             already"]
                AlreadyDecided,
            }
        }

        Some(Error::AlreadyDecided.into())
    }
}
