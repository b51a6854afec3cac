//! [`Command`] for creating a new [`RentalRequest`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, rental_request, user, Property, RentalRequest},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for a tenant requesting to rent a [`Property`].
#[derive(Clone, Debug)]
pub struct CreateRentalRequest {
    /// ID of the requested [`Property`].
    pub property_id: property::Id,

    /// ID of the requesting tenant.
    pub tenant_id: user::Id,

    /// [`rental_request::Message`] to the landlord, if any.
    pub message: Option<rental_request::Message>,
}

impl<Db, Gw, Nt> Command<CreateRentalRequest> for Service<Db, Gw, Nt>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<RentalRequest>, Err = Traced<database::Error>>,
{
    type Ok = RentalRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRentalRequest {
            property_id,
            tenant_id,
            message,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if property.landlord_id == tenant_id {
            return Err(tracerr::new!(E::OwnProperty(property_id)));
        }
        if !property.is_available() {
            return Err(tracerr::new!(E::PropertyNotAvailable(property_id)));
        }

        let request = RentalRequest {
            id: rental_request::Id::new(),
            property_id,
            landlord_id: property.landlord_id,
            tenant_id,
            message,
            status: rental_request::Status::Pending,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(request.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(request)
    }
}

/// Error of [`CreateRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Landlord cannot rent their own [`Property`].
    #[display("`Property(id: {_0})` belongs to the requesting user")]
    OwnProperty(#[error(not(source))] property::Id),

    /// [`Property`] is occupied.
    #[display("`Property(id: {_0})` is not available")]
    PropertyNotAvailable(#[error(not(source))] property::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}
