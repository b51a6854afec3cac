//! [`Command`] for accepting a [`RentalRequest`].

use std::convert::Infallible;

use common::{
    operations::{
        By, Commit, Dispatch, Insert, Lock, Select, Transact, Transacted,
        Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease, notification, property, rental_request, user, Lease,
        Notification, Property, RentalRequest,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for a landlord accepting a [`RentalRequest`], which generates
/// a [`Lease`] to be signed.
#[derive(Clone, Copy, Debug)]
pub struct AcceptRentalRequest {
    /// ID of the [`RentalRequest`] to accept.
    pub request_id: rental_request::Id,

    /// ID of the landlord accepting the [`RentalRequest`].
    pub landlord_id: user::Id,

    /// [`DateTime`] when the tenancy starts.
    pub starts_at: lease::StartDateTime,

    /// [`DateTime`] when the tenancy ends.
    pub ends_at: lease::EndDateTime,
}

impl<Db, Gw, Nt> Command<AcceptRentalRequest> for Service<Db, Gw, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<RentalRequest>, rental_request::Id>>,
            Ok = Option<RentalRequest>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<RentalRequest>, rental_request::Id>>,
            Ok = Option<RentalRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<RentalRequest>, Err = Traced<database::Error>>
        + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AcceptRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AcceptRentalRequest {
            request_id,
            landlord_id,
            starts_at,
            ends_at,
        } = cmd;

        if starts_at.coerce::<()>() >= ends_at.coerce() {
            return Err(tracerr::new!(E::InvalidTerm));
        }

        let request = self
            .database()
            .execute(Select(By::<Option<RentalRequest>, _>::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|r| r.landlord_id == landlord_id)
            .ok_or(E::RequestNotExists(request_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid letting the same `Property` twice.
        tx.execute(Lock(By::<Property, _>::new(request.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut request = tx
            .execute(Select(By::<Option<RentalRequest>, _>::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RequestNotExists(request_id))
            .map_err(tracerr::wrap!())?;
        request.accept().map_err(tracerr::from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(request.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(request.property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_available() {
            return Err(tracerr::new!(E::PropertyNotAvailable(property.id)));
        }

        let lease = Lease {
            id: lease::Id::new(),
            property_id: property.id,
            landlord_id: property.landlord_id,
            tenant_id: request.tenant_id,
            rental_request_id: Some(request.id),
            body: lease::Body::generate(
                &property,
                request.tenant_id,
                starts_at,
                ends_at,
            ),
            starts_at,
            ends_at,
            landlord_signed: false,
            tenant_signed: false,
            status: lease::Status::Pending,
            payment: None,
            termination: None,
            created_at: DateTime::now().coerce(),
            expired_at: None,
        };

        tx.execute(Update(request))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.notify([
            Notification::about_lease(
                lease.tenant_id,
                notification::Kind::RequestAccepted,
                &lease,
                &property,
            ),
            Notification::about_lease(
                lease.tenant_id,
                notification::Kind::LeaseGenerated,
                &lease,
                &property,
            ),
        ])
        .await;

        Ok(lease)
    }
}

/// Error of [`AcceptRentalRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`RentalRequest`] has been decided already.
    #[display("{_0}")]
    #[from]
    AlreadyDecided(rental_request::AlreadyDecided),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Tenancy must start before it ends.
    #[display("`Lease` must start before it ends")]
    InvalidTerm,

    /// [`Property`] is occupied.
    #[display("`Property(id: {_0})` is not available")]
    PropertyNotAvailable(#[error(not(source))] property::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`RentalRequest`] with the provided ID does not exist, or is addressed
    /// to another landlord.
    #[display("`RentalRequest(id: {_0})` does not exist")]
    RequestNotExists(#[error(not(source))] rental_request::Id),
}
