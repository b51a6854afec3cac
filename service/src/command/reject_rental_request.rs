//! [`Command`] for rejecting a [`RentalRequest`].

use std::convert::Infallible;

use common::operations::{
    By, Commit, Dispatch, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        notification, property, rental_request, user, Notification, Property,
        RentalRequest,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for a landlord rejecting a [`RentalRequest`].
#[derive(Clone, Copy, Debug)]
pub struct RejectRentalRequest {
    /// ID of the [`RentalRequest`] to reject.
    pub request_id: rental_request::Id,

    /// ID of the landlord rejecting the [`RentalRequest`].
    pub landlord_id: user::Id,
}

impl<Db, Gw, Nt> Command<RejectRentalRequest> for Service<Db, Gw, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<By<Option<RentalRequest>, rental_request::Id>>,
            Ok = Option<RentalRequest>,
            Err = Traced<database::Error>,
        > + Database<Update<RentalRequest>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = RentalRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RejectRentalRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RejectRentalRequest {
            request_id,
            landlord_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut request = tx
            .execute(Select(By::<Option<RentalRequest>, _>::new(request_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|r| r.landlord_id == landlord_id)
            .ok_or(E::RequestNotExists(request_id))
            .map_err(tracerr::wrap!())?;
        request.reject().map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(request.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let property_name = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(request.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(|p| p.name.to_string());
        self.notify([Notification {
            recipient_id: request.tenant_id,
            kind: notification::Kind::RequestRejected,
            context: notification::Context {
                property_name,
                ..notification::Context::default()
            },
        }])
        .await;

        Ok(request)
    }
}

/// Error of [`RejectRentalRequest`] [`Command`] execution.
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

    /// [`RentalRequest`] with the provided ID does not exist, or is addressed
    /// to another landlord.
    #[display("`RentalRequest(id: {_0})` does not exist")]
    RequestNotExists(#[error(not(source))] rental_request::Id),
}
