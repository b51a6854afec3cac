//! [`Command`] for confirming an early termination of a [`Lease`].

use std::convert::Infallible;

use common::{
    operations::{
        By, Commit, Dispatch, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        lease, notification, property, user, Lease, Notification, Property,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for a tenant confirming the early termination of a
/// [`lease::Status::Terminating`] [`Lease`], ending it before its grace
/// period is over.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmTermination {
    /// ID of the terminating [`Lease`].
    pub lease_id: lease::Id,

    /// ID of the tenant confirming the termination.
    pub tenant_id: user::Id,
}

impl<Db, Gw, Nt> Command<ConfirmTermination> for Service<Db, Gw, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Lease, lease::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmTermination,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmTermination {
            lease_id,
            tenant_id,
        } = cmd;

        let property_id = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| l.tenant_id == tenant_id)
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?
            .property_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Lock(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        lease
            .confirm_termination(DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if property.vacate(lease.tenant_id) {
            tx.execute(Update(property.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.notify([Notification::about_lease(
            lease.landlord_id,
            notification::Kind::TenancyEnded,
            &lease,
            &property,
        )])
        .await;

        Ok(lease)
    }
}

/// Error of [`ConfirmTermination`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist, or is rented by another
    /// tenant.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Termination cannot be confirmed.
    #[display("Cannot confirm termination: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
