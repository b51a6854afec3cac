//! [`Command`] for declining a [`Lease`].

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

/// [`Command`] for declining a not yet active [`Lease`] by one of its
/// parties.
#[derive(Clone, Copy, Debug)]
pub struct DeclineLease {
    /// ID of the [`Lease`] to decline.
    pub lease_id: lease::Id,

    /// ID of the user declining the [`Lease`].
    pub user_id: user::Id,
}

impl<Db, Gw, Nt> Command<DeclineLease> for Service<Db, Gw, Nt>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Lease, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeclineLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeclineLease { lease_id, user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

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
        let party = lease
            .party_of(user_id)
            .ok_or(E::NotParty(user_id))
            .map_err(tracerr::wrap!())?;

        lease
            .decline(DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.notify([Notification::about_lease(
            lease.party_id(party.counterpart()),
            notification::Kind::LeaseDeclined,
            &lease,
            &property,
        )])
        .await;

        Ok(lease)
    }
}

/// Error of [`DeclineLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// User is not a party of the [`Lease`].
    #[display("`User(id: {_0})` is not a party of the `Lease`")]
    NotParty(#[error(not(source))] user::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be declined.
    #[display("Cannot decline `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
