//! [`Command`] for rejecting an offline payment of a [`Lease`].

use std::convert::Infallible;

use common::operations::{
    By, Commit, Dispatch, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for a landlord rejecting the offline payment claimed by the
/// tenant of a [`Lease`], so the tenant may choose how to pay again.
#[derive(Clone, Copy, Debug)]
pub struct RejectOfflinePayment {
    /// ID of the [`Lease`] the payment is claimed for.
    pub lease_id: lease::Id,

    /// ID of the landlord rejecting the payment.
    pub landlord_id: user::Id,
}

impl<Db, Gw, Nt> Command<RejectOfflinePayment> for Service<Db, Gw, Nt>
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

    async fn execute(
        &self,
        cmd: RejectOfflinePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RejectOfflinePayment {
            lease_id,
            landlord_id,
        } = cmd;

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
            .filter(|l| l.landlord_id == landlord_id)
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;

        let rejected = lease
            .reject_offline_payment()
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
            lease.tenant_id,
            notification::Kind::OfflinePaymentRejected,
            &lease,
            &property,
        )
        .with_message(format!(
            "Payment of {} was not received",
            rejected.amount,
        ))])
        .await;

        Ok(lease)
    }
}

/// Error of [`RejectOfflinePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Lease`] with the provided ID does not exist, or is let by another
    /// landlord.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Payment cannot be rejected.
    #[display("Cannot reject payment: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
