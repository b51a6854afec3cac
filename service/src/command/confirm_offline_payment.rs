//! [`Command`] for confirming an offline payment of a [`Lease`].

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
        lease, notification, property, transaction, user, Lease, Notification,
        Property, Transaction,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for a landlord confirming the receipt of the offline payment
/// claimed by the tenant of a [`Lease`].
///
/// Activates a [`lease::Status::Pending`] [`Lease`], occupying its
/// [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct ConfirmOfflinePayment {
    /// ID of the [`Lease`] the payment is claimed for.
    pub lease_id: lease::Id,

    /// ID of the landlord confirming the payment.
    pub landlord_id: user::Id,
}

impl<Db, Gw, Nt> Command<ConfirmOfflinePayment> for Service<Db, Gw, Nt>
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
        + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmOfflinePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmOfflinePayment {
            lease_id,
            landlord_id,
        } = cmd;

        let property_id = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| l.landlord_id == landlord_id)
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?
            .property_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // `Property` goes first, as any other transaction occupying or
        // vacating it does.
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

        let settlement = lease
            .confirm_offline_payment()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let transaction = Transaction::rent(
            &lease,
            settlement.payment,
            transaction::Status::Completed,
            None,
            DateTime::now(),
        );

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(transaction))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if settlement.activated {
            property.occupy(lease.tenant_id);
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
            lease.tenant_id,
            notification::Kind::OfflinePaymentApproved,
            &lease,
            &property,
        )])
        .await;

        Ok(lease)
    }
}

/// Error of [`ConfirmOfflinePayment`] [`Command`] execution.
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

    /// Payment cannot be confirmed.
    #[display("Cannot confirm payment: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
