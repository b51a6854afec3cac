//! [`Command`] for claiming an offline payment of a [`Lease`].

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

/// [`Command`] for a tenant claiming to have paid the rent of a [`Lease`]
/// outside the platform.
///
/// The claimed amount is the monthly price of the [`Property`] multiplied by
/// the claimed [`lease::Months`].
#[derive(Clone, Copy, Debug)]
pub struct ClaimOfflinePayment {
    /// ID of the paid [`Lease`].
    pub lease_id: lease::Id,

    /// ID of the tenant claiming the payment.
    pub tenant_id: user::Id,

    /// Number of [`lease::Months`] the payment covers.
    pub months: lease::Months,
}

impl<Db, Gw, Nt> Command<ClaimOfflinePayment> for Service<Db, Gw, Nt>
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
        cmd: ClaimOfflinePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ClaimOfflinePayment {
            lease_id,
            tenant_id,
            months,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid two claims racing each other.
        tx.execute(Lock(By::<Lease, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| l.tenant_id == tenant_id)
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        let amount = months
            .price(property.price)
            .ok_or(E::AmountOverflow(property.id))
            .map_err(tracerr::wrap!())?;
        lease
            .claim_offline_payment(amount, months)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.notify([Notification::about_lease(
            lease.landlord_id,
            notification::Kind::OfflinePaymentPending,
            &lease,
            &property,
        )])
        .await;

        Ok(lease)
    }
}

/// Error of [`ClaimOfflinePayment`] [`Command`] execution.
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

    /// Amount computed from the [`Property`] price overflows.
    #[display("Amount overflows for `Property(id: {_0})` price")]
    AmountOverflow(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be paid.
    #[display("Cannot pay `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
