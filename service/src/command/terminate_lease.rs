//! [`Command`] for terminating a [`Lease`] early.

use std::convert::Infallible;

use common::{
    operations::{
        By, Commit, Dispatch, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        lease::{self, refund, rent},
        notification, property, user, Lease, Notification, Property,
        Transaction,
    },
    infra::{database, Database, Notifier},
    Service,
};

use super::Command;

/// [`Command`] for a landlord terminating an active [`Lease`] before its
/// natural end.
///
/// If the rent is paid up, the unused part of it is owed back to the tenant
/// and the [`Lease`] becomes [`lease::Status::Terminating`] for the
/// [`lease::GRACE_PERIOD`]. Otherwise, it expires immediately and its
/// [`Property`] is vacated.
#[derive(Clone, Copy, Debug)]
pub struct TerminateLease {
    /// ID of the [`Lease`] to terminate.
    pub lease_id: lease::Id,

    /// ID of the landlord terminating the [`Lease`].
    pub landlord_id: user::Id,
}

impl<Db, Gw, Nt> Command<TerminateLease> for Service<Db, Gw, Nt>
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
        > + Database<
            Select<By<Vec<Transaction>, lease::Id>>,
            Ok = Vec<Transaction>,
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
        cmd: TerminateLease,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TerminateLease {
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
        let transactions = tx
            .execute(Select(By::<Vec<Transaction>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let evaluation = rent::evaluate(&lease, &transactions, now);
        let refund = if evaluation.is_paid() {
            let refund = refund::calculate(property.price, &evaluation, now)
                .ok_or(E::AmountOverflow(property_id))
                .map_err(tracerr::wrap!())?;
            Some(refund)
        } else {
            None
        };

        lease
            .terminate(refund, now)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        if lease.status == lease::Status::Expired
            && property.vacate(lease.tenant_id)
        {
            tx.execute(Update(property.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let notification = match lease.termination.and_then(|t| {
            Some((t.refund?, t.grace_ends_at?))
        }) {
            Some((refund, grace_ends_at)) => {
                log::info!(
                    "`Lease(id: {lease_id})` is terminating, `{refund}` is \
                     to be refunded",
                );
                Notification::about_lease(
                    lease.tenant_id,
                    notification::Kind::TenancyTerminating,
                    &lease,
                    &property,
                )
                .with_message(format!(
                    "Refund of {refund} is due by {}",
                    grace_ends_at.to_human_date(),
                ))
            }
            None => Notification::about_lease(
                lease.tenant_id,
                notification::Kind::TenancyEnded,
                &lease,
                &property,
            ),
        };
        self.notify([notification]).await;

        Ok(lease)
    }
}

/// Error of [`TerminateLease`] [`Command`] execution.
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

    /// Amount computed from the [`Property`] price overflows.
    #[display("Amount overflows for `Property(id: {_0})` price")]
    AmountOverflow(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be terminated.
    #[display("Cannot terminate `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
