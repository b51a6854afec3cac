//! [`Command`] for settling a card payment of a [`Lease`].

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
use tracing as log;

use crate::{
    domain::{
        lease, notification, property, transaction, user, Lease, Notification,
        Property, Transaction,
    },
    infra::{
        database,
        payment::{self, intent, Intent},
        Database, Gateway, Notifier,
    },
    Service,
};

use super::Command;

/// [`Command`] for a tenant settling the card payment of a [`Lease`] once
/// the client has confirmed its payment [`Intent`].
///
/// The outcome is taken from the payment [`Gateway`], never from the client.
/// Settling the same [`Intent`] twice has no effect.
#[derive(Clone, Debug)]
pub struct SettleCardPayment {
    /// ID of the paid [`Lease`].
    pub lease_id: lease::Id,

    /// ID of the tenant paying.
    pub tenant_id: user::Id,

    /// ID of the confirmed payment [`Intent`].
    pub intent_id: intent::Id,
}

impl<Db, Gw, Nt> Command<SettleCardPayment> for Service<Db, Gw, Nt>
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
        + Database<Insert<Transaction>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Gw: Gateway<
        Select<By<Option<Intent>, intent::Id>>,
        Ok = Option<Intent>,
        Err = Traced<payment::Error>,
    >,
    Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SettleCardPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SettleCardPayment {
            lease_id,
            tenant_id,
            intent_id,
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

        let intent = self
            .gateway()
            .execute(Select(By::<Option<Intent>, _>::new(intent_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|i| i.lease_id == Some(lease_id))
            .ok_or_else(|| E::IntentNotExists(intent_id.clone()))
            .map_err(tracerr::wrap!())?;
        if intent.status == intent::Status::Pending {
            return Err(tracerr::new!(E::NotSettled(intent_id)));
        }
        let reference = transaction::Reference::new(intent_id.clone())
            .ok_or_else(|| E::IntentNotExists(intent_id.clone()))
            .map_err(tracerr::wrap!())?;

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
        let recorded = tx
            .execute(Select(By::<Vec<Transaction>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .any(|t| t.reference.as_ref() == Some(&reference));

        let months = intent.months.unwrap_or(lease::Months::ONE);
        if intent.status == intent::Status::Failed {
            if !recorded {
                let payment = lease::Payment {
                    method: lease::PaymentMethod::Card,
                    amount: intent.amount,
                    months,
                    confirmed: false,
                };
                tx.execute(Insert(Transaction::rent(
                    &lease,
                    payment,
                    transaction::Status::Failed,
                    Some(reference),
                    DateTime::now(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
                tx.execute(Commit)
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
            return Err(tracerr::new!(E::PaymentFailed(intent_id)));
        }
        if recorded {
            log::debug!(
                "`Intent(id: {intent_id})` is settled for `Lease(id: \
                 {lease_id})` already",
            );
            return Ok(lease);
        }

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let settlement = lease
            .settle_card_payment(intent.amount, months)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let transaction = Transaction::rent(
            &lease,
            settlement.payment,
            transaction::Status::Completed,
            Some(reference),
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
            lease.landlord_id,
            notification::Kind::CardPaymentReceived,
            &lease,
            &property,
        )
        .with_message(format!("Received {}", settlement.payment.amount))])
        .await;

        Ok(lease)
    }
}

/// Error of [`SettleCardPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Payment [`Gateway`] error.
    #[display("Payment `Gateway` operation failed: {_0}")]
    #[from]
    Gateway(payment::Error),

    /// Payment [`Intent`] does not exist, or was created for another
    /// [`Lease`].
    #[display("`Intent(id: {_0})` does not exist")]
    IntentNotExists(#[error(not(source))] intent::Id),

    /// [`Lease`] with the provided ID does not exist, or is rented by another
    /// tenant.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// Payment [`Intent`] hasn't been settled yet.
    #[display("`Intent(id: {_0})` is not settled yet")]
    NotSettled(#[error(not(source))] intent::Id),

    /// Payment [`Intent`] has been declined.
    #[display("`Intent(id: {_0})` payment failed")]
    PaymentFailed(#[error(not(source))] intent::Id),

    /// [`Property`] of the [`Lease`] does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Lease`] cannot be paid.
    #[display("Cannot pay `Lease`: {_0}")]
    #[from]
    Transition(lease::TransitionError),
}
