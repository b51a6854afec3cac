//! [`Command`] for starting a card payment of a [`Lease`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{lease, property, user, Lease, Property},
    infra::{
        database,
        payment::{self, Intent, IntentRequest},
        Database, Gateway,
    },
    Service,
};

use super::Command;

/// [`Command`] for a tenant starting to pay the rent of a [`Lease`] by card.
///
/// Creates a payment [`Intent`] for the monthly price of the [`Property`]
/// multiplied by the paid [`lease::Months`], which the client confirms
/// directly with the payment [`Gateway`].
#[derive(Clone, Copy, Debug)]
pub struct CreateCardPayment {
    /// ID of the paid [`Lease`].
    pub lease_id: lease::Id,

    /// ID of the tenant paying.
    pub tenant_id: user::Id,

    /// Number of [`lease::Months`] to pay for.
    pub months: lease::Months,
}

impl<Db, Gw, Nt> Command<CreateCardPayment> for Service<Db, Gw, Nt>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Gw: Gateway<
        Insert<IntentRequest>,
        Ok = Intent,
        Err = Traced<payment::Error>,
    >,
{
    type Ok = Intent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateCardPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCardPayment {
            lease_id,
            tenant_id,
            months,
        } = cmd;

        let lease = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| l.tenant_id == tenant_id)
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        lease
            .ensure_payable()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(lease.property_id))
            .map_err(tracerr::wrap!())?;

        let amount = months
            .price(property.price)
            .ok_or(E::AmountOverflow(property.id))
            .map_err(tracerr::wrap!())?;
        self.gateway()
            .execute(Insert(IntentRequest {
                amount,
                destination: property.payout_account,
                lease_id,
                months,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`CreateCardPayment`] [`Command`] execution.
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
