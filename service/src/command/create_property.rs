//! [`Command`] for creating a new [`Property`].

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`] let by a landlord.
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// ID of the landlord owning the new [`Property`].
    pub landlord_id: user::Id,

    /// [`property::Name`] of the new [`Property`].
    pub name: property::Name,

    /// Monthly rent price of the new [`Property`].
    pub price: Money,

    /// [`property::PayoutAccount`] of the new [`Property`], if any.
    pub payout_account: Option<property::PayoutAccount>,
}

impl<Db, Gw, Nt> Command<CreateProperty> for Service<Db, Gw, Nt>
where
    Db: Database<Insert<Property>, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            landlord_id,
            name,
            price,
            payout_account,
        } = cmd;

        if !price.is_positive() {
            return Err(tracerr::new!(E::NonPositivePrice(price)));
        }
        if price.amount > Property::MAX_PRICE {
            return Err(tracerr::new!(E::PriceTooHigh(price)));
        }

        let property = Property {
            id: property::Id::new(),
            landlord_id,
            name,
            price: price.round(),
            payout_account,
            occupancy: property::Occupancy::Available,
            current_tenant_id: None,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Price of a [`Property`] must be positive.
    #[display("`{_0}` is not a positive price")]
    NonPositivePrice(#[error(not(source))] Money),

    /// Price of a [`Property`] must not exceed [`Property::MAX_PRICE`].
    #[display("`{_0}` exceeds the maximum price")]
    PriceTooHigh(#[error(not(source))] Money),
}
