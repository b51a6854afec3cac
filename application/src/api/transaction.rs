//! [`Transaction`]-related definitions.

use common::{DateTime, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::Context;

/// A record of money moving between a tenant and a landlord.
#[derive(Clone, Debug, From, Into)]
pub struct Transaction(domain::Transaction);

/// A record of money moving between a tenant and a landlord.
#[graphql_object(context = Context)]
impl Transaction {
    /// Unique identifier of this `Transaction`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Amount of this `Transaction`.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Kind of this `Transaction`.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.0.kind.into()
    }

    /// Status of this `Transaction`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Number of months this `Transaction` covers, if it's a rent payment.
    #[must_use]
    pub fn months_covered(&self) -> Option<i32> {
        (self.0.kind == domain::transaction::Kind::Rent)
            .then(|| i32::from(self.0.months_covered().get()))
    }

    /// `DateTime` when this `Transaction` was made.
    #[must_use]
    pub fn paid_at(&self) -> DateTime {
        self.0.paid_at.coerce()
    }

    /// Reference of this `Transaction` at the payment gateway, if it was
    /// made by card.
    #[must_use]
    pub fn reference(&self) -> Option<String> {
        self.0.reference.as_ref().map(ToString::to_string)
    }
}

/// Unique identifier of a `Transaction`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::transaction::Id)]
#[into(domain::transaction::Id)]
#[graphql(name = "TransactionId", transparent)]
pub struct Id(Uuid);

/// Kind of a `Transaction`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "TransactionKind")]
pub enum Kind {
    /// Monthly rent payment.
    Rent,

    /// Security deposit.
    Deposit,

    /// Service fee.
    Fee,

    /// Money returned to the tenant.
    Refund,
}

impl From<domain::transaction::Kind> for Kind {
    fn from(kind: domain::transaction::Kind) -> Self {
        use domain::transaction::Kind as K;
        match kind {
            K::Rent => Self::Rent,
            K::Deposit => Self::Deposit,
            K::Fee => Self::Fee,
            K::Refund => Self::Refund,
        }
    }
}

/// Status of a `Transaction`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "TransactionStatus")]
pub enum Status {
    /// Money hasn't moved yet.
    Pending,

    /// Money has been received.
    Completed,

    /// Payment has been declined.
    Failed,
}

impl From<domain::transaction::Status> for Status {
    fn from(status: domain::transaction::Status) -> Self {
        use domain::transaction::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Completed => Self::Completed,
            S::Failed => Self::Failed,
        }
    }
}
