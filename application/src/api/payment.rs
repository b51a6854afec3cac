//! Card payment definitions.

use common::Money;
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::infra::payment::{intent, Intent};

use crate::Context;

/// A card payment awaiting confirmation by the client.
#[derive(Clone, Debug, From, Into)]
pub struct CardPayment(Intent);

/// A card payment the client confirms with the payment gateway, passing its
/// `clientSecret`.
#[graphql_object(context = Context)]
impl CardPayment {
    /// ID of the payment intent at the payment gateway.
    #[must_use]
    pub fn intent_id(&self) -> IntentId {
        self.0.id.clone().into()
    }

    /// Secret the client confirms this `CardPayment` with.
    #[must_use]
    pub fn client_secret(&self) -> Option<String> {
        self.0.client_secret.as_ref().map(ToString::to_string)
    }

    /// Amount to be charged.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount
    }

    /// Status of this `CardPayment`.
    #[must_use]
    pub fn status(&self) -> IntentStatus {
        self.0.status.into()
    }
}

/// Unique identifier of a payment intent at the payment gateway.
#[derive(Clone, Debug, Display, Into, From, GraphQLScalar)]
#[from(intent::Id)]
#[into(intent::Id)]
#[graphql(name = "PaymentIntentId", transparent)]
pub struct IntentId(String);

/// Status of a `CardPayment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentIntentStatus")]
pub enum IntentStatus {
    /// Awaiting confirmation or still processing.
    Pending,

    /// Money has been charged.
    Succeeded,

    /// Charge was declined or canceled.
    Failed,
}

impl From<intent::Status> for IntentStatus {
    fn from(status: intent::Status) -> Self {
        use intent::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Succeeded => Self::Succeeded,
            S::Failed => Self::Failed,
        }
    }
}
