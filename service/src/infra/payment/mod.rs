//! Payment [`Gateway`] definitions.

pub mod stripe;

use common::Money;
use derive_more::{Display, Error as StdError, From};

use crate::domain::{lease, property::PayoutAccount};

pub use self::{intent::Intent, stripe::Stripe};

/// Payment gateway operation.
pub use common::Handler as Gateway;

/// Request to create a new [`Intent`].
#[derive(Clone, Debug)]
pub struct IntentRequest {
    /// Amount to be charged.
    pub amount: Money,

    /// [`PayoutAccount`] the charged amount is routed to, if any.
    pub destination: Option<PayoutAccount>,

    /// ID of the [`Lease`] being paid for.
    ///
    /// [`Lease`]: crate::domain::Lease
    pub lease_id: lease::Id,

    /// Number of months being paid for.
    pub months: lease::Months,
}

pub mod intent {
    //! [`Intent`] definitions.

    use common::Money;
    use derive_more::{AsRef, Display, From, Into};

    use crate::domain::lease;

    /// Payment intent created in a payment [`Gateway`], which the client
    /// confirms with a card.
    ///
    /// [`Gateway`]: super::Gateway
    #[derive(Clone, Debug)]
    pub struct Intent {
        /// ID of this [`Intent`] in the payment [`Gateway`].
        ///
        /// [`Gateway`]: super::Gateway
        pub id: Id,

        /// [`ClientSecret`] of this [`Intent`].
        pub client_secret: Option<ClientSecret>,

        /// Charged amount.
        pub amount: Money,

        /// [`Status`] of this [`Intent`].
        pub status: Status,

        /// ID of the [`Lease`] this [`Intent`] was created for, if known.
        ///
        /// [`Lease`]: crate::domain::Lease
        pub lease_id: Option<lease::Id>,

        /// Number of months this [`Intent`] pays for, if known.
        pub months: Option<lease::Months>,
    }

    /// ID of an [`Intent`].
    #[derive(AsRef, Clone, Debug, Display, Eq, From, Hash, Into, PartialEq)]
    #[as_ref(forward)]
    pub struct Id(String);

    /// Secret the client confirms an [`Intent`] with.
    #[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
    #[as_ref(forward)]
    pub struct ClientSecret(String);

    /// Status of an [`Intent`].
    #[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
    pub enum Status {
        /// Awaiting confirmation or still processing.
        #[display("PENDING")]
        Pending,

        /// Money has been charged.
        #[display("SUCCEEDED")]
        Succeeded,

        /// Charge was declined or canceled.
        #[display("FAILED")]
        Failed,
    }
}

/// Payment [`Gateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Stripe`] error.
    Stripe(stripe::Error),
}
