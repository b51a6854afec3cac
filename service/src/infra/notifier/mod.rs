//! [`Notifier`] definitions.

pub mod webhook;

use std::convert::Infallible;

use common::operations::Dispatch;
use derive_more::From;
use tracing as log;

use crate::domain::Notification;

pub use self::webhook::Webhook;

/// Notification dispatching operation.
///
/// Dispatching is one-way: it never fails and never waits for the delivery.
pub use common::Handler as Notifier;

/// [`Notifier`] only logging [`Notification`]s, for environments without a
/// delivery endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl Notifier<Dispatch<Notification>> for Silent {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Dispatch(notification): Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let Notification {
            recipient_id,
            kind,
            context,
        } = notification;
        log::info!(
            "`{kind}` notification for `User(id: {recipient_id})` \
             is not delivered: {context:?}",
        );
        Ok(())
    }
}

/// [`Notifier`] chosen by configuration.
#[derive(Clone, Debug, From)]
pub enum Configured {
    /// [`Webhook`] delivery.
    Webhook(Webhook),

    /// No delivery, see [`Silent`].
    Silent(Silent),
}

impl Configured {
    /// Creates a [`Webhook`] [`Notifier`] if the provided `url` is set, or a
    /// [`Silent`] one otherwise.
    #[must_use]
    pub fn new(url: Option<String>) -> Self {
        url.map_or(Self::Silent(Silent), |url| Self::Webhook(Webhook::new(url)))
    }
}

impl Notifier<Dispatch<Notification>> for Configured {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        dispatch: Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        match self {
            Self::Webhook(n) => n.execute(dispatch).await,
            Self::Silent(n) => n.execute(dispatch).await,
        }
    }
}
