//! [`Webhook`] [`Notifier`] implementation.

use std::convert::Infallible;

use common::operations::Dispatch;
use serde::Serialize;
use tracing as log;

use crate::{
    domain::{notification, user, Notification},
    infra::Notifier,
};

/// [`Notifier`] delivering [`Notification`]s as JSON `POST` requests to an
/// HTTP endpoint.
///
/// Delivery happens in a spawned task, so the [`Runtime`] must be running.
/// Failures are logged and never retried.
///
/// [`Runtime`]: tokio::runtime::Runtime
#[derive(Clone, Debug)]
pub struct Webhook {
    /// HTTP client to deliver [`Notification`]s with.
    client: reqwest::Client,

    /// URL of the endpoint.
    url: String,
}

impl Webhook {
    /// Creates a new [`Webhook`] delivering to the provided `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Notifier<Dispatch<Notification>> for Webhook {
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Dispatch(notification): Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let kind = notification.kind;
        let recipient_id = notification.recipient_id;
        let request = self
            .client
            .post(&self.url)
            .json(&Payload::from(&notification));

        drop(tokio::spawn(async move {
            match request
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
            {
                Ok(_) => log::debug!(
                    "`{kind}` notification delivered to \
                     `User(id: {recipient_id})`",
                ),
                Err(e) => log::warn!(
                    "failed to deliver `{kind}` notification to \
                     `User(id: {recipient_id})`: {e}",
                ),
            }
        }));
        Ok(())
    }
}

/// JSON body of a [`Webhook`] request.
#[derive(Debug, Serialize)]
struct Payload<'n> {
    /// ID of the user to be notified.
    recipient_id: user::Id,

    /// [`notification::Kind`] in `SCREAMING_SNAKE_CASE`.
    kind: String,

    /// Name of the related property, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    property_name: Option<&'n str>,

    /// Relative link to the related page, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'n str>,

    /// Custom message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'n str>,
}

impl<'n> From<&'n Notification> for Payload<'n> {
    fn from(n: &'n Notification) -> Self {
        let notification::Context {
            property_name,
            link,
            message,
        } = &n.context;
        Self {
            recipient_id: n.recipient_id,
            kind: n.kind.to_string(),
            property_name: property_name.as_deref(),
            link: link.as_deref(),
            message: message.as_deref(),
        }
    }
}
