//! [Stripe] payment [`Gateway`] implementation.
//!
//! [Stripe]: https://docs.stripe.com/api/payment_intents

use std::{collections::HashMap, str::FromStr as _, sync::Arc};

use common::{
    money::Currency,
    operations::{By, Insert, Select},
    Money,
};
use derive_more::{Display, Error as StdError, From};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::lease,
    infra::payment::{self, intent, Gateway, Intent, IntentRequest},
};

/// [`Stripe`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the [Stripe] API.
    ///
    /// [Stripe]: https://docs.stripe.com/api
    pub api_url: String,

    /// Secret API key.
    pub secret_key: Arc<SecretString>,
}

/// [Stripe] payment [`Gateway`].
///
/// [Stripe]: https://docs.stripe.com/api
#[derive(Clone, Debug)]
pub struct Stripe {
    /// HTTP client to call the API with.
    client: reqwest::Client,

    /// [`Config`] of this [`Stripe`] client.
    config: Config,
}

impl Stripe {
    /// Creates a new [`Stripe`] client with the provided [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Returns the URL of the provided API `path`.
    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.config.api_url.trim_end_matches('/'))
    }
}

impl Gateway<Insert<IntentRequest>> for Stripe {
    type Ok = Intent;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Insert(req): Insert<IntentRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        use Error as E;

        let IntentRequest {
            amount,
            destination,
            lease_id,
            months,
        } = req;

        let minor_units = amount
            .minor_units()
            .filter(|units| *units > 0)
            .ok_or(E::InvalidAmount(amount))
            .map_err(tracerr::from_and_wrap!(=> payment::Error))?;

        let mut form = vec![
            ("amount", minor_units.to_string()),
            ("currency", amount.currency.iso_code()),
            ("automatic_payment_methods[enabled]", "true".to_owned()),
            ("metadata[lease_id]", lease_id.to_string()),
            ("metadata[months]", months.to_string()),
        ];
        if let Some(account) = destination {
            form.push(("transfer_data[destination]", account.to_string()));
        }

        let response = self
            .client
            .post(self.url("payment_intents"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(tracerr::from_and_wrap!(=> E))
            .map_err(tracerr::map_from)?
            .json::<IntentResponse>()
            .await
            .map_err(tracerr::from_and_wrap!(=> E))
            .map_err(tracerr::map_from)?;

        response
            .into_intent()
            .map_err(tracerr::from_and_wrap!(=> payment::Error))
    }
}

impl Gateway<Select<By<Option<Intent>, intent::Id>>> for Stripe {
    type Ok = Option<Intent>;
    type Err = Traced<payment::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Intent>, intent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        use Error as E;

        let id = by.into_inner();

        let response = self
            .client
            .get(self.url(&format!("payment_intents/{id}")))
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> E))
            .map_err(tracerr::map_from)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        response
            .error_for_status()
            .map_err(tracerr::from_and_wrap!(=> E))
            .map_err(tracerr::map_from)?
            .json::<IntentResponse>()
            .await
            .map_err(tracerr::from_and_wrap!(=> E))
            .map_err(tracerr::map_from)?
            .into_intent()
            .map(Some)
            .map_err(tracerr::from_and_wrap!(=> payment::Error))
    }
}

/// [Stripe] representation of an [`Intent`].
///
/// [Stripe]: https://docs.stripe.com/api/payment_intents/object
#[derive(Debug, Deserialize)]
struct IntentResponse {
    /// ID of the [`Intent`].
    id: String,

    /// Client secret of the [`Intent`].
    client_secret: Option<String>,

    /// Amount in minor units.
    amount: i64,

    /// Lowercase [ISO 4217] currency code.
    ///
    /// [ISO 4217]: https://en.wikipedia.org/wiki/ISO_4217
    currency: String,

    /// Raw status of the [`Intent`].
    status: String,

    /// Error of the last payment attempt, if any.
    last_payment_error: Option<PaymentError>,

    /// Metadata attached on creation.
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Error of a payment attempt.
#[derive(Debug, Deserialize)]
struct PaymentError {
    /// Human-readable message.
    message: Option<String>,
}

impl IntentResponse {
    /// Converts this [`IntentResponse`] into an [`Intent`].
    fn into_intent(self) -> Result<Intent, Error> {
        let Self {
            id,
            client_secret,
            amount,
            currency,
            status,
            last_payment_error,
            metadata,
        } = self;

        let currency = Currency::from_str(&currency.to_ascii_uppercase())
            .map_err(|_| Error::UnsupportedCurrency(currency))?;

        let status = match status.as_str() {
            "succeeded" => intent::Status::Succeeded,
            "canceled" => intent::Status::Failed,
            "requires_payment_method" if last_payment_error.is_some() => {
                if let Some(msg) = last_payment_error.and_then(|e| e.message) {
                    log::debug!("`Intent(id: {id})` payment failed: {msg}");
                }
                intent::Status::Failed
            }
            _ => intent::Status::Pending,
        };

        Ok(Intent {
            amount: Money {
                amount: Decimal::new(amount, Money::MINOR_UNIT_DIGITS),
                currency,
            },
            client_secret: client_secret.map(Into::into),
            status,
            lease_id: metadata
                .get("lease_id")
                .and_then(|id| id.parse::<lease::Id>().ok()),
            months: metadata
                .get("months")
                .and_then(|m| m.parse::<lease::Months>().ok()),
            id: id.into(),
        })
    }
}

/// [`Stripe`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Amount cannot be charged.
    #[display("Cannot charge `{_0}`")]
    #[from(ignore)]
    InvalidAmount(#[error(not(source))] Money),

    /// HTTP request failed.
    #[display("`Stripe` request failed: {_0}")]
    Request(reqwest::Error),

    /// Currency returned by the API is not supported.
    #[display("Unsupported currency: `{_0}`")]
    #[from(ignore)]
    UnsupportedCurrency(#[error(not(source))] String),
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::money::Currency;

    use crate::{domain::lease, infra::payment::intent};

    use super::{IntentResponse, PaymentError};

    fn response(status: &str) -> IntentResponse {
        IntentResponse {
            id: "pi_3Qx".to_owned(),
            client_secret: Some("pi_3Qx_secret_abc".to_owned()),
            amount: 120_050,
            currency: "gbp".to_owned(),
            status: status.to_owned(),
            last_payment_error: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn converts_minor_units_and_metadata() {
        let lease_id = lease::Id::new();
        let mut resp = response("succeeded");
        _ = resp.metadata.insert("lease_id".to_owned(), lease_id.to_string());
        _ = resp.metadata.insert("months".to_owned(), "3".to_owned());

        let converted = resp.into_intent().unwrap();

        assert_eq!(converted.amount.to_string(), "1200.5GBP");
        assert_eq!(converted.amount.currency, Currency::Gbp);
        assert_eq!(converted.status, intent::Status::Succeeded);
        assert_eq!(converted.lease_id, Some(lease_id));
        assert_eq!(converted.months, lease::Months::new(3));
    }

    #[test]
    fn maps_statuses() {
        for (raw, expected) in [
            ("succeeded", intent::Status::Succeeded),
            ("canceled", intent::Status::Failed),
            ("processing", intent::Status::Pending),
            ("requires_payment_method", intent::Status::Pending),
            ("requires_action", intent::Status::Pending),
        ] {
            assert_eq!(
                response(raw).into_intent().unwrap().status,
                expected,
                "wrong status for `{raw}`",
            );
        }

        let mut declined = response("requires_payment_method");
        declined.last_payment_error = Some(PaymentError {
            message: Some("Your card was declined.".to_owned()),
        });
        assert_eq!(
            declined.into_intent().unwrap().status,
            intent::Status::Failed,
        );
    }

    #[test]
    fn rejects_unknown_currency() {
        let mut resp = response("succeeded");
        resp.currency = "xyz".to_owned();

        assert!(resp.into_intent().is_err());
    }
}
