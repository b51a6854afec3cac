//! [`Config`]-related definitions.

use std::{sync::Arc, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::Debug;
use secrecy::SecretString;
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Payment gateway configuration.
    pub payment: Payment,

    /// Notifications configuration.
    pub notifications: Notifications,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret shared with the identity provider.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    #[debug(skip)]
    pub jwt_secret: String,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            tasks: Tasks { expire_leases },
        } = value;
        Self {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            expire_leases: service::task::expire_leases::Config {
                interval: expire_leases.interval,
            },
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpireLeases` task configuration.
    pub expire_leases: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Payment gateway configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Payment {
    /// Base URL of the Stripe API.
    #[default("https://api.stripe.com".to_owned())]
    pub api_url: String,

    /// Secret key of the Stripe account.
    #[debug(skip)]
    pub secret_key: String,
}

impl From<Payment> for service::infra::payment::stripe::Config {
    fn from(value: Payment) -> Self {
        let Payment {
            api_url,
            secret_key,
        } = value;
        Self {
            api_url,
            secret_key: Arc::new(SecretString::from(secret_key)),
        }
    }
}

/// Notifications configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Notifications {
    /// URL of the webhook notifications are delivered to.
    ///
    /// Notifications are only logged if it's not set.
    pub webhook_url: Option<String>,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    #[debug(skip)]
    pub password: String,

    /// Database name to connect to.
    #[default("lettings".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Config, Payment};

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.service.tasks.expire_leases.interval,
            Duration::from_secs(60 * 60),
        );
        assert_eq!(config.payment.api_url, "https://api.stripe.com");
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn hides_secrets_in_debug_output() {
        let payment = Payment {
            api_url: "https://api.stripe.com".to_owned(),
            secret_key: "sk_test_4eC39HqLyjWDarjtT1zdp7dc".to_owned(),
        };

        assert!(!format!("{payment:?}").contains("sk_test"));
    }
}
