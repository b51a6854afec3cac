//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{convert::Infallible, error::Error};

use common::operations::{By, Dispatch, Start};
use derive_more::Debug;

use crate::{domain::Notification, infra::Notifier};
#[cfg(doc)]
use crate::infra::{Database, Gateway};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] decoding key, verifying tokens of the identity provider.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// [`task::ExpireLeases`] configuration.
    pub expire_leases: task::expire_leases::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Gw, Nt> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Payment [`Gateway`] of this [`Service`].
    gateway: Gw,

    /// [`Notifier`] of this [`Service`].
    notifier: Nt,
}

impl<Db, Gw, Nt> Service<Db, Gw, Nt> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its [`Task`]s.
    pub fn new(
        config: Config,
        database: Db,
        gateway: Gw,
        notifier: Nt,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<task::ExpireLeases<Self>, task::expire_leases::Config>,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            gateway,
            notifier,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().expire_leases))).await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns payment [`Gateway`] of this [`Service`].
    #[must_use]
    pub fn gateway(&self) -> &Gw {
        &self.gateway
    }

    /// Dispatches the provided [`Notification`]s, without waiting for their
    /// delivery.
    async fn notify(&self, notifications: impl IntoIterator<Item = Notification>)
    where
        Nt: Notifier<Dispatch<Notification>, Ok = (), Err = Infallible>,
    {
        for notification in notifications {
            self.notifier
                .execute(Dispatch(notification))
                .await
                .unwrap_or_else(|e| match e {});
        }
    }
}
