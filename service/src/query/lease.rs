//! [`Query`] collection related to [`Lease`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{lease, user, Lease};

use super::DatabaseQuery;

/// Queries a [`Lease`] by its [`lease::Id`].
pub type ById = DatabaseQuery<By<Option<Lease>, lease::Id>>;

/// Queries all [`Lease`]s a user is a landlord or a tenant of, the latest
/// first.
pub type ByUser = DatabaseQuery<By<Vec<Lease>, user::Id>>;
