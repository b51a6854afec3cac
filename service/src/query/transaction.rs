//! [`Query`] collection related to [`Transaction`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Lease, Query};
use crate::domain::{lease, Transaction};

use super::DatabaseQuery;

/// Queries all [`Transaction`]s of a [`Lease`], in the order they were made.
pub type ByLease = DatabaseQuery<By<Vec<Transaction>, lease::Id>>;
