//! [`Lease`]-related read definitions.

use derive_more::{Deref, Into};

use crate::domain::Lease;

/// [`Lease`] whose grace period is over or which reached its natural end, so
/// it should be expired.
#[derive(Clone, Debug, Deref, Into)]
pub struct DueToExpire(pub Lease);
