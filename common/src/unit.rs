//! Marker types tagging [`DateTimeOf`] moments of an entity's life.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity reaching its end of life (an expired
/// lease, an outdated session).
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
