//! Read entities definitions.

pub mod lease;
