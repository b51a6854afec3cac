//! Background [`Task`]s definitions.

mod background;
pub mod expire_leases;

pub use common::Handler as Task;

pub use self::{background::Background, expire_leases::ExpireLeases};
