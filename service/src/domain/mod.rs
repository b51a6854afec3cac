//! Domain definitions.

pub mod lease;
pub mod notification;
pub mod property;
pub mod rental_request;
pub mod transaction;
pub mod user;

pub use self::{
    lease::Lease, notification::Notification, property::Property,
    rental_request::RentalRequest, transaction::Transaction,
};
