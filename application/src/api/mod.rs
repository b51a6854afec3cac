//! GraphQL API definitions.

pub mod lease;
mod mutation;
pub mod payment;
pub mod property;
mod query;
pub mod rental_request;
pub mod scalar;
pub mod transaction;
pub mod user;

use juniper::EmptySubscription;

use crate::Context;

pub use self::{
    lease::Lease, mutation::Mutation, property::Property, query::Query,
    rental_request::RentalRequest, transaction::Transaction,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;
