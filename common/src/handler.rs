//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler of `Args`.
///
/// Commands, queries, background tasks and every infrastructure adapter
/// (database, payment gateway, notifier) are all [`Handler`]s of some
/// operation, so a service can be generic over the exact set of operations
/// it needs.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
