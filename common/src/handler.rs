//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler.
///
/// Every seam of the application is expressed through this trait: a database
/// selecting or inserting rows, an upstream source fetching records, and the
/// service executing its queries and commands. `Args` is an operation marker
/// (see [`operations`]) describing what is requested.
///
/// [`operations`]: crate::operations
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
