//! [`Command`] definition.

pub mod create_users;
pub mod populate_users;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{create_users::CreateUsers, populate_users::PopulateUsers};
