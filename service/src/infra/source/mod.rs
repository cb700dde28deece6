//! Upstream [`Source`]s of [`user::Draft`]s.
//!
//! [`user::Draft`]: crate::domain::user::Draft

#[cfg(feature = "random-user")]
pub mod random_user;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "random-user")]
pub use self::random_user::RandomUser;

/// Upstream fetching operation.
pub use common::Handler as Source;

/// [`Source`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Upstream could not be reached or its response could not be read.
    #[cfg(feature = "random-user")]
    #[display("Upstream request failed: {_0}")]
    Transport(reqwest::Error),

    /// Upstream responded with a non-success status.
    #[display("Upstream responded with `{_0}` status")]
    #[from(ignore)]
    Status(#[error(not(source))] u16),

    /// Upstream response body is malformed.
    #[display("Upstream response is malformed: {_0}")]
    Decode(serde_json::Error),
}
