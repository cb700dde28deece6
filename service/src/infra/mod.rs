//! Infrastructure layer.

pub mod database;
pub mod source;

pub use self::{database::Database, source::Source};
#[cfg(any(test, feature = "memory"))]
pub use self::database::Memory;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
#[cfg(feature = "random-user")]
pub use self::source::RandomUser;
