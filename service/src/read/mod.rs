//! Read entities definitions.

pub mod user;
