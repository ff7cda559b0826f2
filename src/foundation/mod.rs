//! Shared error and value types.

pub mod color;
pub mod error;
