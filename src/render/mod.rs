//! Rendering engine boundary.

pub mod background;
pub mod cancel;
pub mod engine;
pub mod image;
