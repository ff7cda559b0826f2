//! Test corpus discovery: style documents, test definitions, and filtering.

pub mod definition;
pub mod exclusion;
pub mod loader;
pub mod options;
pub mod source;
pub mod style;
