//! Run orchestration: the sequential driver, result aggregation, and completion signaling.

pub mod driver;
pub mod notify;
pub mod orchestrator;
pub mod results;
