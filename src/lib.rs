//! snapsuite runs a render-test corpus through a rendering engine and writes the actual images.
//!
//! A run is a strict sequence:
//!
//! - [`CorpusLoader`] scans `<root>/<category>/<test>/style.json` and filters the qualifying tests
//! - the driver renders them one at a time through a [`RenderEngine`]
//! - once every job has settled, [`ResultPersister`] recreates the output tree
//! - the completion callback fires exactly once with the [`RunOutcome`]
#![forbid(unsafe_code)]

pub mod config;
pub mod corpus;
pub mod foundation;
pub mod persist;
pub mod render;
pub mod run;

pub use crate::config::{ExcludedTest, SuiteConfig};
pub use crate::corpus::definition::{TestDefinition, TestId};
pub use crate::corpus::exclusion::{BUILTIN_EXCLUSIONS, ExclusionSet};
pub use crate::corpus::loader::{
    CorpusLoad, CorpusLoader, RESERVED_CATEGORY, SkipReason, SkippedCase,
};
pub use crate::corpus::options::RenderOptions;
pub use crate::corpus::source::{CorpusSource, FsCorpus, MemoryCorpus};
pub use crate::corpus::style::StyleDocument;
pub use crate::foundation::color::StyleColor;
pub use crate::foundation::error::{SuiteError, SuiteResult};
pub use crate::persist::writer::{OutputFormat, PersistReport, ResultPersister};
pub use crate::render::background::{BackgroundEngine, BackgroundRenderer};
pub use crate::render::cancel::CancelToken;
pub use crate::render::engine::{
    JobId, JobReply, RenderEngine, RenderJob, Renderer, ThreadedEngine,
};
pub use crate::render::image::RenderedImage;
pub use crate::run::driver::{FailedTest, RunReport};
pub use crate::run::notify::{CompletionNotifier, RunOutcome};
pub use crate::run::orchestrator::{RenderTestRun, RunCanceler, RunHandle};
pub use crate::run::results::ResultMap;
