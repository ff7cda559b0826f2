use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::corpus::options::RenderOptions;
use crate::corpus::style::StyleDocument;

/// Identity of a test case: `(category, name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestId {
    pub category: String,
    pub name: String,
}

impl TestId {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// One test case loaded from the corpus.
///
/// Immutable once constructed. Equality and hashing only consider the [`TestId`].
#[derive(Clone, Debug)]
pub struct TestDefinition {
    id: TestId,
    raw_config: Arc<str>,
    parsed_config: Arc<StyleDocument>,
    has_unsupported_operations: bool,
}

impl TestDefinition {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        raw_config: impl Into<Arc<str>>,
        parsed_config: StyleDocument,
    ) -> Self {
        let has_unsupported_operations = parsed_config.has_operations();
        Self {
            id: TestId::new(category, name),
            raw_config: raw_config.into(),
            parsed_config: Arc::new(parsed_config),
            has_unsupported_operations,
        }
    }

    pub fn id(&self) -> &TestId {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.id.category
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn raw_config(&self) -> &str {
        &self.raw_config
    }

    pub fn parsed_config(&self) -> &StyleDocument {
        &self.parsed_config
    }

    /// `true` when the style asks for post-load operations the runner cannot drive.
    pub fn has_unsupported_operations(&self) -> bool {
        self.has_unsupported_operations
    }

    pub fn to_options(&self) -> RenderOptions {
        RenderOptions::from_definition(self)
    }

    pub(crate) fn raw_config_arc(&self) -> Arc<str> {
        self.raw_config.clone()
    }
}

impl PartialEq for TestDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TestDefinition {}

impl Hash for TestDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
