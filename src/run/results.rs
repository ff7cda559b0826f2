use std::collections::BTreeMap;

use crate::corpus::definition::{TestDefinition, TestId};
use crate::foundation::error::{SuiteError, SuiteResult};
use crate::render::image::RenderedImage;

/// Rendered images keyed by test identity. Append-only; keys are unique.
#[derive(Debug, Default)]
pub struct ResultMap {
    entries: BTreeMap<TestId, (TestDefinition, RenderedImage)>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one result. A second result for the same test is rejected and the map is unchanged.
    pub fn insert(&mut self, def: TestDefinition, image: RenderedImage) -> SuiteResult<()> {
        if self.entries.contains_key(def.id()) {
            return Err(SuiteError::validation(format!(
                "duplicate result for '{}'",
                def.id()
            )));
        }
        self.entries.insert(def.id().clone(), (def, image));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in `(category, name)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&TestDefinition, &RenderedImage)> {
        self.entries.values().map(|(def, img)| (def, img))
    }

    pub fn ids(&self) -> impl Iterator<Item = &TestId> {
        self.entries.keys()
    }
}
