use std::collections::BTreeSet;

use crate::corpus::definition::{TestDefinition, TestId};
use crate::corpus::exclusion::ExclusionSet;
use crate::corpus::source::CorpusSource;
use crate::corpus::style::StyleDocument;

/// Category that is never run, whatever the exclusion set says.
pub const RESERVED_CATEGORY: &str = "combinations";

/// Why a corpus entry did not make it into the qualifying sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The category's test list could not be read.
    UnlistableCategory(String),
    /// The configuration document could not be read.
    Unreadable(String),
    /// The configuration document is not valid.
    Malformed(String),
    UnsupportedOperations,
    ReservedCategory,
    Excluded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedCase {
    /// For [`SkipReason::UnlistableCategory`] the name is empty.
    pub id: TestId,
    pub reason: SkipReason,
}

/// Result of a corpus scan.
#[derive(Clone, Debug, Default)]
pub struct CorpusLoad {
    /// Qualifying sequence, in run order.
    pub definitions: Vec<TestDefinition>,
    pub skipped: Vec<SkippedCase>,
}

/// Scans a corpus and filters it down to the qualifying sequence.
pub struct CorpusLoader {
    source: Box<dyn CorpusSource>,
    exclusions: ExclusionSet,
    reserved_categories: BTreeSet<String>,
}

impl std::fmt::Debug for CorpusLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusLoader")
            .field("source", &self.source.describe())
            .field("exclusions", &self.exclusions.len())
            .field("reserved_categories", &self.reserved_categories)
            .finish()
    }
}

impl CorpusLoader {
    /// Loader with the built-in exclusion list and `combinations` reserved.
    pub fn new(source: impl CorpusSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            exclusions: ExclusionSet::builtin(),
            reserved_categories: BTreeSet::from([RESERVED_CATEGORY.to_owned()]),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Add a reserved category. [`RESERVED_CATEGORY`] is always reserved.
    pub fn reserve_category(mut self, category: impl Into<String>) -> Self {
        self.reserved_categories.insert(category.into());
        self
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Produce the qualifying sequence. Never fails; problems are logged and skipped.
    pub fn load(&self) -> Vec<TestDefinition> {
        self.scan().definitions
    }

    /// Like [`CorpusLoader::load`] but also reports every skipped entry.
    ///
    /// Categories are visited in reverse enumeration order; tests within a category in forward
    /// order.
    #[tracing::instrument(skip(self), fields(corpus = %self.source.describe()))]
    pub fn scan(&self) -> CorpusLoad {
        let mut out = CorpusLoad::default();

        let categories = match self.source.list_categories() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "cannot list corpus categories");
                return out;
            }
        };

        for category in categories.iter().rev() {
            let tests = match self.source.list_tests(category) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(%category, error = %e, "cannot list category");
                    out.skipped.push(SkippedCase {
                        id: TestId::new(category.as_str(), ""),
                        reason: SkipReason::UnlistableCategory(e.to_string()),
                    });
                    continue;
                }
            };

            for test in tests {
                match self.load_case(category, &test) {
                    Ok(def) => out.definitions.push(def),
                    Err(reason) => out.skipped.push(SkippedCase {
                        id: TestId::new(category.as_str(), test),
                        reason,
                    }),
                }
            }
        }

        tracing::info!(
            qualifying = out.definitions.len(),
            skipped = out.skipped.len(),
            "corpus scanned"
        );
        out
    }

    fn load_case(&self, category: &str, test: &str) -> Result<TestDefinition, SkipReason> {
        let raw = self.source.read_config(category, test).map_err(|e| {
            tracing::error!(%category, %test, error = %e, "cannot read test config");
            SkipReason::Unreadable(e.to_string())
        })?;
        let parsed = StyleDocument::parse(&raw).map_err(|e| {
            tracing::error!(%category, %test, error = %e, "cannot parse test config");
            SkipReason::Malformed(e.to_string())
        })?;

        let def = TestDefinition::new(category, test, raw, parsed);
        if def.has_unsupported_operations() {
            tracing::warn!(%category, %test, "skipping test, it requires operations");
            return Err(SkipReason::UnsupportedOperations);
        }
        if self.reserved_categories.contains(category) {
            tracing::debug!(%category, %test, "skipping reserved category");
            return Err(SkipReason::ReservedCategory);
        }
        if self.exclusions.contains(test, category) {
            tracing::debug!(%category, %test, "skipping excluded test");
            return Err(SkipReason::Excluded);
        }
        Ok(def)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/corpus/loader.rs"]
mod tests;
