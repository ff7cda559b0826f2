use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::foundation::error::{SuiteError, SuiteResult};

/// Default name of the per-test configuration document.
pub const DEFAULT_CONFIG_FILE: &str = "style.json";

/// Read-only access to a `<root>/<category>/<test>/<config>` corpus.
///
/// Listings must be deterministic; the loader relies on their order.
pub trait CorpusSource: Send {
    /// Category names in enumeration order.
    fn list_categories(&self) -> SuiteResult<Vec<String>>;
    /// Test names within `category` in enumeration order.
    fn list_tests(&self, category: &str) -> SuiteResult<Vec<String>>;
    /// Configuration document text for one test.
    fn read_config(&self, category: &str, test: &str) -> SuiteResult<String>;
    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Corpus stored as a directory tree.
///
/// Entries are enumerated in byte order of their names; hidden entries (leading `.`) and plain files
/// at the category/test levels are skipped.
#[derive(Clone, Debug)]
pub struct FsCorpus {
    root: PathBuf,
    config_file_name: String,
}

impl FsCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config_file(root, DEFAULT_CONFIG_FILE)
    }

    pub fn with_config_file(root: impl Into<PathBuf>, config_file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            config_file_name: config_file_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn list_dirs(dir: &Path) -> SuiteResult<Vec<String>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SuiteError::discovery(format!("list '{}': {e}", dir.display())))?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| SuiteError::discovery(format!("list '{}': {e}", dir.display())))?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 corpus entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if entry.path().is_dir() {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

impl CorpusSource for FsCorpus {
    fn list_categories(&self) -> SuiteResult<Vec<String>> {
        Self::list_dirs(&self.root)
    }

    fn list_tests(&self, category: &str) -> SuiteResult<Vec<String>> {
        Self::list_dirs(&self.root.join(category))
    }

    fn read_config(&self, category: &str, test: &str) -> SuiteResult<String> {
        let path = self
            .root
            .join(category)
            .join(test)
            .join(&self.config_file_name);
        std::fs::read_to_string(&path)
            .map_err(|e| SuiteError::discovery(format!("read '{}': {e}", path.display())))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory corpus for tests and embedding.
///
/// Categories and tests enumerate in sorted order, matching [`FsCorpus`].
#[derive(Clone, Debug, Default)]
pub struct MemoryCorpus {
    categories: BTreeMap<String, BTreeMap<String, Option<String>>>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a test with the given configuration text.
    pub fn insert(
        &mut self,
        category: impl Into<String>,
        test: impl Into<String>,
        config: impl Into<String>,
    ) -> &mut Self {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(test.into(), Some(config.into()));
        self
    }

    /// Add a test whose configuration cannot be read.
    pub fn insert_unreadable(
        &mut self,
        category: impl Into<String>,
        test: impl Into<String>,
    ) -> &mut Self {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(test.into(), None);
        self
    }
}

impl CorpusSource for MemoryCorpus {
    fn list_categories(&self) -> SuiteResult<Vec<String>> {
        Ok(self.categories.keys().cloned().collect())
    }

    fn list_tests(&self, category: &str) -> SuiteResult<Vec<String>> {
        self.categories
            .get(category)
            .map(|tests| tests.keys().cloned().collect())
            .ok_or_else(|| SuiteError::discovery(format!("unknown category '{category}'")))
    }

    fn read_config(&self, category: &str, test: &str) -> SuiteResult<String> {
        match self.categories.get(category).and_then(|t| t.get(test)) {
            Some(Some(config)) => Ok(config.clone()),
            Some(None) => Err(SuiteError::discovery(format!(
                "config for '{category}/{test}' is unreadable"
            ))),
            None => Err(SuiteError::discovery(format!(
                "unknown test '{category}/{test}'"
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("<memory: {} categories>", self.categories.len())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/corpus/source.rs"]
mod tests;
