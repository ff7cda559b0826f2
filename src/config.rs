use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::exclusion::ExclusionSet;
use crate::corpus::loader::CorpusLoader;
use crate::corpus::source::{DEFAULT_CONFIG_FILE, FsCorpus};
use crate::foundation::error::{SuiteError, SuiteResult};
use crate::persist::writer::{OutputFormat, ResultPersister};

/// An excluded test, matched exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedTest {
    pub name: String,
    pub category: String,
}

/// Suite configuration, usually read from a JSON file.
///
/// ```json
/// {
///   "corpus_root": "integration/render-tests",
///   "output_root": "out/render-tests",
///   "excluded": [{ "name": "pitch15", "category": "line-pitch" }],
///   "image_format": "png"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    pub corpus_root: PathBuf,
    pub output_root: PathBuf,
    /// Name of the per-test configuration document.
    pub config_file_name: String,
    /// Categories never run. `combinations` is always reserved.
    pub reserved_categories: Vec<String>,
    /// Start from the built-in exclusion list.
    pub use_builtin_exclusions: bool,
    /// Additional exclusions.
    pub excluded: Vec<ExcludedTest>,
    /// Optional ignore document merged into the exclusions.
    pub ignore_file: Option<PathBuf>,
    pub image_format: OutputFormat,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("render-tests"),
            output_root: PathBuf::from("render-results"),
            config_file_name: DEFAULT_CONFIG_FILE.to_owned(),
            reserved_categories: Vec::new(),
            use_builtin_exclusions: true,
            excluded: Vec::new(),
            ignore_file: None,
            image_format: OutputFormat::Png,
        }
    }
}

impl SuiteConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> SuiteResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| SuiteError::validation(format!("parse suite config JSON: {e}")))
    }

    /// Read a config file. Relative paths inside it resolve against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> SuiteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SuiteError::validation(format!("open suite config '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        Ok(cfg)
    }

    fn rebase(&mut self, base: &Path) {
        fn join(base: &Path, p: &mut PathBuf) {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        join(base, &mut self.corpus_root);
        join(base, &mut self.output_root);
        if let Some(ignore) = self.ignore_file.as_mut() {
            join(base, ignore);
        }
    }

    pub fn validate(&self) -> SuiteResult<()> {
        if self.config_file_name.is_empty() || self.config_file_name.contains(['/', '\\']) {
            return Err(SuiteError::validation(
                "config_file_name must be a plain, non-empty file name",
            ));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(SuiteError::validation("output_root must be set"));
        }
        if self.corpus_root.as_os_str().is_empty() {
            return Err(SuiteError::validation("corpus_root must be set"));
        }

        // The output root is wiped on every run, so it must not overlap the corpus.
        let corpus = normalize_root(&self.corpus_root)?;
        let output = normalize_root(&self.output_root)?;
        let mut overlap = nested(&corpus, &output);
        if let (Ok(corpus), Ok(output)) = (
            self.corpus_root.canonicalize(),
            self.output_root.canonicalize(),
        ) {
            overlap |= nested(&corpus, &output);
        }
        if overlap {
            return Err(SuiteError::validation(format!(
                "output_root '{}' overlaps corpus_root '{}'",
                self.output_root.display(),
                self.corpus_root.display()
            )));
        }
        Ok(())
    }

    /// Resolve the full exclusion set: built-ins (if enabled), explicit entries, ignore file.
    pub fn exclusions(&self) -> SuiteResult<ExclusionSet> {
        let mut set = if self.use_builtin_exclusions {
            ExclusionSet::builtin()
        } else {
            ExclusionSet::empty()
        };
        for e in &self.excluded {
            set.insert(e.name.as_str(), e.category.as_str());
        }
        if let Some(path) = &self.ignore_file {
            set.extend(ExclusionSet::from_ignore_path(path)?);
        }
        Ok(set)
    }

    pub fn build_loader(&self) -> SuiteResult<CorpusLoader> {
        self.validate()?;
        let source = FsCorpus::with_config_file(&self.corpus_root, self.config_file_name.as_str());
        let mut loader = CorpusLoader::new(source).with_exclusions(self.exclusions()?);
        for category in &self.reserved_categories {
            loader = loader.reserve_category(category.as_str());
        }
        Ok(loader)
    }

    pub fn build_persister(&self) -> ResultPersister {
        ResultPersister::new(&self.output_root).with_format(self.image_format)
    }
}

/// Absolute form of `path` with `.` and `..` resolved lexically.
fn normalize_root(path: &Path) -> SuiteResult<PathBuf> {
    let abs = std::path::absolute(path).map_err(|e| {
        SuiteError::validation(format!("resolve '{}': {e}", path.display()))
    })?;
    let mut out = PathBuf::new();
    for component in abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

fn nested(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
