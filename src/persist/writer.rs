use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{SuiteError, SuiteResult};
use crate::run::results::ResultMap;

/// Image encoding of persisted results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Bmp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    /// Fixed file name of a test's result, e.g. `actual.png`.
    pub fn file_name(self) -> String {
        format!("actual.{}", self.extension())
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// What a successful persist phase wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub root: PathBuf,
    /// Written files in `(category, name)` order.
    pub files: Vec<PathBuf>,
}

/// Writes a result set to `<root>/<category>/<name>/actual.<ext>`.
///
/// The root is deleted and recreated on every call, so the tree only ever reflects one run.
/// There is no multi-file atomicity: a failure part-way leaves earlier files in place.
#[derive(Clone, Debug)]
pub struct ResultPersister {
    root: PathBuf,
    format: OutputFormat,
}

impl ResultPersister {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: OutputFormat::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Path the result for `(category, name)` is written to.
    pub fn result_path(&self, category: &str, name: &str) -> PathBuf {
        self.root
            .join(category)
            .join(name)
            .join(self.format.file_name())
    }

    #[tracing::instrument(skip(self, results), fields(root = %self.root.display(), results = results.len()))]
    pub fn persist(&self, results: &ResultMap) -> SuiteResult<PersistReport> {
        self.recreate_root()?;

        let mut report = PersistReport {
            root: self.root.clone(),
            files: Vec::with_capacity(results.len()),
        };
        for (def, image) in results.iter() {
            let category_dir = self.root.join(def.category());
            ensure_dir(&category_dir)?;
            let test_dir = category_dir.join(def.name());
            ensure_dir(&test_dir)?;

            let path = test_dir.join(self.format.file_name());
            image::save_buffer_with_format(
                &path,
                image.data(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
                self.format.image_format(),
            )
            .map_err(|e| SuiteError::persist(format!("write '{}': {e}", path.display())))?;
            tracing::debug!(path = %path.display(), "wrote result");
            report.files.push(path);
        }

        tracing::info!(files = report.files.len(), "results persisted");
        Ok(report)
    }

    fn recreate_root(&self) -> SuiteResult<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root).map_err(|e| {
                SuiteError::persist(format!(
                    "remove stale output root '{}': {e}",
                    self.root.display()
                ))
            })?;
        }
        std::fs::create_dir_all(&self.root).map_err(|e| {
            SuiteError::persist(format!(
                "create output root '{}': {e}",
                self.root.display()
            ))
        })
    }
}

/// Create `dir` if absent. An existing directory is fine; an existing file is not.
fn ensure_dir(dir: &Path) -> SuiteResult<()> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir(dir)
        .map_err(|e| SuiteError::persist(format!("create directory '{}': {e}", dir.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/persist/writer.rs"]
mod tests;
