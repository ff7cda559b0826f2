use serde::Deserialize;

use crate::foundation::error::{SuiteError, SuiteResult};

/// Parsed form of a test case's style document.
///
/// Only the fields the runner needs are typed; everything else in the document is ignored here and
/// travels to the engine as raw text through [`crate::RenderOptions::style_json`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleDocument {
    #[serde(default)]
    pub metadata: Option<StyleMetadata>,
    #[serde(default)]
    pub center: Option<[f64; 2]>,
    #[serde(default)]
    pub zoom: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
    #[serde(default)]
    pub pitch: Option<f64>,
    #[serde(default)]
    pub layers: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleMetadata {
    #[serde(default)]
    pub test: Option<TestMetadata>,
}

/// The `metadata.test` block of a style document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub pixel_ratio: Option<f64>,
    /// Post-load mutation steps; the runner cannot execute these.
    #[serde(default)]
    pub operations: Option<Vec<serde_json::Value>>,
}

impl StyleDocument {
    /// Parse a style document from JSON text.
    pub fn parse(raw: &str) -> SuiteResult<Self> {
        serde_json::from_str(raw).map_err(|e| SuiteError::parse(format!("style JSON: {e}")))
    }

    pub fn test_metadata(&self) -> Option<&TestMetadata> {
        self.metadata.as_ref().and_then(|m| m.test.as_ref())
    }

    /// Return `true` when the document lists at least one operation.
    pub fn has_operations(&self) -> bool {
        self.test_metadata()
            .and_then(|t| t.operations.as_ref())
            .is_some_and(|ops| !ops.is_empty())
    }
}
