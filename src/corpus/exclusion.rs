use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{SuiteError, SuiteResult};

/// Known-bad `(name, category)` pairs skipped by default.
pub const BUILTIN_EXCLUSIONS: &[(&str, &str)] = &[
    ("overlay", "background-opacity"),
    ("collision-lines-pitched", "debug"),
    ("1024-circle", "extent"),
    ("empty", "empty"),
    ("rotation-alignment-map", "icon-pitch-scaling"),
    ("rotation-alignment-viewport", "icon-pitch-scaling"),
    ("pitch15", "line-pitch"),
    ("pitch30", "line-pitch"),
    ("line-placement-true-pitched", "text-keep-upright"),
    ("180", "raster-rotation"),
    ("45", "raster-rotation"),
    ("90", "raster-rotation"),
    // crashes the renderer
    ("mapbox-gl-js#5631", "regressions"),
    ("overlapping", "raster-masking"),
    ("missing", "raster-loading"),
    ("pitchAndBearing", "line-pitch"),
];

/// Static set of excluded tests, matched by exact, case-sensitive `(name, category)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    pairs: BTreeSet<(String, String)>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in list ([`BUILTIN_EXCLUSIONS`]).
    pub fn builtin() -> Self {
        let mut set = Self::empty();
        for (name, category) in BUILTIN_EXCLUSIONS {
            set.insert(*name, *category);
        }
        set
    }

    pub fn insert(&mut self, name: impl Into<String>, category: impl Into<String>) -> bool {
        self.pairs.insert((name.into(), category.into()))
    }

    pub fn contains(&self, name: &str, category: &str) -> bool {
        // BTreeSet<(String, String)> cannot be probed with borrowed tuples; the set is small.
        self.pairs
            .iter()
            .any(|(n, c)| n.as_str() == name && c.as_str() == category)
    }

    pub fn extend(&mut self, other: ExclusionSet) {
        self.pairs.extend(other.pairs);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate `(name, category)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    /// Read an ignore document: a JSON object keyed by `"<prefix>/<category>/<name>"` with a reason
    /// string as value.
    ///
    /// Only the last two path segments are significant, so `"render-tests/line-pitch/pitch15"` and
    /// `"line-pitch/pitch15"` name the same test. Keys with fewer than two segments are rejected.
    pub fn from_ignore_reader<R: std::io::Read>(r: R) -> SuiteResult<Self> {
        let doc: BTreeMap<String, serde_json::Value> = serde_json::from_reader(r)
            .map_err(|e| SuiteError::parse(format!("ignore document: {e}")))?;

        let mut set = Self::empty();
        for key in doc.keys() {
            let mut parts = key.rsplit('/').filter(|p| !p.is_empty());
            let (Some(name), Some(category)) = (parts.next(), parts.next()) else {
                return Err(SuiteError::parse(format!(
                    "ignore key '{key}' must look like '<category>/<name>'"
                )));
            };
            set.insert(name, category);
        }
        Ok(set)
    }

    pub fn from_ignore_path(path: impl AsRef<Path>) -> SuiteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SuiteError::discovery(format!("open ignore file '{}': {e}", path.display()))
        })?;
        Self::from_ignore_reader(BufReader::new(f))
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut set = Self::empty();
        for (name, category) in iter {
            set.insert(name, category);
        }
        set
    }
}

#[cfg(test)]
#[path = "../../tests/unit/corpus/exclusion.rs"]
mod tests;
