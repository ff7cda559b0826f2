use std::sync::Arc;

use crate::corpus::definition::TestDefinition;

/// Logical canvas size used when a style does not declare one.
pub const DEFAULT_SIZE: u32 = 512;

/// Options handed to the rendering engine for one job.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Logical width.
    pub width: u32,
    /// Logical height.
    pub height: u32,
    pub pixel_ratio: f64,
    pub center: Option<[f64; 2]>,
    pub zoom: Option<f64>,
    pub bearing: Option<f64>,
    pub pitch: Option<f64>,
    /// Unmodified style document text.
    pub style_json: Arc<str>,
}

impl RenderOptions {
    /// Derive options from a definition's parsed style. Deterministic; no I/O.
    pub fn from_definition(def: &TestDefinition) -> Self {
        let style = def.parsed_config();
        let test = style.test_metadata();
        let pixel_ratio = test
            .and_then(|t| t.pixel_ratio)
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0);
        Self {
            width: test.and_then(|t| t.width).unwrap_or(DEFAULT_SIZE),
            height: test.and_then(|t| t.height).unwrap_or(DEFAULT_SIZE),
            pixel_ratio,
            center: style.center,
            zoom: style.zoom,
            bearing: style.bearing,
            pitch: style.pitch,
            style_json: def.raw_config_arc(),
        }
    }

    /// Output size in physical pixels (`logical * pixel_ratio`, at least 1 when non-zero).
    pub fn physical_size(&self) -> (u32, u32) {
        fn scale(v: u32, ratio: f64) -> u32 {
            if v == 0 {
                return 0;
            }
            ((v as f64) * ratio).round().max(1.0) as u32
        }
        (
            scale(self.width, self.pixel_ratio),
            scale(self.height, self.pixel_ratio),
        )
    }
}
