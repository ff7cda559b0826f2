//! Reference engine that paints a style's background layer.
//!
//! It does not draw sources or other layer types. It exists so the pipeline can run end to end
//! without an external renderer, and as a baseline for engine integrations.

use crate::corpus::options::RenderOptions;
use crate::foundation::color::StyleColor;
use crate::foundation::error::{SuiteError, SuiteResult};
use crate::render::cancel::CancelToken;
use crate::render::engine::{Renderer, ThreadedEngine};
use crate::render::image::{self, RenderedImage};

/// Default `background-color` for a background layer without paint properties.
const DEFAULT_BACKGROUND: StyleColor = StyleColor::rgba(0.0, 0.0, 0.0, 1.0);

/// Largest canvas painted, in physical pixels. Larger requests fail the job.
pub const MAX_CANVAS_PIXELS: u64 = 16384 * 16384;

#[derive(Clone, Copy, Debug, Default)]
pub struct BackgroundRenderer;

/// [`BackgroundRenderer`] running one worker thread per job.
pub type BackgroundEngine = ThreadedEngine<BackgroundRenderer>;

impl BackgroundRenderer {
    pub fn engine() -> BackgroundEngine {
        ThreadedEngine::new(Self)
    }

    /// Resolve the fill color: the first `background` layer, or transparent when there is none.
    pub fn background_color(style_json: &str) -> SuiteResult<StyleColor> {
        let style: serde_json::Value = serde_json::from_str(style_json)
            .map_err(|e| SuiteError::render(format!("style JSON: {e}")))?;

        let Some(layers) = style.get("layers").and_then(|l| l.as_array()) else {
            return Ok(StyleColor::TRANSPARENT);
        };
        let Some(layer) = layers
            .iter()
            .find(|l| l.get("type").and_then(|t| t.as_str()) == Some("background"))
        else {
            return Ok(StyleColor::TRANSPARENT);
        };

        let paint = layer.get("paint");
        let color = match paint.and_then(|p| p.get("background-color")) {
            None => DEFAULT_BACKGROUND,
            Some(serde_json::Value::String(s)) => StyleColor::parse(s).map_err(SuiteError::render)?,
            Some(other) => {
                return Err(SuiteError::render(format!(
                    "unsupported background-color value {other}"
                )));
            }
        };
        let opacity = paint
            .and_then(|p| p.get("background-opacity"))
            .and_then(|o| o.as_f64())
            .unwrap_or(1.0);
        Ok(color.with_opacity(opacity))
    }
}

impl Renderer for BackgroundRenderer {
    fn render(&self, options: &RenderOptions, cancel: &CancelToken) -> SuiteResult<RenderedImage> {
        let (width, height) = options.physical_size();
        if width == 0 || height == 0 {
            return Err(SuiteError::render(format!(
                "canvas must be non-empty, got {width}x{height}"
            )));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_CANVAS_PIXELS {
            return Err(SuiteError::render(format!(
                "canvas {width}x{height} exceeds the {MAX_CANVAS_PIXELS} pixel limit"
            )));
        }
        let rgba = Self::background_color(&options.style_json)?.to_rgba8();

        let mut data = image::alloc_pixels(image::byte_len(width, height)?)?;
        for _ in 0..height {
            if cancel.is_canceled() {
                return Err(SuiteError::Canceled);
            }
            for _ in 0..width {
                data.extend_from_slice(&rgba);
            }
        }
        RenderedImage::new(width, height, data)
    }
}
