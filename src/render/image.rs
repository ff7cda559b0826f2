use crate::foundation::error::{SuiteError, SuiteResult};

/// A rendered snapshot as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RenderedImage {
    /// Wrap tightly packed, row-major RGBA8 bytes. The length must equal `width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> SuiteResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(SuiteError::validation(format!(
                "image buffer is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// An image filled with one color. Fails instead of aborting when the buffer cannot be
    /// allocated.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> SuiteResult<Self> {
        let len = byte_len(width, height)?;
        let mut data = alloc_pixels(len)?;
        for _ in 0..len / 4 {
            data.extend_from_slice(&rgba);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Byte length of a tightly packed RGBA8 buffer.
pub(crate) fn byte_len(width: u32, height: u32) -> SuiteResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| SuiteError::validation(format!("image dimensions {width}x{height} overflow")))
}

/// Empty buffer with room for `len` bytes.
pub(crate) fn alloc_pixels(len: usize) -> SuiteResult<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|e| SuiteError::render(format!("cannot allocate {len} byte image: {e}")))?;
    Ok(data)
}
