use image::GenericImageView;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Decoded image data
// ---------------------------------------------------------------------------

pub struct DecodedImage {
    pub rgba_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub format_name: String,
}

/// Decode a bitmap synchronously on the calling thread. The viewer shows one
/// image at a time with no prefetch, so there is nothing to overlap with.
pub fn decode_image(path: &Path) -> Result<DecodedImage> {
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let img = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let format_name = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_uppercase();

    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    Ok(DecodedImage {
        rgba_bytes: rgba.into_raw(),
        width,
        height,
        file_size,
        format_name,
    })
}
