use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::GenericImageView;
pub use image::ImageFormat;

use crate::{ApiError, ImageData, Result};

pub type Fingerprint = [u8; 32];

/// An image payload turned into displayable bytes.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub hash: String,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// blake3 over the raw bytes, used to spot identical renders.
    pub fingerprint: Fingerprint,
}

impl DecodedImage {
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(&self.fingerprint[..8])
    }
}

/// Decode one `{hash, data}` entry.
///
/// The service emits MIME-style base64 (line breaks every 76 chars), so all
/// ASCII whitespace is dropped before decoding.
pub fn decode_image(entry: &ImageData) -> Result<DecodedImage> {
    let compact: String = entry
        .data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ApiError::Decode(format!("image {}: invalid base64: {e}", entry.hash)))?;

    let format = image::guess_format(&bytes)
        .map_err(|e| ApiError::Decode(format!("image {}: unknown format: {e}", entry.hash)))?;

    let img = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| ApiError::Decode(format!("image {}: {e}", entry.hash)))?;
    let (width, height) = img.dimensions();

    Ok(DecodedImage {
        hash: entry.hash.clone(),
        fingerprint: blake3::hash(&bytes).into(),
        bytes,
        format,
        width,
        height,
    })
}

pub fn decode_all(entries: &[ImageData]) -> Result<Vec<DecodedImage>> {
    entries.iter().map(decode_image).collect()
}
