//! JPEG encoding of captured frames.

use image::codecs::jpeg::JpegEncoder;
use image::ColorType;

use joy_models::{Frame, RawFrame};

use crate::error::{CaptureResult, ResourceError};

/// Encode a raw RGB24 frame to JPEG at the given quality (1-100).
pub fn encode_jpeg(raw: &RawFrame, quality: u8) -> CaptureResult<Frame> {
    if raw.pixels.len() != raw.expected_len() {
        return Err(ResourceError::encode(format!(
            "pixel buffer is {} bytes, expected {} for {}x{} RGB24",
            raw.pixels.len(),
            raw.expected_len(),
            raw.width,
            raw.height
        )));
    }

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    encoder
        .encode(&raw.pixels, raw.width, raw.height, ColorType::Rgb8)
        .map_err(|e| ResourceError::encode(e.to_string()))?;

    Ok(Frame::new(raw.width, raw.height, jpeg))
}
