//! Captured camera frames.

use serde::{Deserialize, Serialize};

/// An unencoded frame as delivered by a capture device: tightly packed
/// RGB24 pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Byte length a well-formed RGB24 buffer must have.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// A JPEG-encoded frame ready for upload to the inference service.
///
/// Frames are built fresh on every capture tick and handed straight to the
/// client; they are never buffered or queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, jpeg: Vec<u8>) -> Self {
        Self {
            width,
            height,
            jpeg,
        }
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }
}
