//! Video frame types and processing

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Create a frame filled with a single color
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(rgb_len(width, height).unwrap_or(0))
            .collect();
        Self::new(data, width, height, 0, 0)
    }

    /// Decode an encoded image (JPEG, PNG) into an RGB frame
    pub fn decode(bytes: &[u8], timestamp_ns: u64, sequence: u32) -> Result<Self, CameraError> {
        if bytes.is_empty() {
            return Err(CameraError::Decode("empty image payload".to_string()));
        }
        let img = image::load_from_memory(bytes)?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(Self {
            data: rgb.into_raw(),
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Check that the buffer length matches the declared dimensions
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidFrame(format!(
                "zero-sized frame {}x{}",
                self.width, self.height
            )));
        }
        let expected = rgb_len(self.width, self.height).ok_or_else(|| {
            CameraError::InvalidFrame(format!("frame {}x{} is too large", self.width, self.height))
        })?;
        if self.data.len() != expected {
            return Err(CameraError::InvalidFrame(format!(
                "expected {} bytes, got {}",
                expected,
                self.data.len()
            )));
        }
        Ok(())
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = rgb_len(self.width, y)?.checked_add(x as usize * 3)?;
        match self.data.get(idx..idx.checked_add(3)?)? {
            &[r, g, b] => Some([r, g, b]),
            _ => None,
        }
    }

    /// Borrow the frame as an `image` RGB buffer (copies the pixel data)
    pub fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::InvalidFrame("buffer does not match frame dimensions".to_string())
        })
    }

    /// Encode the frame as JPEG
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CameraError> {
        self.validate()?;
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .write_image(&self.data, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| CameraError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// Bytes needed for an RGB frame, `None` if that does not fit in memory
fn rgb_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(3)
}
