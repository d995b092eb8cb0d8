//! Camera Capture Library for the Vision Navigation Assistant
//!
//! Provides the RGB frame type shared by every stage of the pipeline and
//! frame sources that feed it:
//! - Encoded still images (JPEG/PNG) uploaded by the demo client
//! - Image files replayed as a looping demo feed

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, StillImageSource};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Source exhausted")]
    Exhausted,
}

impl From<image::ImageError> for CameraError {
    fn from(e: image::ImageError) -> Self {
        CameraError::Decode(e.to_string())
    }
}

/// Frame source pacing
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Target FPS
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

impl CameraConfig {
    /// Frame interval in nanoseconds at the target rate
    pub fn frame_interval_ns(&self) -> u64 {
        if self.fps == 0 {
            return 0;
        }
        1_000_000_000 / self.fps as u64
    }
}
