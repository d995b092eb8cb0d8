//! Frame sources

use std::path::Path;

use tracing::{debug, info};

use crate::{CameraConfig, CameraError, VideoFrame};

/// Anything that yields frames one at a time
pub trait FrameSource: Send {
    /// Produce the next frame
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError>;
}

/// Replays a single decoded image as a frame feed.
///
/// Used for demos and tests where no webcam is attached. Every call returns
/// the same pixels with an advancing sequence number and timestamp.
pub struct StillImageSource {
    frame: VideoFrame,
    interval_ns: u64,
    sequence: u32,
    remaining: Option<u32>,
}

impl StillImageSource {
    /// Load and decode an image file
    pub fn open<P: AsRef<Path>>(path: P, config: &CameraConfig) -> Result<Self, CameraError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| CameraError::Open(format!("{}: {}", path.display(), e)))?;
        let source = Self::from_bytes(&bytes, config)?;
        info!(
            "Opened still image source {} ({}x{})",
            path.display(),
            source.frame.width,
            source.frame.height
        );
        Ok(source)
    }

    /// Decode an in-memory encoded image
    pub fn from_bytes(bytes: &[u8], config: &CameraConfig) -> Result<Self, CameraError> {
        let frame = VideoFrame::decode(bytes, 0, 0)?;
        Ok(Self::from_frame(frame, config))
    }

    /// Wrap an already decoded frame
    pub fn from_frame(frame: VideoFrame, config: &CameraConfig) -> Self {
        Self {
            frame,
            interval_ns: config.frame_interval_ns(),
            sequence: 0,
            remaining: None,
        }
    }

    /// Stop after `count` frames instead of looping forever
    pub fn with_limit(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(CameraError::Exhausted);
            }
            *remaining -= 1;
        }

        let mut frame = self.frame.clone();
        frame.sequence = self.sequence;
        frame.timestamp_ns = self.sequence as u64 * self.interval_ns;
        self.sequence = self.sequence.wrapping_add(1);

        debug!("Still source emitted frame {}", frame.sequence);
        Ok(frame)
    }
}
