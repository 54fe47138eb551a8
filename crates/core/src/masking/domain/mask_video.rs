use std::io;
use std::path::{Path, PathBuf};

use crate::shared::region::PixelBounds;
use crate::shared::video_metadata::VideoMetadata;

use super::mask_location::MaskTarget;

/// A fully flushed mask video aligned with its source.
///
/// Per-request masks are deleted when this value is dropped; call
/// [`MaskVideo::keep`] to hand the file to the caller instead.
#[derive(Debug)]
pub struct MaskVideo {
    target: MaskTarget,
    width: u32,
    height: u32,
    fps: f64,
    frame_count: usize,
    masked: Option<PixelBounds>,
}

impl MaskVideo {
    pub fn new(target: MaskTarget, source: &VideoMetadata, masked: Option<PixelBounds>) -> Self {
        Self {
            target,
            width: source.width,
            height: source.height,
            fps: source.fps,
            frame_count: source.total_frames,
            masked,
        }
    }

    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// The white rectangle after clamping, or `None` for an all-black mask.
    pub fn masked_bounds(&self) -> Option<PixelBounds> {
        self.masked
    }

    pub fn keep(self) -> io::Result<PathBuf> {
        self.target.keep()
    }
}
