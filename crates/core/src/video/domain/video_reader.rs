use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Reads geometry, timing and frames from a video source.
///
/// Mask synthesis only needs [`open`](VideoReader::open); frame decoding
/// serves verification of written artifacts.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata without decoding frames.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns an iterator over RGB frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
