use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential video encoder port.
///
/// The output takes its width, height and frame rate from `metadata`.
/// Nothing is guaranteed to be on disk until `close` returns `Ok`.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered packets and finalizes the container. Idempotent.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
