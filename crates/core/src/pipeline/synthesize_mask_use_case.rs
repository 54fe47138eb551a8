use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::masking::domain::mask_location::MaskLocation;
use crate::masking::domain::mask_rasterizer;
use crate::masking::domain::mask_video::MaskVideo;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::InpaintError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Builds a static mask video aligned with a source video.
///
/// Reads only the source metadata, rasterizes `region` once, and writes that
/// single frame once per source frame. Reusable: reader and writer are
/// opened and closed on every call.
pub struct SynthesizeMaskUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    location: MaskLocation,
    cancelled: Arc<AtomicBool>,
}

impl SynthesizeMaskUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        location: MaskLocation,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            writer,
            location,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        input: &Path,
        region: &Region,
        logger: &mut dyn PipelineLogger,
    ) -> Result<MaskVideo, InpaintError> {
        let metadata = self.read_metadata(input)?;
        let template = mask_rasterizer::rasterize(metadata.width, metadata.height, region);
        let masked = region.clamp_to(metadata.width, metadata.height);
        if masked.is_none() {
            log::warn!(
                "Region {region} lies outside the {}x{} frame; mask will be empty",
                metadata.width,
                metadata.height
            );
        }
        logger.metric(
            "mask_pixels",
            mask_rasterizer::remove_pixel_count(&template) as f64,
        );

        let target = self.location.allocate().map_err(|source| InpaintError::Io {
            path: self.location.describe().to_path_buf(),
            source,
        })?;

        if let Err(e) = self.encode(&template, &metadata, target.path(), logger) {
            target.discard();
            return Err(e);
        }

        log::debug!(
            "Wrote {} mask frames to {}",
            metadata.total_frames,
            target.path().display()
        );
        Ok(MaskVideo::new(target, &metadata, masked))
    }

    fn read_metadata(&mut self, input: &Path) -> Result<VideoMetadata, InpaintError> {
        let opened = self.reader.open(input);
        self.reader.close();

        let metadata_error = |reason: String| InpaintError::Metadata {
            path: input.to_path_buf(),
            reason,
        };
        let metadata = opened.map_err(|e| metadata_error(e.to_string()))?;
        metadata.validate().map_err(metadata_error)?;
        Ok(metadata)
    }

    fn encode(
        &mut self,
        template: &Frame,
        metadata: &VideoMetadata,
        path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), InpaintError> {
        let encoding_error = |reason: String| InpaintError::Encoding {
            path: path.to_path_buf(),
            reason,
        };

        self.writer
            .open(path, metadata)
            .map_err(|e| encoding_error(e.to_string()))?;
        let mut session = WriterSession::new(self.writer.as_mut());

        let total = metadata.total_frames;
        for written in 1..=total {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(InpaintError::Cancelled);
            }
            session
                .write(template)
                .map_err(|e| encoding_error(e.to_string()))?;
            logger.progress(written, total);
        }

        session.finish().map_err(|e| encoding_error(e.to_string()))
    }
}

/// Scoped ownership of an opened writer: closes it on every exit path.
struct WriterSession<'a> {
    writer: &'a mut dyn VideoWriter,
    closed: bool,
}

impl<'a> WriterSession<'a> {
    fn new(writer: &'a mut dyn VideoWriter) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.write(frame)
    }

    fn finish(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.closed = true;
        self.writer.close()
    }
}

impl Drop for WriterSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.writer.close() {
                log::warn!("Failed to close mask writer: {e}");
            }
        }
    }
}
