use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::inpainting::domain::inpainter::{InpaintRequest, Inpainter};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::synthesize_mask_use_case::SynthesizeMaskUseCase;
use crate::shared::error::InpaintError;
use crate::shared::region::Region;

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InpaintOutcome {
    pub output: PathBuf,
    /// Mask file left on disk, when the request asked to keep it.
    pub kept_mask: Option<PathBuf>,
}

/// Erases a static rectangle from a video.
///
/// Synthesizes the mask, then hands source, mask and output path to the
/// inpainter. The mask is fully flushed before the inpainter starts.
pub struct InpaintVideoUseCase {
    synthesizer: SynthesizeMaskUseCase,
    inpainter: Box<dyn Inpainter>,
    logger: Box<dyn PipelineLogger>,
    cancelled: Arc<AtomicBool>,
    keep_mask: bool,
}

impl InpaintVideoUseCase {
    /// `cancelled` should be the same flag the synthesizer was built with.
    pub fn new(
        synthesizer: SynthesizeMaskUseCase,
        inpainter: Box<dyn Inpainter>,
        logger: Box<dyn PipelineLogger>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            synthesizer,
            inpainter,
            logger,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            keep_mask: false,
        }
    }

    /// Leave the mask file in place after the request finishes.
    pub fn keep_mask(mut self, keep: bool) -> Self {
        self.keep_mask = keep;
        self
    }

    pub fn execute(
        &mut self,
        input: &Path,
        region: &Region,
        output: &Path,
    ) -> Result<InpaintOutcome, InpaintError> {
        let start = Instant::now();
        let mask = self
            .synthesizer
            .execute(input, region, self.logger.as_mut())?;
        self.logger.timing("synthesize", elapsed_ms(start));

        if self.cancelled.load(Ordering::Relaxed) {
            return Err(InpaintError::Cancelled);
        }

        self.logger.info(&format!(
            "Mask ready: {} ({}x{}, {} frames); running {}",
            mask.path().display(),
            mask.width(),
            mask.height(),
            mask.frame_count(),
            self.inpainter.name()
        ));

        let start = Instant::now();
        let request = InpaintRequest {
            video: input,
            mask: mask.path(),
            output,
            cancelled: &self.cancelled,
        };
        if let Err(e) = self.inpainter.inpaint(&request) {
            if self.cancelled.load(Ordering::Relaxed) {
                log::debug!("Inpainter stopped after cancellation: {e}");
                return Err(InpaintError::Cancelled);
            }
            return Err(InpaintError::Collaborator(e));
        }
        self.logger.timing("inpaint", elapsed_ms(start));

        let kept_mask = if self.keep_mask {
            let path = mask.path().to_path_buf();
            match mask.keep() {
                Ok(kept) => Some(kept),
                Err(source) => return Err(InpaintError::Io { path, source }),
            }
        } else {
            None
        };

        self.logger.summary();
        Ok(InpaintOutcome {
            output: output.to_path_buf(),
            kept_mask,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masking::domain::mask_location::MaskLocation;
    use crate::masking::domain::mask_rasterizer;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::domain::video_writer::VideoWriter;
    use std::sync::{Barrier, Mutex};

    // --- Stubs ---

    struct StubReader {
        metadata: VideoMetadata,
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(self.metadata.clone())
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(std::iter::empty())
        }

        fn close(&mut self) {}
    }

    /// Dumps the raw bytes of the last frame to disk on close.
    struct RawFrameWriter {
        path: Option<PathBuf>,
        last: Option<Frame>,
    }

    impl RawFrameWriter {
        fn new() -> Self {
            Self {
                path: None,
                last: None,
            }
        }
    }

    impl VideoWriter for RawFrameWriter {
        fn open(
            &mut self,
            path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.path = Some(path.to_path_buf());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.last = Some(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            if let Some(path) = self.path.take() {
                let bytes = self.last.take().map(|f| f.data().to_vec());
                std::fs::write(path, bytes.unwrap_or_default())?;
            }
            Ok(())
        }
    }

    /// Copies the mask to the output, recording what it saw.
    struct RecordingInpainter {
        calls: Arc<Mutex<Vec<(PathBuf, PathBuf, Vec<u8>)>>>,
        gate: Option<Arc<Barrier>>,
        fail: Option<String>,
    }

    impl RecordingInpainter {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                gate: None,
                fail: None,
            }
        }
    }

    impl Inpainter for RecordingInpainter {
        fn inpaint(&self, request: &InpaintRequest<'_>) -> Result<(), Box<dyn std::error::Error>> {
            if let Some(gate) = &self.gate {
                gate.wait();
            }
            if let Some(message) = &self.fail {
                return Err(message.clone().into());
            }
            let mask_bytes = std::fs::read(request.mask)?;
            std::fs::write(request.output, &mask_bytes)?;
            self.calls.lock().unwrap().push((
                request.video.to_path_buf(),
                request.mask.to_path_buf(),
                mask_bytes,
            ));
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Shares recorded events with the test.
    struct SharedLogger {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for SharedLogger {
        fn progress(&mut self, _current: usize, _total: usize) {}

        fn timing(&mut self, stage: &str, _duration_ms: f64) {
            self.events.lock().unwrap().push(format!("timing:{stage}"));
        }

        fn metric(&mut self, name: &str, _value: f64) {
            self.events.lock().unwrap().push(format!("metric:{name}"));
        }

        fn info(&mut self, _message: &str) {
            self.events.lock().unwrap().push("info".to_string());
        }

        fn summary(&self) {
            self.events.lock().unwrap().push("summary".to_string());
        }
    }

    // --- Helpers ---

    fn metadata(width: u32, height: u32, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width,
            height,
            fps: 30.0,
            total_frames,
            codec: "h264".to_string(),
            source_path: None,
        }
    }

    fn synthesizer(location: MaskLocation, meta: VideoMetadata) -> SynthesizeMaskUseCase {
        SynthesizeMaskUseCase::new(
            Box::new(StubReader { metadata: meta }),
            Box::new(RawFrameWriter::new()),
            location,
            None,
        )
    }

    fn use_case(
        dir: &Path,
        meta: VideoMetadata,
        inpainter: RecordingInpainter,
    ) -> InpaintVideoUseCase {
        let location = MaskLocation::per_request_in(dir);
        InpaintVideoUseCase::new(
            synthesizer(location, meta),
            Box::new(inpainter),
            Box::new(NullPipelineLogger),
            None,
        )
    }

    fn run(
        uc: &mut InpaintVideoUseCase,
        region: Region,
        output: &Path,
    ) -> Result<InpaintOutcome, InpaintError> {
        uc.execute(Path::new("in.mp4"), &region, output)
    }

    // --- Tests ---

    #[test]
    fn test_inpainter_receives_finished_mask() {
        let dir = tempfile::tempdir().unwrap();
        let inpainter = RecordingInpainter::new();
        let calls = inpainter.calls.clone();
        let region = Region::new(2, 2, 4, 3);
        let output = dir.path().join("out.bin");
        let mut uc = use_case(dir.path(), metadata(16, 8, 3), inpainter);

        let outcome = run(&mut uc, region, &output).unwrap();

        assert_eq!(outcome.output, output);
        assert!(outcome.kept_mask.is_none());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (video, mask_path, mask_bytes) = &calls[0];
        assert_eq!(video, Path::new("in.mp4"));
        let expected = mask_rasterizer::rasterize(16, 8, &region);
        assert_eq!(mask_bytes, expected.data());
        // Per-request masks are removed once the request is done.
        assert!(!mask_path.exists());
    }

    #[test]
    fn test_keep_mask_leaves_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let inpainter = RecordingInpainter::new();
        let meta = metadata(16, 8, 1);
        let mut uc = use_case(dir.path(), meta, inpainter).keep_mask(true);
        let output = dir.path().join("o");

        let outcome = run(&mut uc, Region::new(0, 0, 2, 2), &output).unwrap();

        let kept = outcome.kept_mask.unwrap();
        assert!(kept.exists());
        assert!(kept.starts_with(dir.path()));
    }

    #[test]
    fn test_logger_sees_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let location = MaskLocation::per_request_in(dir.path());
        let mut uc = InpaintVideoUseCase::new(
            synthesizer(location, metadata(16, 8, 2)),
            Box::new(RecordingInpainter::new()),
            Box::new(SharedLogger {
                events: events.clone(),
            }),
            None,
        );

        let output = dir.path().join("o");
        run(&mut uc, Region::new(0, 0, 2, 2), &output).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "metric:mask_pixels",
                "timing:synthesize",
                "info",
                "timing:inpaint",
                "summary",
            ]
        );
    }

    #[test]
    fn test_inpainter_failure_passes_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut inpainter = RecordingInpainter::new();
        inpainter.fail = Some("CUDA out of memory".to_string());
        let mut uc = use_case(dir.path(), metadata(16, 8, 2), inpainter);

        let output = dir.path().join("o");
        let err = run(&mut uc, Region::default(), &output).unwrap_err();

        match err {
            InpaintError::Collaborator(source) => {
                assert_eq!(source.to_string(), "CUDA out of memory");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_synthesis_failure_skips_inpainter() {
        let dir = tempfile::tempdir().unwrap();
        let inpainter = RecordingInpainter::new();
        let calls = inpainter.calls.clone();
        let mut uc = use_case(dir.path(), metadata(0, 8, 2), inpainter);

        let output = dir.path().join("o");
        let err = run(&mut uc, Region::default(), &output).unwrap_err();

        assert!(matches!(err, InpaintError::Metadata { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_request_does_not_reach_inpainter() {
        let dir = tempfile::tempdir().unwrap();
        let cancelled = Arc::new(AtomicBool::new(true));
        let inpainter = RecordingInpainter::new();
        let calls = inpainter.calls.clone();
        let synth = SynthesizeMaskUseCase::new(
            Box::new(StubReader {
                metadata: metadata(16, 8, 0),
            }),
            Box::new(RawFrameWriter::new()),
            MaskLocation::per_request_in(dir.path()),
            Some(cancelled.clone()),
        );
        let mut uc = InpaintVideoUseCase::new(
            synth,
            Box::new(inpainter),
            Box::new(NullPipelineLogger),
            Some(cancelled),
        );

        let output = dir.path().join("o");
        let err = run(&mut uc, Region::default(), &output).unwrap_err();

        assert!(matches!(err, InpaintError::Cancelled));
        assert!(calls.lock().unwrap().is_empty());
    }

    // --- Concurrent requests ---

    /// Runs two requests with different regions in parallel. Both finish
    /// synthesis before either inpainter reads its mask.
    fn run_concurrent(location: MaskLocation, dir: &Path) -> Vec<(Region, Vec<u8>)> {
        let gate = Arc::new(Barrier::new(2));
        let regions = [Region::new(0, 0, 4, 4), Region::new(8, 2, 6, 5)];

        let handles: Vec<_> = regions
            .iter()
            .enumerate()
            .map(|(i, &region)| {
                let location = location.clone();
                let gate = gate.clone();
                let output = dir.join(format!("out_{i}.bin"));
                std::thread::spawn(move || {
                    let mut inpainter = RecordingInpainter::new();
                    inpainter.gate = Some(gate);
                    let mut uc = InpaintVideoUseCase::new(
                        synthesizer(location, metadata(16, 8, 2)),
                        Box::new(inpainter),
                        Box::new(NullPipelineLogger),
                        None,
                    );
                    run(&mut uc, region, &output).unwrap();
                    (region, std::fs::read(&output).unwrap())
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    fn matches_own_region(region: &Region, bytes: &[u8]) -> bool {
        bytes == mask_rasterizer::rasterize(16, 8, region).data()
    }

    #[test]
    fn test_per_request_masks_keep_concurrent_requests_apart() {
        let dir = tempfile::tempdir().unwrap();
        let location = MaskLocation::per_request_in(dir.path());
        let results = run_concurrent(location, dir.path());

        for (region, bytes) in &results {
            assert!(matches_own_region(region, bytes), "{region}");
        }
    }

    #[test]
    fn test_fixed_mask_path_lets_concurrent_requests_collide() {
        let dir = tempfile::tempdir().unwrap();
        let fixed = MaskLocation::Fixed(dir.path().join("internal_mask.avi"));
        let results = run_concurrent(fixed, dir.path());

        // Both inpainters read the one shared file, so one request got the
        // other's mask.
        assert_eq!(results[0].1, results[1].1);
        let mismatched = results
            .iter()
            .filter(|(region, bytes)| !matches_own_region(region, bytes))
            .count();
        assert_eq!(mismatched, 1);
    }

    // --- ffmpeg-backed ---

    #[test]
    fn test_mask_preview_end_to_end() {
        use crate::inpainting::infrastructure::mask_preview_inpainter::MaskPreviewInpainter;
        use crate::video::domain::video_codec::VideoCodec;
        use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
        use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        let mut writer = FfmpegWriter::with_codec(VideoCodec::Mpeg4);
        writer.open(&source, &metadata(96, 64, 6)).unwrap();
        for _ in 0..6 {
            writer.write(&Frame::filled(96, 64, [200, 40, 40])).unwrap();
        }
        writer.close().unwrap();

        let region = Region::new(10, 20, 30, 16);
        let output = dir.path().join("erased.avi");
        let synth = SynthesizeMaskUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            MaskLocation::per_request_in(dir.path()),
            None,
        );
        let mut uc = InpaintVideoUseCase::new(
            synth,
            Box::new(MaskPreviewInpainter::new()),
            Box::new(NullPipelineLogger),
            None,
        );
        uc.execute(&source, &region, &output).unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&output).unwrap();
        assert_eq!((meta.width, meta.height), (96, 64));
        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 6);
        let expected = mask_rasterizer::rasterize(96, 64, &region);
        assert!(frames.iter().all(|f| f.data() == expected.data()));
    }
}
