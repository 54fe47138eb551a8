use std::path::PathBuf;

/// Geometry and timing of a video, read without decoding frames.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Checks that the geometry and frame rate can drive an encoder.
    ///
    /// `total_frames` may be zero; a zero-length video is still encodable.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid frame size {}x{}", self.width, self.height));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(format!("invalid frame rate {}", self.fps));
        }
        Ok(())
    }
}
