use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Everything an inpainter needs for one request.
pub struct InpaintRequest<'a> {
    pub video: &'a Path,
    /// White pixels mark content to synthesize, black pixels content to keep.
    pub mask: &'a Path,
    pub output: &'a Path,
    /// Set when the caller abandons the request.
    pub cancelled: &'a AtomicBool,
}

/// External video-inpainting capability.
///
/// Contract: `video` and `mask` share width, height and frame count. The
/// file written to `output` has the same geometry and length, and pixels
/// outside the white mask area equal the source pixels. Callers rely on
/// this but do not verify it.
pub trait Inpainter: Send {
    fn inpaint(&self, request: &InpaintRequest<'_>) -> Result<(), Box<dyn std::error::Error>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}
