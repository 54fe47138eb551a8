/// Mask color for pixels the inpainting model must keep.
pub const MASK_PRESERVE_COLOR: [u8; 3] = [0, 0, 0];

/// Mask color for pixels the inpainting model must synthesize.
pub const MASK_REMOVE_COLOR: [u8; 3] = [255, 255, 255];

pub const MASK_FILE_PREFIX: &str = "mask_";

/// Container for per-request masks; carries the default lossless codec.
pub const DEFAULT_MASK_EXTENSION: &str = "avi";

/// Mask frames between progress reports.
pub const PROGRESS_THROTTLE_FRAMES: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];
