use std::fs;

use crate::inpainting::domain::inpainter::{InpaintRequest, Inpainter};

/// Stand-in inpainter that returns the mask itself as the result.
///
/// Lets the mask be inspected end to end before a real model is wired in.
pub struct MaskPreviewInpainter;

impl MaskPreviewInpainter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaskPreviewInpainter {
    fn default() -> Self {
        Self::new()
    }
}

impl Inpainter for MaskPreviewInpainter {
    fn inpaint(&self, request: &InpaintRequest<'_>) -> Result<(), Box<dyn std::error::Error>> {
        if request.mask == request.output {
            return Ok(());
        }
        fs::copy(request.mask, request.output)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "mask-preview"
    }
}
