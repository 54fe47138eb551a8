pub mod command_inpainter;
pub mod mask_preview_inpainter;
