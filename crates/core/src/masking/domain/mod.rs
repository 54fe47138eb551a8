pub mod mask_location;
pub mod mask_rasterizer;
pub mod mask_video;
