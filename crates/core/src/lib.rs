pub mod inpainting;
pub mod masking;
pub mod pipeline;
pub mod shared;
pub mod video;
