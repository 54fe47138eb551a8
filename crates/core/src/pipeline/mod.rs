pub mod inpaint_video_use_case;
pub mod pipeline_logger;
pub mod synthesize_mask_use_case;
