pub mod annotate_image_use_case;
pub mod annotate_video_use_case;
pub mod frame_annotator;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
