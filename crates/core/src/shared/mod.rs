pub mod constants;
pub mod frame;
pub mod line_segment;
pub mod settings;
pub mod settings_watcher;
pub mod video_metadata;
