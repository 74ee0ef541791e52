pub mod angle_filter;
pub mod edge_detector;
pub mod line_detector;
