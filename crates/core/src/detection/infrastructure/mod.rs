pub mod canny_edge_detector;
pub mod probabilistic_hough;
