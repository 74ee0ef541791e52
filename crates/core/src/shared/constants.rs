/// Side length of the square Gaussian blur kernel.
pub const BLUR_KERNEL_SIZE: usize = 11;

/// Allowed range of the blur standard deviation.
pub const MIN_BLUR_AMOUNT: f64 = 0.5;
pub const MAX_BLUR_AMOUNT: f64 = 3.5;

/// Detail enhancement smoothing parameters.
pub const ENHANCE_SIGMA_S: f32 = 12.0;
pub const ENHANCE_SIGMA_R: f32 = 0.15;

/// Canny hysteresis thresholds.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Probabilistic Hough parameters.
pub const HOUGH_RHO: f64 = 1.0;
pub const HOUGH_THETA_DEGREES: f64 = 1.0;
pub const HOUGH_VOTE_THRESHOLD: u32 = 80;
pub const HOUGH_MIN_LINE_LENGTH: u32 = 50;
pub const HOUGH_MAX_LINE_GAP: u32 = 10;

/// Segments closer to horizontal than this many degrees are dropped.
pub const ANGLE_THRESHOLD_DEGREES: f64 = 10.0;

/// Overlay colours, in BGR order.
pub const LINE_COLOR_BGR: [u8; 3] = [255, 255, 0];
pub const TEXT_COLOR_BGR: [u8; 3] = [255, 0, 0];
pub const LINE_THICKNESS: u32 = 2;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
