/// A detected straight segment between two integer pixel endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Direction of the segment in degrees, in (-180, 180], image y axis down.
    pub fn raw_angle(&self) -> f64 {
        let dy = (self.y2 - self.y1) as f64;
        let dx = (self.x2 - self.x1) as f64;
        dy.atan2(dx).to_degrees()
    }

    /// Angle relative to horizontal, folded into [0, 90].
    pub fn angle_from_horizontal(&self) -> f64 {
        normalize_angle(self.raw_angle())
    }

    /// Integer midpoint, rounding toward negative infinity like floor division.
    pub fn midpoint(&self) -> (i32, i32) {
        (
            (self.x1 + self.x2).div_euclid(2),
            (self.y1 + self.y2).div_euclid(2),
        )
    }

    pub fn length(&self) -> f64 {
        let dx = (self.x2 - self.x1) as f64;
        let dy = (self.y2 - self.y1) as f64;
        dx.hypot(dy)
    }
}

/// Folds a direction in degrees into [0, 90] relative to horizontal.
///
/// Negative angles are shifted by 180; angles above 90 are reflected as
/// `180 - angle`.
pub fn normalize_angle(degrees: f64) -> f64 {
    let mut angle = degrees;
    if angle < 0.0 {
        angle += 180.0;
    }
    if angle > 90.0 {
        angle = 180.0 - angle;
    }
    angle
}

/// A segment that survived the angle filter, with its normalized angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AngledSegment {
    pub segment: LineSegment,
    pub angle: f64,
}

impl AngledSegment {
    /// Angle label with one decimal place, as drawn on the frame.
    pub fn label(&self) -> String {
        format!("{:.1}", self.angle)
    }
}
