use ndarray::{Array2, ArrayViewMut1, Axis, Zip};

use crate::filtering::domain::frame_filter::{ensure_bgr, FilterError, FrameFilter};
use crate::shared::constants::{ENHANCE_SIGMA_R, ENHANCE_SIGMA_S};
use crate::shared::frame::Frame;

use super::color;

/// Number of horizontal+vertical passes of the recursive filter.
const DEFAULT_ITERATIONS: usize = 3;

/// Gain applied to the detail layer (`L - base`).
pub const DEFAULT_DETAIL_GAIN: f32 = 3.0;

/// Scale applied to L* (0..100) before smoothing.
const L_SCALE: f32 = 1.0 / 255.0;

/// Edge-preserving detail enhancement on the lightness channel.
///
/// The frame is converted to L*a*b*; L* is split into a smooth base layer
/// (domain-transform recursive filter) and a detail layer. The detail layer
/// is amplified and recombined, then the frame is converted back to BGR.
/// Chroma (a*, b*) is left untouched.
pub struct DetailEnhancer {
    sigma_s: f32,
    sigma_r: f32,
    iterations: usize,
    detail_gain: f32,
}

impl DetailEnhancer {
    pub fn new(sigma_s: f32, sigma_r: f32) -> Self {
        Self {
            sigma_s,
            sigma_r,
            iterations: DEFAULT_ITERATIONS,
            detail_gain: DEFAULT_DETAIL_GAIN,
        }
    }

    pub fn with_detail_gain(mut self, gain: f32) -> Self {
        self.detail_gain = gain;
        self
    }
}

impl Default for DetailEnhancer {
    fn default() -> Self {
        Self::new(ENHANCE_SIGMA_S, ENHANCE_SIGMA_R)
    }
}

impl FrameFilter for DetailEnhancer {
    fn apply(&self, frame: &mut Frame) -> Result<(), FilterError> {
        ensure_bgr(frame)?;
        if frame.is_empty() {
            return Ok(());
        }

        let mut lab = color::bgr_to_lab(frame);
        let lightness: Array2<f32> = lab.index_axis(Axis(2), 0).mapv(|v| v * L_SCALE);
        let base = recursive_filter(&lightness, self.sigma_s, self.sigma_r, self.iterations);

        let gain = self.detail_gain;
        Zip::from(lab.index_axis_mut(Axis(2), 0))
            .and(&lightness)
            .and(&base)
            .for_each(|out, &l, &b| {
                *out = (b + gain * (l - b)) / L_SCALE;
            });

        color::lab_to_bgr_into(&lab, frame);
        Ok(())
    }
}

/// Domain-transform recursive edge-preserving smoothing of a single channel.
///
/// `sigma_s` is the spatial extent in pixels; `sigma_r` the range extent in
/// units of the channel values. Each iteration runs one horizontal and one
/// vertical causal/anti-causal pass with a shrinking spatial sigma.
pub fn recursive_filter(
    image: &Array2<f32>,
    sigma_s: f32,
    sigma_r: f32,
    iterations: usize,
) -> Array2<f32> {
    let (h, w) = image.dim();
    let ratio = sigma_s / sigma_r;

    // Domain-transform derivatives: 1 + ratio * |dI|, stored at the right/lower sample.
    let mut dh = Array2::<f32>::from_elem((h, w), 1.0);
    for y in 0..h {
        for x in 1..w {
            dh[[y, x]] = 1.0 + ratio * (image[[y, x]] - image[[y, x - 1]]).abs();
        }
    }
    let mut dv = Array2::<f32>::from_elem((h, w), 1.0);
    for y in 1..h {
        for x in 0..w {
            dv[[y, x]] = 1.0 + ratio * (image[[y, x]] - image[[y - 1, x]]).abs();
        }
    }

    let mut out = image.clone();
    let n = iterations.max(1) as i32;
    let denom = (4f32.powi(n) - 1.0).sqrt();
    for i in 0..n {
        let sigma_h = sigma_s * 3f32.sqrt() * 2f32.powi(n - (i + 1)) / denom;
        let a = (-(2f32.sqrt()) / sigma_h).exp();

        for (row, d) in out.axis_iter_mut(Axis(0)).zip(dh.axis_iter(Axis(0))) {
            smooth_line(row, &d.to_vec(), a);
        }
        for (col, d) in out.axis_iter_mut(Axis(1)).zip(dv.axis_iter(Axis(1))) {
            smooth_line(col, &d.to_vec(), a);
        }
    }
    out
}

/// One causal then one anti-causal first-order recursive pass, weights `a^d`.
fn smooth_line(mut line: ArrayViewMut1<'_, f32>, d: &[f32], a: f32) {
    let len = d.len();
    if len < 2 {
        return;
    }
    let weights: Vec<f32> = d.iter().map(|&di| a.powf(di)).collect();
    for x in 1..len {
        let prev = line[x - 1];
        line[x] += weights[x] * (prev - line[x]);
    }
    for x in (0..len - 1).rev() {
        let next = line[x + 1];
        line[x] += weights[x + 1] * (next - line[x]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step_frame(width: u32, height: u32) -> Frame {
        let mut frame = Frame::filled(width, height, [60, 60, 60], 0);
        for y in 0..height {
            for x in width / 2..width {
                frame.put_pixel(x as i64, y as i64, [180, 180, 180]);
            }
        }
        frame
    }

    #[test]
    fn test_recursive_filter_keeps_constant_image() {
        let img = Array2::<f32>::from_elem((8, 12), 0.4);
        let out = recursive_filter(&img, 12.0, 0.15, 3);
        for v in out.iter() {
            assert_relative_eq!(*v, 0.4, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_recursive_filter_smooths_noise() {
        let mut img = Array2::<f32>::from_elem((16, 16), 0.2);
        img[[8, 8]] = 0.25;
        let out = recursive_filter(&img, 12.0, 0.15, 3);
        assert!(out[[8, 8]] < 0.25);
        assert!(out[[8, 9]] > 0.2);
    }

    #[test]
    fn test_recursive_filter_preserves_strong_edge() {
        let mut img = Array2::<f32>::zeros((10, 20));
        for y in 0..10 {
            for x in 10..20 {
                img[[y, x]] = 1.0;
            }
        }
        let out = recursive_filter(&img, 12.0, 0.15, 3);
        assert!(out[[5, 9]] < 0.05);
        assert!(out[[5, 10]] > 0.95);
    }

    #[test]
    fn test_uniform_frame_is_nearly_unchanged() {
        let mut frame = Frame::filled(12, 9, [90, 140, 200], 0);
        DetailEnhancer::default().apply(&mut frame).unwrap();
        let px = frame.pixel(6, 4);
        for (got, want) in px.iter().zip([90u8, 140, 200]) {
            assert!((*got as i32 - want as i32).abs() <= 1, "{px:?}");
        }
    }

    #[test]
    fn test_enhancement_increases_local_contrast() {
        let mut frame = step_frame(24, 8);
        let mut ramp = Frame::filled(24, 8, [0, 0, 0], 0);
        for y in 0..8 {
            for x in 0..24 {
                let v = if x % 2 == 0 { 120 } else { 130 };
                ramp.put_pixel(x, y, [v, v, v]);
            }
        }
        let before = ramp.pixel(4, 4)[0] as i32 - ramp.pixel(5, 4)[0] as i32;
        DetailEnhancer::default().apply(&mut ramp).unwrap();
        let after = ramp.pixel(4, 4)[0] as i32 - ramp.pixel(5, 4)[0] as i32;
        assert!(after.abs() > before.abs(), "before {before}, after {after}");

        DetailEnhancer::default().apply(&mut frame).unwrap();
        assert!(frame.pixel(2, 4)[0] < frame.pixel(20, 4)[0]);
    }

    #[test]
    fn test_zero_gain_flattens_detail() {
        let mut frame = Frame::filled(16, 16, [100, 100, 100], 0);
        frame.put_pixel(8, 8, [110, 110, 110]);
        DetailEnhancer::default()
            .with_detail_gain(0.0)
            .apply(&mut frame)
            .unwrap();
        assert!(frame.pixel(8, 8)[0] < 110);
    }

    #[test]
    fn test_preserves_shape() {
        let mut frame = step_frame(13, 5);
        DetailEnhancer::default().apply(&mut frame).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (13, 5, 3));
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut frame = Frame::new(Vec::new(), 0, 0, 3, 0);
        assert!(DetailEnhancer::default().apply(&mut frame).is_ok());
    }
}
