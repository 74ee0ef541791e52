use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detection::domain::line_detector::LineDetector;
use crate::shared::constants::{
    HOUGH_MAX_LINE_GAP, HOUGH_MIN_LINE_LENGTH, HOUGH_RHO, HOUGH_THETA_DEGREES,
    HOUGH_VOTE_THRESHOLD,
};
use crate::shared::line_segment::LineSegment;

/// Fixed-point precision used while walking along a candidate line.
const WALK_SHIFT: u32 = 16;

const DEFAULT_SEED: u64 = 0x5eed_1e55;

/// Parameters of the progressive probabilistic Hough transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoughParams {
    /// Distance resolution of the accumulator, in pixels.
    pub rho: f64,
    /// Angle resolution of the accumulator, in radians.
    pub theta: f64,
    /// Minimum accumulator votes before a line is traced.
    pub threshold: u32,
    /// Segments shorter than this along both axes are discarded.
    pub min_line_length: u32,
    /// Largest run of missing edge pixels bridged inside one segment.
    pub max_line_gap: u32,
    /// Stop after this many segments.
    pub max_lines: usize,
    /// Seed for the point visiting order.
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: HOUGH_RHO,
            theta: HOUGH_THETA_DEGREES.to_radians(),
            threshold: HOUGH_VOTE_THRESHOLD,
            min_line_length: HOUGH_MIN_LINE_LENGTH,
            max_line_gap: HOUGH_MAX_LINE_GAP,
            max_lines: usize::MAX,
            seed: DEFAULT_SEED,
        }
    }
}

/// Progressive probabilistic Hough line detector.
///
/// Edge points are visited in a seeded pseudo-random order. Each point votes
/// into a (theta, rho) accumulator; as soon as a bin reaches the threshold the
/// line through the current point is traced in both directions over the edge
/// mask, bridging gaps up to `max_line_gap`. Pixels of a traced line are
/// removed from the mask, and for accepted segments the votes they already
/// cast are withdrawn, so each edge pixel contributes to at most one segment.
pub struct ProbabilisticHough {
    params: HoughParams,
}

impl ProbabilisticHough {
    pub fn new(params: HoughParams) -> Self {
        Self { params }
    }
}

impl Default for ProbabilisticHough {
    fn default() -> Self {
        Self::new(HoughParams::default())
    }
}

impl LineDetector for ProbabilisticHough {
    fn detect_lines(&self, edges: &GrayImage) -> Vec<LineSegment> {
        let (w, h) = edges.dimensions();
        if w == 0 || h == 0 || self.params.max_lines == 0 {
            return Vec::new();
        }
        let mut state = HoughState::new(edges, &self.params);
        state.run()
    }
}

struct HoughState<'a> {
    params: &'a HoughParams,
    width: i64,
    height: i64,
    num_rho: usize,
    /// `(cos, sin)` of each accumulator angle, pre-divided by rho.
    trig: Vec<(f64, f64)>,
    accum: Vec<i32>,
    mask: Vec<bool>,
    voted: Vec<bool>,
    points: Vec<(i64, i64)>,
}

impl<'a> HoughState<'a> {
    fn new(edges: &GrayImage, params: &'a HoughParams) -> Self {
        let (w, h) = edges.dimensions();
        let num_angle = ((std::f64::consts::PI / params.theta).round() as usize).max(1);
        let num_rho = (((w + h) as f64 * 2.0 + 1.0) / params.rho).round() as usize;
        let inv_rho = 1.0 / params.rho;
        let trig = (0..num_angle)
            .map(|n| {
                let angle = n as f64 * params.theta;
                (angle.cos() * inv_rho, angle.sin() * inv_rho)
            })
            .collect();

        let mut mask = vec![false; (w as usize) * (h as usize)];
        let mut points = Vec::new();
        for (x, y, px) in edges.enumerate_pixels() {
            if px[0] != 0 {
                mask[(y * w + x) as usize] = true;
                points.push((x as i64, y as i64));
            }
        }

        Self {
            params,
            width: w as i64,
            height: h as i64,
            num_rho,
            trig,
            accum: vec![0; num_angle * num_rho],
            voted: vec![false; mask.len()],
            mask,
            points,
        }
    }

    fn run(&mut self) -> Vec<LineSegment> {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut lines = Vec::new();
        let threshold = self.params.threshold as i32;

        let mut remaining = self.points.len();
        while remaining > 0 {
            let idx = rng.gen_range(0..remaining);
            let (x, y) = self.points[idx];
            self.points.swap(idx, remaining - 1);
            remaining -= 1;

            let off = self.offset(x, y);
            if !self.mask[off] {
                continue;
            }

            let (max_votes, best_angle) = self.vote(x, y, 1);
            self.voted[off] = true;
            if max_votes < threshold {
                continue;
            }

            let walk = self.walk_setup(x, y, best_angle);
            let ends = [self.trace(&walk, false), self.trace(&walk, true)];
            let min_len = self.params.min_line_length as i64;
            let good_line = (ends[1].0 - ends[0].0).abs() >= min_len
                || (ends[1].1 - ends[0].1).abs() >= min_len;

            self.clear(&walk, false, ends[0], good_line);
            self.clear(&walk, true, ends[1], good_line);

            if good_line {
                lines.push(LineSegment::new(
                    ends[0].0 as i32,
                    ends[0].1 as i32,
                    ends[1].0 as i32,
                    ends[1].1 as i32,
                ));
                if lines.len() >= self.params.max_lines {
                    break;
                }
            }
        }

        log::trace!("hough: {} segment(s) from {} edge point(s)", lines.len(), self.points.len());
        lines
    }

    fn offset(&self, x: i64, y: i64) -> usize {
        (y * self.width + x) as usize
    }

    fn rho_bin(&self, x: i64, y: i64, n: usize) -> usize {
        let (c, s) = self.trig[n];
        let r = (x as f64 * c + y as f64 * s).round() as i64;
        (r + (self.num_rho as i64 - 1) / 2) as usize
    }

    /// Adds `delta` votes for every angle through `(x, y)` and returns the
    /// strongest bin as `(votes, angle_index)`, first angle winning ties.
    fn vote(&mut self, x: i64, y: i64, delta: i32) -> (i32, usize) {
        let mut max_votes = self.params.threshold as i32 - 1;
        let mut best = 0;
        for n in 0..self.trig.len() {
            let bin = n * self.num_rho + self.rho_bin(x, y, n);
            self.accum[bin] += delta;
            if self.accum[bin] > max_votes {
                max_votes = self.accum[bin];
                best = n;
            }
        }
        (max_votes, best)
    }

    fn walk_setup(&self, x: i64, y: i64, angle_index: usize) -> Walk {
        let (c, s) = self.trig[angle_index];
        let a = -s;
        let b = c;
        let one = 1i64 << WALK_SHIFT;
        let half = 1i64 << (WALK_SHIFT - 1);
        if a.abs() > b.abs() {
            Walk {
                x_major: true,
                x0: x,
                y0: (y << WALK_SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one as f64 / a.abs()).round() as i64,
            }
        } else {
            Walk {
                x_major: false,
                x0: (x << WALK_SHIFT) + half,
                y0: y,
                dx: (a * one as f64 / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
            }
        }
    }

    /// Follows the line from the seed until the border or a gap longer than
    /// `max_line_gap`; returns the last edge pixel seen.
    fn trace(&self, walk: &Walk, reverse: bool) -> (i64, i64) {
        let max_gap = self.params.max_line_gap as i64;
        let mut end = walk.pixel(walk.x0, walk.y0);
        let mut gap = 0i64;
        for (px, py) in walk.steps(reverse) {
            if !self.in_bounds(px, py) {
                break;
            }
            if self.mask[self.offset(px, py)] {
                gap = 0;
                end = (px, py);
            } else {
                gap += 1;
                if gap > max_gap {
                    break;
                }
            }
        }
        end
    }

    /// Removes the traced pixels up to `end` from the mask; for accepted
    /// lines their accumulator votes are withdrawn too.
    fn clear(&mut self, walk: &Walk, reverse: bool, end: (i64, i64), withdraw_votes: bool) {
        for (px, py) in walk.steps(reverse) {
            if !self.in_bounds(px, py) {
                break;
            }
            let off = self.offset(px, py);
            if self.mask[off] {
                if withdraw_votes && self.voted[off] {
                    self.vote(px, py, -1);
                }
                self.mask[off] = false;
            }
            if (px, py) == end {
                break;
            }
        }
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }
}

/// Fixed-point line walk: the major axis advances by one pixel per step, the
/// minor axis by a `WALK_SHIFT` fraction.
struct Walk {
    x_major: bool,
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
}

impl Walk {
    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.x_major {
            (x, y >> WALK_SHIFT)
        } else {
            (x >> WALK_SHIFT, y)
        }
    }

    /// Pixels starting at the seed itself, unbounded.
    fn steps(&self, reverse: bool) -> impl Iterator<Item = (i64, i64)> + '_ {
        let (dx, dy) = if reverse {
            (-self.dx, -self.dy)
        } else {
            (self.dx, self.dy)
        };
        (0i64..).map(move |k| self.pixel(self.x0 + k * dx, self.y0 + k * dy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::new(width, height)
    }

    fn draw(img: &mut GrayImage, points: impl IntoIterator<Item = (u32, u32)>) {
        for (x, y) in points {
            img.put_pixel(x, y, Luma([255]));
        }
    }

    #[test]
    fn test_empty_edge_map_yields_nothing() {
        assert!(ProbabilisticHough::default()
            .detect_lines(&blank(100, 100))
            .is_empty());
    }

    #[test]
    fn test_zero_sized_image_yields_nothing() {
        assert!(ProbabilisticHough::default()
            .detect_lines(&blank(0, 0))
            .is_empty());
    }

    #[test]
    fn test_detects_horizontal_line() {
        let mut img = blank(200, 100);
        draw(&mut img, (20..180).map(|x| (x, 50)));
        let lines = ProbabilisticHough::default().detect_lines(&img);
        assert_eq!(lines.len(), 1);
        let l = lines[0];
        assert_eq!(l.y1, 50);
        assert_eq!(l.y2, 50);
        assert_eq!((l.x1.min(l.x2), l.x1.max(l.x2)), (20, 179));
    }

    #[test]
    fn test_detects_vertical_line() {
        let mut img = blank(100, 200);
        draw(&mut img, (10..190).map(|y| (30, y)));
        let lines = ProbabilisticHough::default().detect_lines(&img);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].x1, 30);
        assert_eq!(lines[0].x2, 30);
        assert!((lines[0].y1 - lines[0].y2).abs() >= 170);
    }

    #[test]
    fn test_detects_diagonal_line() {
        let mut img = blank(200, 200);
        draw(&mut img, (10..190).map(|i| (i, i)));
        let lines = ProbabilisticHough::default().detect_lines(&img);
        assert!(!lines.is_empty());
        let longest = lines
            .iter()
            .max_by(|a, b| a.length().total_cmp(&b.length()))
            .copied()
            .unwrap();
        assert!((longest.angle_from_horizontal() - 45.0).abs() <= 1.0);
        assert!(longest.length() > 150.0);
    }

    #[test]
    fn test_short_segment_is_rejected() {
        let mut img = blank(200, 200);
        // Plenty of votes for the bin but only 40 px long.
        draw(&mut img, (0..40).map(|x| (x + 50, 100)));
        let params = HoughParams {
            threshold: 20,
            ..HoughParams::default()
        };
        assert!(ProbabilisticHough::new(params).detect_lines(&img).is_empty());
    }

    #[test]
    fn test_below_vote_threshold_is_ignored() {
        let mut img = blank(200, 200);
        draw(&mut img, (0..70).map(|x| (x + 50, 100)));
        assert!(ProbabilisticHough::default().detect_lines(&img).is_empty());
    }

    #[test]
    fn test_small_gap_is_bridged() {
        let mut img = blank(200, 60);
        draw(&mut img, (10..90).map(|x| (x, 30)));
        draw(&mut img, (95..190).map(|x| (x, 30)));
        let lines = ProbabilisticHough::default().detect_lines(&img);
        assert_eq!(lines.len(), 1);
        let l = lines[0];
        assert_eq!((l.x1.min(l.x2), l.x1.max(l.x2)), (10, 189));
    }

    #[test]
    fn test_large_gap_splits_segments() {
        let mut img = blank(300, 60);
        draw(&mut img, (0..100).map(|x| (x, 30)));
        draw(&mut img, (150..250).map(|x| (x, 30)));
        let params = HoughParams {
            threshold: 50,
            ..HoughParams::default()
        };
        let lines = ProbabilisticHough::new(params).detect_lines(&img);
        assert_eq!(lines.len(), 2);
        for l in &lines {
            assert!((l.x1 - l.x2).abs() >= 90);
        }
    }

    #[test]
    fn test_is_deterministic() {
        let mut img = blank(160, 160);
        draw(&mut img, (0..150).map(|i| (i, i)));
        draw(&mut img, (0..150).map(|i| (i, 80)));
        draw(&mut img, (0..150).map(|i| (120, i)));
        let detector = ProbabilisticHough::default();
        assert_eq!(detector.detect_lines(&img), detector.detect_lines(&img));
    }

    #[test]
    fn test_max_lines_caps_output() {
        let mut img = blank(200, 200);
        draw(&mut img, (0..200).map(|x| (x, 40)));
        draw(&mut img, (0..200).map(|x| (x, 160)));
        let params = HoughParams {
            max_lines: 1,
            ..HoughParams::default()
        };
        assert_eq!(ProbabilisticHough::new(params).detect_lines(&img).len(), 1);
    }
}
