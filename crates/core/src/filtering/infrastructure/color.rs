//! Colour-space conversions between BGR frames, grayscale and CIE L*a*b*.

use image::{GrayImage, Luma};
use ndarray::Array3;

use crate::shared::frame::Frame;

// ITU-R BT.601 luma weights in 14-bit fixed point.
const GRAY_R: u32 = 4899;
const GRAY_G: u32 = 9617;
const GRAY_B: u32 = 1868;
const GRAY_SHIFT: u32 = 14;

// sRGB (D65) → XYZ, rows X, Y, Z; columns R, G, B.
const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412_453, 0.357_580, 0.180_423],
    [0.212_671, 0.715_160, 0.072_169],
    [0.019_334, 0.119_193, 0.950_227],
];

const XYZ_TO_RGB: [[f32; 3]; 3] = [
    [3.240_479, -1.537_150, -0.498_535],
    [-0.969_256, 1.875_991, 0.041_556],
    [0.055_648, -0.204_043, 1.057_311],
];

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const LAB_EPSILON: f32 = 0.008_856;
const LAB_KAPPA: f32 = 903.3;

/// Single-channel luma of a BGR frame: `0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn bgr_to_gray(frame: &Frame) -> GrayImage {
    let view = frame.as_ndarray();
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let (y, x) = (y as usize, x as usize);
        let (b, g, r) = (
            view[[y, x, 0]] as u32,
            view[[y, x, 1]] as u32,
            view[[y, x, 2]] as u32,
        );
        let luma = (r * GRAY_R + g * GRAY_G + b * GRAY_B + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT;
        Luma([luma.min(255) as u8])
    })
}

/// Converts a BGR frame to floating-point L*a*b* laid out as (height, width, [L, a, b]).
///
/// L lies in [0, 100]; a and b are roughly in [-128, 127].
pub fn bgr_to_lab(frame: &Frame) -> Array3<f32> {
    let view = frame.as_ndarray();
    let (h, w) = (frame.height() as usize, frame.width() as usize);
    let mut lab = Array3::<f32>::zeros((h, w, 3));
    for y in 0..h {
        for x in 0..w {
            let rgb = [
                srgb_to_linear(view[[y, x, 2]] as f32 / 255.0),
                srgb_to_linear(view[[y, x, 1]] as f32 / 255.0),
                srgb_to_linear(view[[y, x, 0]] as f32 / 255.0),
            ];
            let [l, a, b] = linear_rgb_to_lab(rgb);
            lab[[y, x, 0]] = l;
            lab[[y, x, 1]] = a;
            lab[[y, x, 2]] = b;
        }
    }
    lab
}

/// Writes an L*a*b* array back into `frame` as saturated 8-bit BGR.
pub fn lab_to_bgr_into(lab: &Array3<f32>, frame: &mut Frame) {
    let mut view = frame.as_ndarray_mut();
    let (h, w, _) = lab.dim();
    for y in 0..h {
        for x in 0..w {
            let rgb = lab_to_linear_rgb([lab[[y, x, 0]], lab[[y, x, 1]], lab[[y, x, 2]]]);
            view[[y, x, 2]] = to_u8(linear_to_srgb(rgb[0]));
            view[[y, x, 1]] = to_u8(linear_to_srgb(rgb[1]));
            view[[y, x, 0]] = to_u8(linear_to_srgb(rgb[2]));
        }
    }
}

fn linear_rgb_to_lab(rgb: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = mat_mul(&RGB_TO_XYZ, rgb);
    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y);
    let fz = lab_f(z / WHITE_Z);
    let l = if y > LAB_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        LAB_KAPPA * y
    };
    [l, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn lab_to_linear_rgb(lab: [f32; 3]) -> [f32; 3] {
    let [l, a, b] = lab;
    let y = if l > LAB_KAPPA * LAB_EPSILON {
        ((l + 16.0) / 116.0).powi(3)
    } else {
        l / LAB_KAPPA
    };
    let fy = if y > LAB_EPSILON {
        (l + 16.0) / 116.0
    } else {
        7.787 * y + 16.0 / 116.0
    };
    let x = lab_f_inv(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - b / 200.0) * WHITE_Z;
    mat_mul(&XYZ_TO_RGB, [x, y, z])
}

fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(f: f32) -> f32 {
    let cube = f * f * f;
    if cube > LAB_EPSILON {
        cube
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn mat_mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
