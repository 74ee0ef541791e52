use ndarray::{ArrayView3, ArrayViewMut3};

/// Number of interleaved channels in a BGR frame.
pub const BGR_CHANNELS: u8 = 3;

/// A single video/image frame: contiguous BGR bytes in row-major order.
///
/// Format conversion (RGB, YUV) happens at I/O boundaries only; the
/// filtering and detection layers always see blue, green, red.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Builds a BGR frame from tightly packed RGB bytes, swapping red and blue.
    pub fn from_rgb(mut rgb: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        swap_red_blue(&mut rgb);
        Self::new(rgb, width, height, BGR_CHANNELS, index)
    }

    /// Returns the pixel data as tightly packed RGB bytes.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = self.data.clone();
        if self.channels == BGR_CHANNELS {
            swap_red_blue(&mut rgb);
        }
        rgb
    }

    /// A frame of the given size filled with a single BGR colour.
    pub fn filled(width: u32, height: u32, bgr: [u8; 3], index: usize) -> Self {
        let data = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, BGR_CHANNELS, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Same dimensions and channel layout as `other`.
    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * self.channels as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Writes a BGR pixel, ignoring coordinates outside the frame.
    pub fn put_pixel(&mut self, x: i64, y: i64, bgr: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * self.channels as usize;
        self.data[i..i + 3].copy_from_slice(&bgr);
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::filled(2, 2, [100, 100, 100], 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_from_rgb_swaps_to_bgr() {
        let frame = Frame::from_rgb(vec![10, 20, 30, 40, 50, 60], 2, 1, 0);
        assert_eq!(frame.pixel(0, 0), [30, 20, 10]);
        assert_eq!(frame.pixel(1, 0), [60, 50, 40]);
        assert_eq!(frame.to_rgb(), vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_filled_sets_every_pixel() {
        let frame = Frame::filled(3, 2, [1, 2, 3], 7);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.pixel(2, 1), [1, 2, 3]);
        assert_eq!(frame.index(), 7);
    }

    #[test]
    fn test_put_pixel_clips_outside() {
        let mut frame = Frame::filled(2, 2, [0, 0, 0], 0);
        frame.put_pixel(-1, 0, [255, 255, 255]);
        frame.put_pixel(0, 2, [255, 255, 255]);
        frame.put_pixel(1, 1, [9, 8, 7]);
        assert_eq!(frame.pixel(1, 1), [9, 8, 7]);
        assert_eq!(frame.data().iter().filter(|&&v| v != 0).count(), 3);
    }

    #[test]
    fn test_same_shape() {
        let a = Frame::filled(4, 3, [0, 0, 0], 0);
        let b = Frame::filled(4, 3, [9, 9, 9], 1);
        let c = Frame::filled(3, 4, [0, 0, 0], 0);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::filled(2, 2, [0, 0, 0], 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128; // row=0, col=1, R channel
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }
}
