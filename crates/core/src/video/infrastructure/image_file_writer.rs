use std::path::Path;

use crate::shared::frame::{Frame, BGR_CHANNELS};
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single BGR frame to an image file using the `image` crate.
///
/// The output format follows the file extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != BGR_CHANNELS {
            return Err(format!(
                "cannot save a {}-channel frame as an image",
                frame.channels()
            )
            .into());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.to_rgb())
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}
