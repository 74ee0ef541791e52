use thiserror::Error;

use crate::shared::frame::{Frame, BGR_CHANNELS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("expected a 3-channel BGR frame, got {channels} channel(s)")]
    UnsupportedChannels { channels: u8 },
}

/// Domain interface for a whole-frame image filter.
///
/// Implementations modify the frame in-place (`&mut Frame`) and never change
/// its dimensions or channel layout.
pub trait FrameFilter: Send + Sync {
    fn apply(&self, frame: &mut Frame) -> Result<(), FilterError>;
}

/// Rejects frames that are not interleaved BGR.
pub fn ensure_bgr(frame: &Frame) -> Result<(), FilterError> {
    if frame.channels() != BGR_CHANNELS {
        return Err(FilterError::UnsupportedChannels {
            channels: frame.channels(),
        });
    }
    Ok(())
}
