mod v4l_capture;

pub use v4l_capture::WebcamCapture;

use crate::error::Result;
use image::RgbImage;

/// Trait for devices that yield one still frame per request
pub trait CaptureSource {
    /// Capture a single frame
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Index of the underlying device, for diagnostics
    fn device_id(&self) -> u32;
}
