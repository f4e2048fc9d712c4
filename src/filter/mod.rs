mod lightness;

pub use lightness::LightnessFilter;

use image::RgbImage;

/// Decides whether a decoded frame makes it into the stitched output.
pub trait FrameFilter {
    /// Returns `true` to keep the frame, `false` to drop it.
    fn accept(&mut self, frame: &RgbImage) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
