mod disk;

pub use disk::{FrameWriter, LATEST_LINK};

use crate::error::Result;
use image::RgbImage;
use std::path::PathBuf;

/// Trait for destinations of labelled frames
pub trait FrameSink {
    /// Persist a frame under `filename` and return where it landed
    fn write_frame(&mut self, frame: &RgbImage, filename: &str) -> Result<PathBuf>;
}
