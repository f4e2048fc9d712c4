//! Combining a directory of stills into one animation file.

mod avi;
mod frames;
mod gif;
mod mjpeg;
mod palette;

pub use self::frames::{load_frames, SkippedFile};

use self::gif::GifStitcher;
use self::mjpeg::MjpegStitcher;

use crate::error::{Error, Result};
use image::RgbImage;
use std::path::Path;

/// Container geometry for formats that declare it up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Output formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchFormat {
    /// Each frame compressed separately as a JPEG.
    Mjpeg,
    /// Limited to 256 colours.
    Gif,
}

impl StitchFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        match ext.as_str() {
            "mjpeg" => Ok(Self::Mjpeg),
            "gif" => Ok(Self::Gif),
            _ => Err(Error::UnsupportedFormat(format!(".{ext}"))),
        }
    }
}

/// Trait for taking an ordered run of frames and writing one output file
pub trait Stitcher {
    /// Write `frames`, in the order given, to `output`
    fn stitch(&self, frames: &[RgbImage], output: &Path) -> Result<()>;
}

/// Stitcher chosen once from the output file name.
pub enum Backend {
    Mjpeg(MjpegStitcher),
    Gif(GifStitcher),
}

impl Backend {
    pub fn for_output(output: &Path, settings: VideoSettings) -> Result<Self> {
        let backend = match StitchFormat::from_path(output)? {
            StitchFormat::Mjpeg => Self::Mjpeg(MjpegStitcher::new(settings)),
            StitchFormat::Gif => Self::Gif(GifStitcher::new()),
        };
        Ok(backend)
    }

    pub fn format(&self) -> StitchFormat {
        match self {
            Self::Mjpeg(_) => StitchFormat::Mjpeg,
            Self::Gif(_) => StitchFormat::Gif,
        }
    }
}

impl Stitcher for Backend {
    fn stitch(&self, frames: &[RgbImage], output: &Path) -> Result<()> {
        let _span = tracing::debug_span!("stitch", format = ?self.format()).entered();
        match self {
            Self::Mjpeg(s) => s.stitch(frames, output),
            Self::Gif(s) => s.stitch(frames, output),
        }
    }
}
