use super::palette::Palette;
use super::Stitcher;
use crate::error::{Error, Result};
use gif::{Encoder, Frame, Repeat};
use image::RgbImage;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Animated GIF with a fixed global palette and no inter-frame delay.
pub struct GifStitcher {
    palette: Palette,
}

impl GifStitcher {
    pub fn new() -> Self {
        Self {
            palette: Palette::plan9(),
        }
    }

    /// Screen size shared by every frame.
    fn screen(frames: &[RgbImage]) -> Result<(u16, u16)> {
        let first = frames
            .first()
            .ok_or_else(|| Error::encode("gif needs at least one frame"))?;
        let (width, height) = first.dimensions();
        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != (width, height))
        {
            return Err(Error::DimensionMismatch {
                index,
                width: frame.width(),
                height: frame.height(),
                expected_width: width,
                expected_height: height,
            });
        }

        let width = u16::try_from(width)
            .map_err(|_| Error::encode(format!("gif width {width} exceeds {}", u16::MAX)))?;
        let height = u16::try_from(height)
            .map_err(|_| Error::encode(format!("gif height {height} exceeds {}", u16::MAX)))?;
        Ok((width, height))
    }
}

impl Default for GifStitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Stitcher for GifStitcher {
    fn stitch(&self, frames: &[RgbImage], output: &Path) -> Result<()> {
        let (width, height) = Self::screen(frames)?;

        let file = File::create(output)
            .map_err(|e| Error::io(format!("failed to create {}", output.display()), e))?;

        let mut encoder = Encoder::new(
            BufWriter::new(&file),
            width,
            height,
            &self.palette.to_rgb_table(),
        )
        .map_err(Error::encode)?;
        if frames.len() > 1 {
            encoder.set_repeat(Repeat::Infinite).map_err(Error::encode)?;
        }

        for (i, image) in frames.iter().enumerate() {
            let frame = Frame {
                width,
                height,
                delay: 0,
                buffer: Cow::Owned(self.palette.index_frame(image)),
                ..Frame::default()
            };
            encoder.write_frame(&frame).map_err(Error::encode)?;
            tracing::debug!("Appended gif frame {}", i);
        }

        encoder
            .into_inner()
            .map_err(|e| Error::io(format!("failed to finish {}", output.display()), e))?
            .into_inner()
            .map_err(|e| {
                Error::io(
                    format!("failed to flush {}", output.display()),
                    e.into_error(),
                )
            })?;
        file.sync_all()
            .map_err(|e| Error::io(format!("failed to sync {}", output.display()), e))?;

        Ok(())
    }
}
