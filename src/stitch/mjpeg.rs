use super::avi::AviWriter;
use super::{Stitcher, VideoSettings};
use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Motion-JPEG in an AVI container; every frame is an independent JPEG.
pub struct MjpegStitcher {
    settings: VideoSettings,
}

impl MjpegStitcher {
    pub fn new(settings: VideoSettings) -> Self {
        Self { settings }
    }

    fn check_dimensions(&self, frames: &[RgbImage]) -> Result<()> {
        let expected = (self.settings.width, self.settings.height);
        match frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.dimensions() != expected)
        {
            Some((index, frame)) => Err(Error::DimensionMismatch {
                index,
                width: frame.width(),
                height: frame.height(),
                expected_width: expected.0,
                expected_height: expected.1,
            }),
            None => Ok(()),
        }
    }
}

impl Stitcher for MjpegStitcher {
    fn stitch(&self, frames: &[RgbImage], output: &Path) -> Result<()> {
        self.check_dimensions(frames)?;

        let file = File::create(output)
            .map_err(|e| Error::io(format!("failed to create {}", output.display()), e))?;

        let VideoSettings { width, height, fps } = self.settings;
        let mut writer =
            AviWriter::new(BufWriter::new(file), width, height, fps).map_err(Error::encode)?;

        let mut buf = Vec::new();
        for (i, frame) in frames.iter().enumerate() {
            buf.clear();
            frame
                .write_with_encoder(JpegEncoder::new(&mut buf))
                .map_err(|e| Error::encode(format!("frame {i}: {e}")))?;
            writer
                .add_frame(&buf)
                .map_err(|e| Error::encode(format!("frame {i}: {e}")))?;
            tracing::debug!("Appended frame {} ({} bytes)", writer.frame_count(), buf.len());
        }

        let file = writer
            .finish()
            .map_err(Error::encode)?
            .into_inner()
            .map_err(|e| Error::encode(e.into_error()))?;
        file.sync_all()
            .map_err(|e| Error::io(format!("failed to sync {}", output.display()), e))?;

        Ok(())
    }
}
