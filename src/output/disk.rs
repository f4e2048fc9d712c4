use super::FrameSink;
use crate::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::RgbImage;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the alias that always points at the newest frame.
pub const LATEST_LINK: &str = "latest-raw.jpg";

/// Writes PNG-encoded frames into a directory and keeps the latest alias
/// pointing at the newest one.
pub struct FrameWriter {
    directory: PathBuf,
}

impl FrameWriter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Encode `frame` to `directory/filename`, then repoint the latest alias.
    pub fn save(&self, frame: &RgbImage, filename: &str) -> Result<PathBuf> {
        let path = self.directory.join(filename);

        let file = File::create(&path)
            .map_err(|e| Error::io(format!("failed to create {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        frame
            .write_with_encoder(PngEncoder::new(&mut writer))
            .map_err(|e| {
                Error::io(
                    format!("failed to encode {}", path.display()),
                    io::Error::new(io::ErrorKind::Other, e),
                )
            })?;
        writer
            .flush()
            .map_err(|e| Error::io(format!("failed to write {}", path.display()), e))?;

        self.relink(filename)?;

        Ok(path)
    }

    fn relink(&self, filename: &str) -> Result<()> {
        let link = self.directory.join(LATEST_LINK);

        match fs::remove_file(&link) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::io(
                    format!("failed to remove {}", link.display()),
                    e,
                ))
            }
        }

        // Relative target so the alias resolves inside the directory.
        std::os::unix::fs::symlink(filename, &link)
            .map_err(|e| Error::io(format!("failed to link {}", link.display()), e))
    }
}

impl FrameSink for FrameWriter {
    fn write_frame(&mut self, frame: &RgbImage, filename: &str) -> Result<PathBuf> {
        self.save(frame, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, ImageReader, Rgb};

    fn frame(shade: u8) -> RgbImage {
        RgbImage::from_pixel(4, 3, Rgb([shade, shade, shade]))
    }

    fn content_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn save_writes_png_and_links_latest() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FrameWriter::new(dir.path());

        let path = writer.save(&frame(10), "2024-03-05--14-07-09.jpg").unwrap();
        assert_eq!(path, dir.path().join("2024-03-05--14-07-09.jpg"));
        assert_eq!(content_files(dir.path()), vec!["2024-03-05--14-07-09.jpg"]);

        let reader = ImageReader::open(&path)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Png));
        assert_eq!(reader.decode().unwrap().to_rgb8(), frame(10));

        let link = dir.path().join(LATEST_LINK);
        assert_eq!(
            fs::read_link(&link).unwrap(),
            PathBuf::from("2024-03-05--14-07-09.jpg")
        );
        assert_eq!(fs::canonicalize(&link).unwrap(), fs::canonicalize(&path).unwrap());
    }

    #[test]
    fn latest_follows_newest_frame() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FrameWriter::new(dir.path());

        writer.save(&frame(10), "a.jpg").unwrap();
        let second = writer.save(&frame(20), "b.jpg").unwrap();

        let link = dir.path().join(LATEST_LINK);
        assert_eq!(fs::canonicalize(&link).unwrap(), fs::canonicalize(&second).unwrap());
        assert_eq!(content_files(dir.path()), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn missing_directory_fails_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FrameWriter::new(dir.path().join("absent"));

        let err = writer.save(&frame(0), "x.jpg").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn save_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FrameWriter::new(dir.path());
        fs::write(dir.path().join("x.jpg"), vec![0xAB; 4096]).unwrap();

        let path = writer.save(&frame(5), "x.jpg").unwrap();
        let decoded = ImageReader::open(&path)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(decoded.to_rgb8(), frame(5));
    }
}
