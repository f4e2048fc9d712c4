use crate::error::{Error, Result};
use crate::filter::FrameFilter;
use image::{ImageReader, RgbImage};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug)]
pub enum SkipReason {
    Undecodable(Error),
    Filtered(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undecodable(e) => write!(f, "{e}"),
            Self::Filtered(name) => write!(f, "rejected by {name} filter"),
        }
    }
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Frames ready for stitching plus the inputs that were left out.
#[derive(Debug, Default)]
pub struct FrameSet {
    pub frames: Vec<RgbImage>,
    pub skipped: Vec<SkippedFile>,
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| FRAME_EXTENSIONS.contains(&e.as_str()))
}

/// Regular image files in `directory`, sorted by name. Symlinks (such as
/// the latest alias) are not followed.
pub fn list_frame_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let context = || format!("failed to read directory {}", directory.display());
    let entries = fs::read_dir(directory).map_err(|e| Error::io(context(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(context(), e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(context(), e))?;
        let path = entry.path();
        if file_type.is_file() && is_frame_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn decode(path: &Path) -> Result<RgbImage> {
    let decode_error = |source| Error::Decode {
        path: path.to_path_buf(),
        source,
    };
    // Content decides the codec; frame files may be PNG under a .jpg name.
    let image = ImageReader::open(path)
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;
    Ok(image.to_rgb8())
}

/// Decode every frame file in `directory`, in name order.
///
/// Files that fail to decode, or that `filter` rejects, are logged and
/// skipped; only a failure to list the directory is an error.
pub fn load_frames(
    directory: &Path,
    mut filter: Option<&mut dyn FrameFilter>,
) -> Result<FrameSet> {
    let mut set = FrameSet::default();

    for path in list_frame_files(directory)? {
        let frame = match decode(&path) {
            Ok(frame) => frame,
            Err(e) => {
                let reason = SkipReason::Undecodable(e);
                warn!("Skipping {}: {}", path.display(), reason);
                set.skipped.push(SkippedFile { path, reason });
                continue;
            }
        };

        if let Some(filter) = filter.as_deref_mut() {
            if !filter.accept(&frame) {
                let reason = SkipReason::Filtered(filter.name().to_string());
                warn!("Skipping {}: {}", path.display(), reason);
                set.skipped.push(SkippedFile { path, reason });
                continue;
            }
        }

        debug!("Loaded {} ({}x{})", path.display(), frame.width(), frame.height());
        set.frames.push(frame);
    }

    Ok(set)
}
