//! Timestamp overlay for captured frames.
//!
//! Text is anchored at the bottom-left corner of the frame: the anchor is
//! the baseline origin, so glyphs sit directly above the last pixel row.

mod bitmap;
mod outline;

pub use bitmap::BitmapFace;
pub use outline::OutlineFace;

use crate::error::Result;
use image::{Rgb, RgbImage};
use std::path::Path;

/// Height in pixels that every face renders at.
pub const LABEL_PX: u32 = 32;

const SHADOW: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
const FILL: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// A face that can paint a line of text onto a frame.
///
/// `origin` is the baseline start in image space and may lie outside the
/// frame; anything off-frame is clipped.
pub trait TextFace {
    fn draw(&self, frame: &mut RgbImage, text: &str, origin: (i64, i64), color: Rgb<u8>);
}

/// Font selection, loaded once at startup.
pub enum FontFace {
    Bitmap(BitmapFace),
    Outline(OutlineFace),
}

impl FontFace {
    /// Load a TrueType/OpenType face from `path`, or fall back to the
    /// embedded monospace bitmap face.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::Outline(OutlineFace::from_file(path, LABEL_PX as f32)?)),
            None => Ok(Self::Bitmap(BitmapFace::new(LABEL_PX / bitmap::GLYPH_SIZE))),
        }
    }
}

impl TextFace for FontFace {
    fn draw(&self, frame: &mut RgbImage, text: &str, origin: (i64, i64), color: Rgb<u8>) {
        match self {
            Self::Bitmap(face) => face.draw(frame, text, origin, color),
            Self::Outline(face) => face.draw(frame, text, origin, color),
        }
    }
}

/// Paints outlined text onto frames.
pub struct Labeler<F = FontFace> {
    face: F,
}

impl<F: TextFace> Labeler<F> {
    pub fn new(face: F) -> Self {
        Self { face }
    }

    /// Overlay `text` at the bottom-left corner of `frame`.
    ///
    /// The dark border is the text drawn at every offset in
    /// `{-2,-1,0,1} x {-2,-1,0,1}` subtracted from the anchor, so it is
    /// thicker towards the bottom-right. The light text goes on top at the
    /// anchor itself.
    pub fn label(&self, frame: &mut RgbImage, text: &str) {
        let x = 0i64;
        let y = frame.height() as i64;

        for dx in -2..2i64 {
            for dy in -2..2i64 {
                self.face.draw(frame, text, (x - dx, y - dy), SHADOW);
            }
        }

        self.face.draw(frame, text, (x, y), FILL);
    }
}
