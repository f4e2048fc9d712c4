use super::TextFace;
use crate::error::{Error, Result};
use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use std::path::Path;

/// TrueType/OpenType face rasterised with coverage blending.
pub struct OutlineFace {
    font: FontVec,
    scale: PxScale,
}

impl OutlineFace {
    pub fn from_file(path: &Path, px: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::io(format!("failed to read font {}", path.display()), e))?;
        let font = FontVec::try_from_vec(data).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::info!("Loaded label font from {}", path.display());

        Ok(Self {
            font,
            scale: PxScale::from(px),
        })
    }
}

fn blend(under: Rgb<u8>, over: Rgb<u8>, coverage: f32) -> Rgb<u8> {
    let c = coverage.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - c) + b as f32 * c).round() as u8;
    Rgb([
        mix(under[0], over[0]),
        mix(under[1], over[1]),
        mix(under[2], over[2]),
    ])
}

impl TextFace for OutlineFace {
    fn draw(&self, frame: &mut RgbImage, text: &str, origin: (i64, i64), color: Rgb<u8>) {
        let scaled = self.font.as_scaled(self.scale);
        let (width, height) = (frame.width() as i64, frame.height() as i64);
        let mut caret = origin.0 as f32;

        for c in text.chars() {
            let mut glyph = scaled.scaled_glyph(c);
            glyph.position = point(caret, origin.1 as f32);
            caret += scaled.h_advance(glyph.id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let pixel = frame.get_pixel_mut(x as u32, y as u32);
                *pixel = blend(*pixel, color, coverage);
            });
        }
    }
}
