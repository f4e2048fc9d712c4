use super::TextFace;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

/// Side length of a glyph cell in the embedded font.
pub const GLYPH_SIZE: u32 = 8;

/// Embedded 8x8 monospace face, scaled by an integer factor.
pub struct BitmapFace {
    scale: u32,
}

impl BitmapFace {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    fn glyph(c: char) -> [u8; 8] {
        BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8])
    }
}

impl TextFace for BitmapFace {
    fn draw(&self, frame: &mut RgbImage, text: &str, origin: (i64, i64), color: Rgb<u8>) {
        let scale = self.scale as i64;
        let cell = GLYPH_SIZE as i64 * scale;
        let (width, height) = (frame.width() as i64, frame.height() as i64);
        let top = origin.1 - cell;

        for (i, c) in text.chars().enumerate() {
            let left = origin.0 + i as i64 * cell;
            if left >= width {
                break;
            }

            for (row, bits) in Self::glyph(c).iter().enumerate() {
                for col in 0..GLYPH_SIZE as i64 {
                    // bit 0 is the leftmost column
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let x0 = left + col * scale;
                    let y0 = top + row as i64 * scale;
                    for y in y0.max(0)..(y0 + scale).min(height) {
                        for x in x0.max(0)..(x0 + scale).min(width) {
                            frame.put_pixel(x as u32, y as u32, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_cells_advance_monospaced() {
        let face = BitmapFace::new(1);
        let mut frame = RgbImage::new(16, 8);
        face.draw(&mut frame, "||", (0, 8), Rgb([255, 255, 255]));

        let lit: Vec<u32> = (0..16)
            .filter(|&x| frame.get_pixel(x, 4)[0] == 255)
            .collect();
        assert!(!lit.is_empty());
        let first = lit[0];
        assert!(lit.contains(&(first + GLYPH_SIZE)));
    }

    #[test]
    fn scale_multiplies_glyph_size() {
        let face = BitmapFace::new(4);
        let mut frame = RgbImage::new(64, 64);
        face.draw(&mut frame, "#", (0, 64), Rgb([255, 255, 255]));

        let rows: Vec<u32> = (0..64)
            .filter(|&y| (0..64).any(|x| frame.get_pixel(x, y)[0] == 255))
            .collect();
        assert!(rows.iter().all(|&y| y >= 32));
        assert_eq!(rows.len() % 4, 0);
    }

    #[test]
    fn unknown_characters_fall_back() {
        let face = BitmapFace::new(1);
        let mut frame = RgbImage::new(8, 8);
        face.draw(&mut frame, "\u{2603}", (0, 8), Rgb([255, 255, 255]));
        assert!(frame.pixels().any(|p| p[0] == 255));
    }
}
