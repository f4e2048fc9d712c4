use image::imageops::{self, ColorMap};
use image::{Rgb, RgbImage};

/// Fixed 256-colour palette laid out like the Plan 9 colour map: a 4x4x4
/// RGB cube crossed with four intensity ramps, so black is entry 0 and white
/// entry 255.
pub struct Palette {
    colors: [[u8; 3]; 256],
}

impl Palette {
    pub fn plan9() -> Self {
        let mut colors = [[0u8; 3]; 256];
        let mut i = 0i32;
        for r in 0..4i32 {
            for v in 0..4i32 {
                let mut j = v - r;
                for g in 0..4i32 {
                    for b in 0..4i32 {
                        let den = r.max(g).max(b);
                        let c = if den == 0 {
                            [0x11 * v; 3]
                        } else {
                            let num = 17 * (4 * den + v);
                            [r * num / den, g * num / den, b * num / den]
                        };
                        colors[(i + (j & 0x0f)) as usize] = c.map(|x| x as u8);
                        j += 1;
                    }
                }
                i += 16;
            }
        }
        Self { colors }
    }

    /// Index of the closest colour by squared RGB distance; ties go to the
    /// lowest index.
    pub fn nearest(&self, rgb: [u8; 3]) -> u8 {
        let mut best = 0usize;
        let mut best_distance = u32::MAX;
        for (i, c) in self.colors.iter().enumerate() {
            let distance: u32 = c
                .iter()
                .zip(rgb.iter())
                .map(|(&a, &b)| {
                    let d = a as i32 - b as i32;
                    (d * d) as u32
                })
                .sum();
            if distance < best_distance {
                best = i;
                best_distance = distance;
                if distance == 0 {
                    break;
                }
            }
        }
        best as u8
    }

    /// Palette indices for every pixel of `frame`, row-major.
    pub fn index_frame(&self, frame: &RgbImage) -> Vec<u8> {
        imageops::index_colors(frame, self).into_raw()
    }

    /// Flat `r, g, b, r, g, b, ...` table for a GIF colour map.
    pub fn to_rgb_table(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }
}

impl ColorMap for Palette {
    type Color = Rgb<u8>;

    fn index_of(&self, color: &Rgb<u8>) -> usize {
        self.nearest(color.0) as usize
    }

    fn lookup(&self, index: usize) -> Option<Rgb<u8>> {
        self.colors.get(index).map(|&c| Rgb(c))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgb<u8>) {
        color.0 = self.colors[self.index_of(color)];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan9_layout() {
        let palette = Palette::plan9();
        assert_eq!(palette.colors[0], [0x00, 0x00, 0x00]);
        assert_eq!(palette.colors[1], [0x00, 0x00, 0x44]);
        assert_eq!(palette.colors[4], [0x00, 0x44, 0x00]);
        assert_eq!(palette.colors[255], [0xFF, 0xFF, 0xFF]);
        assert_eq!(palette.to_rgb_table().len(), 768);
    }

    #[test]
    fn every_entry_is_filled_once() {
        let palette = Palette::plan9();
        let mut distinct: Vec<[u8; 3]> = (0..=255u8).map(|i| palette.colors[i as usize]).collect();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 256);
    }

    #[test]
    fn nearest_matches_exact_and_close_colors() {
        let palette = Palette::plan9();
        assert_eq!(palette.nearest([0, 0, 0]), 0);
        assert_eq!(palette.nearest([255, 255, 255]), 255);
        assert_eq!(palette.nearest([2, 1, 0]), 0);
        let red = palette.nearest([250, 3, 3]);
        assert_eq!(palette.colors[red as usize], [0xFF, 0x00, 0x00]);
    }

    #[test]
    fn index_frame_is_row_major() {
        let palette = Palette::plan9();
        let frame = RgbImage::from_fn(3, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        assert_eq!(palette.index_frame(&frame), vec![255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn color_map_snaps_to_palette() {
        let palette = Palette::plan9();
        let mut color = Rgb([250, 3, 3]);
        palette.map_color(&mut color);
        assert_eq!(color, Rgb([0xFF, 0x00, 0x00]));
        assert_eq!(palette.lookup(255), Some(Rgb([0xFF, 0xFF, 0xFF])));
        assert_eq!(palette.lookup(256), None);
    }
}
