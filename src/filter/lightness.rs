use super::FrameFilter;
use image::RgbImage;
use rand::rngs::ThreadRng;
use rand::Rng;
use tracing::debug;

/// Share of the frame's pixels that get sampled.
const SAMPLE_RATIO: u64 = 10;

/// Estimate the mean HSL lightness of `frame` in `[0, 1]`.
///
/// Samples a tenth of the pixel count at uniformly random coordinates, with
/// replacement. An empty frame has lightness 0.
pub fn sampled_lightness<R: Rng + ?Sized>(frame: &RgbImage, rng: &mut R) -> f64 {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let samples = (width as u64 * height as u64 / SAMPLE_RATIO).max(1);
    let mut total = 0.0;
    for _ in 0..samples {
        let pixel = frame.get_pixel(rng.gen_range(0..width), rng.gen_range(0..height));
        let max = pixel.0.iter().copied().max().unwrap_or(0);
        let min = pixel.0.iter().copied().min().unwrap_or(0);
        total += (max as f64 / 255.0 + min as f64 / 255.0) / 2.0;
    }

    total / samples as f64
}

/// Keeps frames whose sampled lightness reaches `min_lightness`.
pub struct LightnessFilter<R = ThreadRng> {
    min_lightness: f64,
    rng: R,
}

impl LightnessFilter {
    pub fn new(min_lightness: f64) -> Self {
        Self::with_rng(min_lightness, rand::thread_rng())
    }
}

impl<R: Rng> LightnessFilter<R> {
    pub fn with_rng(min_lightness: f64, rng: R) -> Self {
        Self { min_lightness, rng }
    }

    pub fn is_acceptable(&mut self, frame: &RgbImage) -> bool {
        let lightness = sampled_lightness(frame, &mut self.rng);
        let accepted = lightness >= self.min_lightness;
        debug!(
            lightness = format!("{:.3}", lightness),
            threshold = format!("{:.3}", self.min_lightness),
            accepted,
            "lightness check"
        );
        accepted
    }
}

impl<R: Rng> FrameFilter for LightnessFilter<R> {
    fn accept(&mut self, frame: &RgbImage) -> bool {
        self.is_acceptable(frame)
    }

    fn name(&self) -> &str {
        "lightness"
    }
}
