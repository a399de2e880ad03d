use image::RgbImage;
use rand::Rng;

use crate::{RasterProfile, image_utils::brightness};

/// Supplies pixel coordinates for sampling.
///
/// Implementations must return `x < width` and `y < height`.
pub trait CoordinateSource {
    fn next_coordinate(&mut self, width: u32, height: u32) -> (u32, u32);
}

/// Uniform coordinates drawn from any `rand` generator.
pub struct RandomCoordinates<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomCoordinates<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> CoordinateSource for RandomCoordinates<R> {
    fn next_coordinate(&mut self, width: u32, height: u32) -> (u32, u32) {
        (self.rng.random_range(0..width), self.rng.random_range(0..height))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RasterSampler {
    sample_count: u32,
    dark_threshold: f64,
}

impl RasterSampler {
    pub fn new(sample_count: u32, dark_threshold: f64) -> Self {
        Self {
            sample_count,
            dark_threshold,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn dark_threshold(&self) -> f64 {
        self.dark_threshold
    }

    /// Samples with replacement. An empty raster yields a zeroed profile.
    pub fn sample<S: CoordinateSource>(&self, raster: &RgbImage, source: &mut S) -> RasterProfile {
        let (width, height) = raster.dimensions();
        let mut brightness_sum = 0.0;
        let mut dark_count = 0u32;
        let samples = if width == 0 || height == 0 { 0 } else { self.sample_count };

        for _ in 0..samples {
            let (x, y) = source.next_coordinate(width, height);
            let value = brightness(raster.get_pixel(x.min(width - 1), y.min(height - 1)));

            brightness_sum += value;
            if value < self.dark_threshold {
                dark_count += 1;
            }
        }

        let (average_brightness, dark_ratio) = if samples == 0 {
            (0.0, 0.0)
        } else {
            let n = samples as f64;
            (brightness_sum / n, dark_count as f64 / n)
        };

        RasterProfile {
            width,
            height,
            total_pixels: width as u64 * height as u64,
            average_brightness,
            dark_ratio,
        }
    }
}

impl Default for RasterSampler {
    fn default() -> Self {
        Self::new(1000, 80.0)
    }
}
