use image::{DynamicImage, Rgb, RgbImage, imageops::FilterType};

/// Aspect-preserving size that fits inside `max_dim` on both axes.
///
/// Never upscales. Each side is floored and kept at least 1.
pub fn scaled_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }

    let longest = width.max(height) as u64;
    let scale = |side: u32| -> u32 {
        let scaled = side as u64 * max_dim as u64 / longest;
        (scaled as u32).max(1)
    };

    (scale(width), scale(height))
}

pub fn downscale(image: &DynamicImage, max_dim: u32) -> RgbImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (new_width, new_height) = scaled_dimensions(width, height, max_dim);

    if (new_width, new_height) == (width, height) {
        return rgb;
    }

    image::imageops::resize(&rgb, new_width, new_height, FilterType::Triangle)
}

pub fn brightness(pixel: &Rgb<u8>) -> f64 {
    (pixel[0] as f64 + pixel[1] as f64 + pixel[2] as f64) / 3.0
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
