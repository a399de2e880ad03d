use image::{GenericImageView, RgbImage};
use log::debug;

use crate::{error::{DecodeError, Result}, image_utils::downscale};

/// Turns encoded image bytes into a bounded RGB raster.
#[derive(Debug, Clone, Copy)]
pub struct RasterDecoder {
    max_dimension: u32,
}

impl RasterDecoder {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RgbImage> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let image = image::load_from_memory(bytes)?;
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions(width, height));
        }

        let raster = downscale(&image, self.max_dimension);
        debug!(
            "decoded {}x{} image, raster {}x{}",
            width,
            height,
            raster.width(),
            raster.height()
        );

        Ok(raster)
    }
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::new(512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::uniform_png;

    #[test]
    fn test_decoder_downscales_large_images() {
        let raster = RasterDecoder::default()
            .decode(&uniform_png(1024, 600, [10, 200, 30]))
            .unwrap();
        assert_eq!(raster.dimensions(), (512, 300));
    }

    #[test]
    fn test_decoder_keeps_small_images() {
        let raster = RasterDecoder::default()
            .decode(&uniform_png(40, 30, [1, 2, 3]))
            .unwrap();
        assert_eq!(raster.dimensions(), (40, 30));
        assert_eq!(raster.get_pixel(5, 5).0, [1, 2, 3]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            RasterDecoder::default().decode(&[]),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn test_truncated_png_is_rejected() {
        let bytes = uniform_png(32, 32, [0, 0, 0]);
        let truncated = &bytes[..bytes.len() / 3];
        assert!(RasterDecoder::default().decode(truncated).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            RasterDecoder::default().decode(b"definitely not pixels"),
            Err(DecodeError::Image(_))
        ));
    }
}
