//! Decoded favicon images

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::Result;

/// A favicon normalized to PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// Decodes any supported image format (PNG, ICO, JPEG, GIF, WebP).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Self::from_image(&image)
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG-encoded pixels.
    pub fn as_png(&self) -> &[u8] {
        &self.png
    }
}

#[cfg(test)]
pub(crate) fn test_bitmap(width: u32, height: u32, shade: u8) -> Bitmap {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([shade, 0, 0, 255]));
    Bitmap::from_image(&DynamicImage::ImageRgba8(image)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_keeps_dimensions() {
        let original = test_bitmap(16, 32, 200);
        let decoded = Bitmap::decode(original.as_png()).unwrap();

        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 32);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Bitmap::decode(b"definitely not an image").is_err());
    }
}
