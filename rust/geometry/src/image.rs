// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Panorama image samples

use crate::error::{Error, Result};
use panodepth_core::Rgb;

/// Equirectangular panorama as tightly packed RGBA8
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PanoramaImage {
    /// Wrap an RGBA8 buffer, checking it matches the dimensions
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "panorama must not be empty, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidImage(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour image, mostly useful for previews without imagery
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Result<Self> {
        let pixels = [rgb.r, rgb.g, rgb.b, 255].repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Colour at a pixel; coordinates are clamped to the image
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let i = 4 * (y as usize * self.width as usize + x as usize);
        Rgb::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        assert!(PanoramaImage::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(PanoramaImage::from_rgba(0, 2, vec![]).is_err());
        assert!(PanoramaImage::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_pixel_lookup_clamps() {
        let mut pixels = vec![0u8; 3 * 2 * 4];
        pixels[4 * 5..4 * 5 + 4].copy_from_slice(&[10, 20, 30, 255]);
        let image = PanoramaImage::from_rgba(3, 2, pixels).unwrap();

        assert_eq!(image.pixel(2, 1), Rgb::new(10, 20, 30));
        assert_eq!(image.pixel(99, 99), Rgb::new(10, 20, 30));
        assert_eq!(image.pixel(0, 0), Rgb::new(0, 0, 0));
    }
}
