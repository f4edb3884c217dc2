use std::path::Path;

use crate::error::KinographError;
use crate::loader::color::Color;

/// A CPU image buffer, RGBA with 8 bits per channel, rows top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Image {
    /// A fully transparent image of the given size.
    pub fn new(width: u32, height: u32) -> Image {
        Image {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn solid(width: u32, height: u32, color: Color) -> Image {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[color.r, color.g, color.b, color.a]);
        }
        Image {
            width,
            height,
            data,
        }
    }

    /// Load an image from disk and return it as RGBA.
    pub fn load(path: &Path) -> Result<Image, KinographError> {
        let loaded = image::open(path)?;
        let rgba = loaded.to_rgba8();
        Ok(Image {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        })
    }

    /// Read an image's dimensions without decoding the pixel data.
    pub fn dimensions(path: &Path) -> Result<(u32, u32), KinographError> {
        Ok(image::image_dimensions(path)?)
    }

    pub fn save_png(&self, path: &Path) -> Result<(), KinographError> {
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        let index = (y as usize * self.width as usize + x as usize) * 4;
        Color {
            r: self.data[index],
            g: self.data[index + 1],
            b: self.data[index + 2],
            a: self.data[index + 3],
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let index = (y as usize * self.width as usize + x as usize) * 4;
        self.data[index] = color.r;
        self.data[index + 1] = color.g;
        self.data[index + 2] = color.b;
        self.data[index + 3] = color.a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let image = Image::new(4, 2);
        assert_eq!(image.data.len(), 4 * 2 * 4);
        assert!(image.data.iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_solid_and_pixel_access() {
        let mut image = Image::solid(3, 3, Color::new(10, 20, 30, 255));
        assert_eq!(image.pixel(2, 2), Color::new(10, 20, 30, 255));

        image.set_pixel(1, 2, Color::WHITE);
        assert_eq!(image.pixel(1, 2), Color::WHITE);
        assert_eq!(image.pixel(0, 2), Color::new(10, 20, 30, 255));
    }

    #[test]
    fn test_is_empty() {
        assert!(Image::new(0, 8).is_empty());
        assert!(Image::new(8, 0).is_empty());
        assert!(!Image::new(1, 1).is_empty());
    }
}
