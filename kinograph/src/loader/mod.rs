pub mod color;
pub mod image;
pub mod sequence;

pub use color::Color;
pub use image::Image;
