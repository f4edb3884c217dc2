use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::loader::color::Color;
use crate::loader::image::Image;
use crate::model::time::RationalTime;

/// A constant color image. Doubles as the transparent placeholder for gaps
/// and the opaque background of the composite.
pub struct FillNode {
    size: (u32, u32),
    color: Color,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl FillNode {
    pub fn new(size: (u32, u32), color: Color) -> FillNode {
        FillNode {
            size,
            color,
            inputs: Vec::new(),
            time_offset: RationalTime::default(),
        }
    }
}

impl ImageNode for FillNode {
    fn label(&self) -> &str {
        "Fill"
    }

    fn inputs(&self) -> &[SharedNode] {
        &self.inputs
    }

    fn time_offset(&self) -> RationalTime {
        self.time_offset
    }

    fn set_time_offset(&mut self, offset: RationalTime) {
        self.time_offset = offset;
    }

    fn exec(&mut self, _time: RationalTime) -> Result<Image, KinographError> {
        Ok(Image::solid(self.size.0, self.size.1, self.color))
    }
}

/// A two color checkerboard.
pub struct CheckersNode {
    size: (u32, u32),
    checker_size: (u32, u32),
    color1: Color,
    color2: Color,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl CheckersNode {
    pub fn new(
        size: (u32, u32),
        checker_size: (u32, u32),
        color1: Color,
        color2: Color,
    ) -> CheckersNode {
        CheckersNode {
            size,
            checker_size: (checker_size.0.max(1), checker_size.1.max(1)),
            color1,
            color2,
            inputs: Vec::new(),
            time_offset: RationalTime::default(),
        }
    }
}

impl ImageNode for CheckersNode {
    fn label(&self) -> &str {
        "Checkers"
    }

    fn inputs(&self) -> &[SharedNode] {
        &self.inputs
    }

    fn time_offset(&self) -> RationalTime {
        self.time_offset
    }

    fn set_time_offset(&mut self, offset: RationalTime) {
        self.time_offset = offset;
    }

    fn exec(&mut self, _time: RationalTime) -> Result<Image, KinographError> {
        let mut image = Image::new(self.size.0, self.size.1);
        for y in 0..self.size.1 {
            for x in 0..self.size.0 {
                let cell = x / self.checker_size.0 + y / self.checker_size.1;
                let color = if cell % 2 == 0 {
                    self.color1
                } else {
                    self.color2
                };
                image.set_pixel(x, y, color);
            }
        }
        Ok(image)
    }
}

/// A vertical gradient from `color1` at the top to `color2` at the bottom.
pub struct GradientNode {
    size: (u32, u32),
    color1: Color,
    color2: Color,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl GradientNode {
    pub fn new(size: (u32, u32), color1: Color, color2: Color) -> GradientNode {
        GradientNode {
            size,
            color1,
            color2,
            inputs: Vec::new(),
            time_offset: RationalTime::default(),
        }
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

impl ImageNode for GradientNode {
    fn label(&self) -> &str {
        "Gradient"
    }

    fn inputs(&self) -> &[SharedNode] {
        &self.inputs
    }

    fn time_offset(&self) -> RationalTime {
        self.time_offset
    }

    fn set_time_offset(&mut self, offset: RationalTime) {
        self.time_offset = offset;
    }

    fn exec(&mut self, _time: RationalTime) -> Result<Image, KinographError> {
        let mut image = Image::new(self.size.0, self.size.1);
        for y in 0..self.size.1 {
            let t = if self.size.1 > 1 {
                y as f64 / (self.size.1 - 1) as f64
            } else {
                0.0
            };
            let color = Color::new(
                lerp(self.color1.r, self.color2.r, t),
                lerp(self.color1.g, self.color2.g, t),
                lerp(self.color1.b, self.color2.b, t),
                lerp(self.color1.a, self.color2.a, t),
            );
            for x in 0..self.size.0 {
                image.set_pixel(x, y, color);
            }
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_produces_solid_color() {
        let mut node = FillNode::new((4, 3), Color::new(255, 0, 0, 255));
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.width, 4);
        assert_eq!(image.height, 3);
        assert_eq!(image.pixel(0, 0), Color::new(255, 0, 0, 255));
        assert_eq!(image.pixel(3, 2), Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_checkers_alternate() {
        let mut node = CheckersNode::new((4, 4), (2, 2), Color::WHITE, Color::BLACK);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::WHITE);
        assert_eq!(image.pixel(1, 1), Color::WHITE);
        assert_eq!(image.pixel(2, 0), Color::BLACK);
        assert_eq!(image.pixel(0, 2), Color::BLACK);
        assert_eq!(image.pixel(2, 2), Color::WHITE);
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut node = GradientNode::new((2, 5), Color::BLACK, Color::WHITE);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::BLACK);
        assert_eq!(image.pixel(0, 4), Color::WHITE);
        assert_eq!(image.pixel(1, 2), Color::new(128, 128, 128, 255));
    }

    #[test]
    fn test_checkers_tolerates_zero_checker_size() {
        let mut node = CheckersNode::new((2, 2), (0, 0), Color::WHITE, Color::BLACK);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::WHITE);
        assert_eq!(image.pixel(1, 0), Color::BLACK);
    }
}
