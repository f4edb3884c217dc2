use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::loader::color::Color;
use crate::loader::image::Image;
use crate::model::time::RationalTime;

fn sample(image: &Image, x: u32, y: u32) -> Color {
    if x < image.width && y < image.height {
        image.pixel(x, y)
    } else {
        Color::TRANSPARENT
    }
}

fn lerp(a: Color, b: Color, t: f64) -> Color {
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}

/// Cross fade between two inputs. At 0.0 the result is entirely the first
/// input (the outgoing item), at 1.0 entirely the second (the incoming).
pub struct DissolveNode {
    value: f64,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl DissolveNode {
    pub fn new(value: f64, outgoing: SharedNode, incoming: SharedNode) -> DissolveNode {
        DissolveNode {
            value: value.clamp(0.0, 1.0),
            inputs: vec![outgoing, incoming],
            time_offset: RationalTime::default(),
        }
    }
}

impl ImageNode for DissolveNode {
    fn label(&self) -> &str {
        "Dissolve"
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

    fn exec(&mut self, time: RationalTime) -> Result<Image, KinographError> {
        let local = self.local_time(time);
        let [outgoing, incoming] = &self.inputs[..] else {
            return Err(KinographError::Render(
                "dissolve requires two inputs".to_string(),
            ));
        };
        let a = outgoing.borrow_mut().exec(local)?;
        let b = incoming.borrow_mut().exec(local)?;
        let mut image = Image::new(a.width.max(b.width), a.height.max(b.height));
        for y in 0..image.height {
            for x in 0..image.width {
                image.set_pixel(x, y, lerp(sample(&a, x, y), sample(&b, x, y), self.value));
            }
        }
        Ok(image)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WipeDir {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl WipeDir {
    pub fn parse(name: &str) -> Option<WipeDir> {
        match name.to_ascii_lowercase().as_str() {
            "left_to_right" | "lefttoright" | "ltr" => Some(WipeDir::LeftToRight),
            "right_to_left" | "righttoleft" | "rtl" => Some(WipeDir::RightToLeft),
            "top_to_bottom" | "toptobottom" | "ttb" => Some(WipeDir::TopToBottom),
            "bottom_to_top" | "bottomtotop" | "btt" => Some(WipeDir::BottomToTop),
            _ => None,
        }
    }
}

/// Reveal the incoming input with a moving edge. `soft_edge` is the width
/// of the blended band as a fraction of the image, 0.0 for a hard cut.
pub struct WipeNode {
    value: f64,
    dir: WipeDir,
    soft_edge: f64,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl WipeNode {
    pub fn new(
        value: f64,
        dir: WipeDir,
        soft_edge: f64,
        outgoing: SharedNode,
        incoming: SharedNode,
    ) -> WipeNode {
        WipeNode {
            value: value.clamp(0.0, 1.0),
            dir,
            soft_edge: soft_edge.clamp(0.0, 1.0),
            inputs: vec![outgoing, incoming],
            time_offset: RationalTime::default(),
        }
    }

    fn coverage(&self, coord: f64) -> f64 {
        if self.soft_edge > 0.0 {
            ((self.value * (1.0 + self.soft_edge) - coord) / self.soft_edge).clamp(0.0, 1.0)
        } else if coord < self.value {
            1.0
        } else {
            0.0
        }
    }
}

impl ImageNode for WipeNode {
    fn label(&self) -> &str {
        "Wipe"
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

    fn exec(&mut self, time: RationalTime) -> Result<Image, KinographError> {
        let local = self.local_time(time);
        let [outgoing, incoming] = &self.inputs[..] else {
            return Err(KinographError::Render(
                "wipe requires two inputs".to_string(),
            ));
        };
        let a = outgoing.borrow_mut().exec(local)?;
        let b = incoming.borrow_mut().exec(local)?;
        let mut image = Image::new(a.width.max(b.width), a.height.max(b.height));
        let width = image.width;
        let height = image.height;
        for y in 0..height {
            for x in 0..width {
                let coord = match self.dir {
                    WipeDir::LeftToRight => normalized(x, width),
                    WipeDir::RightToLeft => 1.0 - normalized(x, width),
                    WipeDir::TopToBottom => normalized(y, height),
                    WipeDir::BottomToTop => 1.0 - normalized(y, height),
                };
                let t = self.coverage(coord);
                image.set_pixel(x, y, lerp(sample(&a, x, y), sample(&b, x, y), t));
            }
        }
        Ok(image)
    }
}

fn normalized(position: u32, extent: u32) -> f64 {
    if extent > 1 {
        position as f64 / (extent - 1) as f64
    } else {
        0.0
    }
}
