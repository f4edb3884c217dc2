use crate::error::KinographError;
use crate::graph::node::{ImageNode, SharedNode};
use crate::loader::color::Color;
use crate::loader::image::Image;
use crate::model::time::RationalTime;

/// Source-over composite of its inputs. The first input is the canvas,
/// every later input is drawn over it in order.
pub struct CompositeNode {
    premult: bool,
    inputs: Vec<SharedNode>,
    time_offset: RationalTime,
}

impl CompositeNode {
    pub fn new(inputs: Vec<SharedNode>, premult: bool) -> CompositeNode {
        CompositeNode {
            premult,
            inputs,
            time_offset: RationalTime::default(),
        }
    }
}

impl ImageNode for CompositeNode {
    fn label(&self) -> &str {
        "Composite"
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
        let Some((canvas, layers)) = self.inputs.split_first() else {
            return Ok(Image::new(0, 0));
        };
        let mut canvas = canvas.borrow_mut().exec(local)?;
        for layer in layers {
            let source = layer.borrow_mut().exec(local)?;
            draw_over(&mut canvas, &source, self.premult);
        }
        Ok(canvas)
    }
}

/// Draw `source` over `canvas` in place. The overlap is the intersection
/// of the two sizes, anchored at the top left corner.
pub fn draw_over(canvas: &mut Image, source: &Image, premult: bool) {
    let width = canvas.width.min(source.width);
    let height = canvas.height.min(source.height);
    for y in 0..height {
        for x in 0..width {
            let blended = blend_over(canvas.pixel(x, y), source.pixel(x, y), premult);
            canvas.set_pixel(x, y, blended);
        }
    }
}

fn blend_over(dst: Color, src: Color, premult: bool) -> Color {
    let src_a = src.a as f64 / 255.0;
    let dst_a = dst.a as f64 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let quantize = |value: f64| value.clamp(0.0, 255.0).round() as u8;
    if premult {
        // Premultiplied: color channels carry their own coverage.
        Color {
            r: quantize(src.r as f64 + dst.r as f64 * (1.0 - src_a)),
            g: quantize(src.g as f64 + dst.g as f64 * (1.0 - src_a)),
            b: quantize(src.b as f64 + dst.b as f64 * (1.0 - src_a)),
            a: quantize(out_a * 255.0),
        }
    } else {
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| {
            quantize((s as f64 * src_a + d as f64 * dst_a * (1.0 - src_a)) / out_a)
        };
        Color {
            r: channel(src.r, dst.r),
            g: channel(src.g, dst.g),
            b: channel(src.b, dst.b),
            a: quantize(out_a * 255.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generator::FillNode;
    use crate::graph::node::shared;

    #[test]
    fn test_opaque_source_replaces_canvas() {
        let blended = blend_over(Color::new(0, 255, 0, 255), Color::new(255, 0, 0, 255), true);
        assert_eq!(blended, Color::new(255, 0, 0, 255));
    }

    #[test]
    fn test_transparent_source_keeps_canvas() {
        let canvas = Color::new(10, 20, 30, 255);
        assert_eq!(blend_over(canvas, Color::TRANSPARENT, true), canvas);
        assert_eq!(blend_over(canvas, Color::TRANSPARENT, false), canvas);
    }

    #[test]
    fn test_straight_alpha_blend() {
        let blended = blend_over(
            Color::new(0, 0, 0, 255),
            Color::new(255, 255, 255, 128),
            false,
        );
        // 50.2% white over opaque black.
        assert_eq!(blended, Color::new(128, 128, 128, 255));
    }

    #[test]
    fn test_composite_node_draws_later_inputs_on_top() {
        let background = shared(FillNode::new((2, 2), Color::new(255, 0, 0, 255)));
        let foreground = shared(FillNode::new((2, 2), Color::new(0, 0, 255, 255)));
        let mut node = CompositeNode::new(vec![background, foreground], true);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.pixel(0, 0), Color::new(0, 0, 255, 255));
        assert_eq!(image.pixel(1, 1), Color::new(0, 0, 255, 255));
    }

    #[test]
    fn test_composite_with_no_inputs_is_empty() {
        let mut node = CompositeNode::new(Vec::new(), true);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert!(image.is_empty());
    }

    #[test]
    fn test_smaller_source_only_covers_its_extent() {
        let background = shared(FillNode::new((4, 4), Color::new(255, 0, 0, 255)));
        let foreground = shared(FillNode::new((2, 2), Color::new(0, 0, 255, 255)));
        let mut node = CompositeNode::new(vec![background, foreground], true);
        let image = node.exec(RationalTime::default()).expect("exec failed");
        assert_eq!(image.width, 4);
        assert_eq!(image.pixel(1, 1), Color::new(0, 0, 255, 255));
        assert_eq!(image.pixel(3, 3), Color::new(255, 0, 0, 255));
    }
}
