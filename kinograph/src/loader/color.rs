/// An RGBA color with 8 bits per channel, straight (unassociated) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Convert from normalized channel values. Components are clamped to
    /// `[0, 1]` before quantizing.
    pub fn from_rgba_f64(rgba: [f64; 4]) -> Color {
        let quantize = |component: f64| (component.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color {
            r: quantize(rgba[0]),
            g: quantize(rgba[1]),
            b: quantize(rgba[2]),
            a: quantize(rgba[3]),
        }
    }
}
