//! CSS color parsing.

use std::str::FromStr;

use crate::error::DrawError;

/// A straight-alpha 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse any CSS color: named colors, `#rgb`/`#rrggbb(aa)`, `rgb()`/`rgba()`, `hsl()`/`hsla()`.
    pub fn parse(input: &str) -> Result<Self, DrawError> {
        let parsed = svgtypes::Color::from_str(input.trim())
            .map_err(|_| DrawError::InvalidColor(input.to_string()))?;
        Ok(Self {
            r: parsed.red,
            g: parsed.green,
            b: parsed.blue,
            a: parsed.alpha,
        })
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    /// The color as an SVG `fill` value, without alpha.
    pub fn svg_fill(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    pub fn opacity(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

impl FromStr for Rgba {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse an optional color property. Absent or empty values mean "don't paint".
pub(crate) fn parse_optional(value: Option<&str>) -> Result<Option<Rgba>, DrawError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Rgba::parse(v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!(Rgba::parse("red").unwrap(), Rgba::rgb(255, 0, 0));
        assert_eq!(Rgba::parse("white").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::parse(" black ").unwrap(), Rgba::BLACK);
    }

    #[test]
    fn test_hex_and_functional_colors() {
        assert_eq!(Rgba::parse("#00ff00").unwrap(), Rgba::rgb(0, 255, 0));
        assert_eq!(Rgba::parse("#00f").unwrap(), Rgba::rgb(0, 0, 255));
        assert_eq!(Rgba::parse("rgb(10, 20, 30)").unwrap(), Rgba::rgb(10, 20, 30));

        let translucent = Rgba::parse("rgba(0, 0, 0, 0.5)").unwrap();
        assert!((127..=128).contains(&translucent.a));
    }

    #[test]
    fn test_invalid_color() {
        let err = Rgba::parse("not-a-color").unwrap_err();
        assert!(matches!(err, DrawError::InvalidColor(ref c) if c == "not-a-color"));
    }

    #[test]
    fn test_optional_colors() {
        assert_eq!(parse_optional(None).unwrap(), None);
        assert_eq!(parse_optional(Some("")).unwrap(), None);
        assert_eq!(parse_optional(Some("blue")).unwrap(), Some(Rgba::rgb(0, 0, 255)));
        assert!(parse_optional(Some("#zzzzzz")).is_err());
    }

    #[test]
    fn test_svg_fill() {
        let c = Rgba::parse("rgba(1, 2, 3, 0)").unwrap();
        assert_eq!(c.svg_fill(), "rgb(1,2,3)");
        assert_eq!(c.opacity(), 0.0);
    }
}
