use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// 24-bit RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::hex(0x000000);
    pub const WHITE: Rgb = Rgb::hex(0xffffff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Builds a color from a packed `0xRRGGBB` literal
    pub const fn hex(packed: u32) -> Self {
        Rgb {
            r: ((packed >> 16) & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: (packed & 0xff) as u8,
        }
    }

    /// Parses `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError::InvalidHex(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorError::InvalidHex(s.to_string()))
        };
        Ok(Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Componentwise linear interpolation, rounded to the nearest integer.
    ///
    /// `t` is clamped to [0, 1] so the result is always a valid color.
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn with_alpha(self, a: f64) -> Rgba {
        Rgba::new(self, a)
    }

    pub fn opaque(self) -> Rgba {
        Rgba::new(self, 1.0)
    }

    /// CSS-style `rgb(r, g, b)` string
    pub fn to_css(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// RGB color with a straight (non-premultiplied) alpha in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        rgb: Rgb::BLACK,
        a: 0.0,
    };

    pub fn new(rgb: Rgb, a: f64) -> Self {
        Rgba {
            rgb,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn fade(self, factor: f64) -> Rgba {
        Rgba::new(self.rgb, self.a * factor)
    }

    pub fn is_visible(self) -> bool {
        self.a > 0.0
    }
}

impl From<Rgb> for Rgba {
    fn from(rgb: Rgb) -> Self {
        rgb.opaque()
    }
}

/// Interpolates between two `#rrggbb` colors and returns a renderable `rgb(...)` string.
///
/// Callers are expected to keep `t` in [0, 1]; it is clamped here as well.
pub fn lerp_color(from: &str, to: &str, t: f64) -> Result<String, ColorError> {
    let a = Rgb::from_hex(from)?;
    let b = Rgb::from_hex(to)?;
    Ok(a.lerp(b, t).to_css())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("#ff6600").unwrap(), Rgb::new(255, 102, 0));
        assert_eq!(Rgb::from_hex("004e92").unwrap(), Rgb::hex(0x004e92));
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_lerp_boundaries_are_exact() {
        let pairs = [("#020005", "#004e92"), ("#ff6600", "#ffe066"), ("#000000", "#ffffff")];
        for (a, b) in pairs {
            assert_eq!(lerp_color(a, b, 0.0).unwrap(), Rgb::from_hex(a).unwrap().to_css());
            assert_eq!(lerp_color(a, b, 1.0).unwrap(), Rgb::from_hex(b).unwrap().to_css());
        }
    }

    #[test]
    fn test_lerp_midpoint_rounds() {
        // (0x02 + 0x00) / 2 = 1, (0x00 + 0x4e) / 2 = 39, (0x05 + 0x92) / 2 = 75.5 -> 76
        assert_eq!(lerp_color("#020005", "#004e92", 0.5).unwrap(), "rgb(1, 39, 76)");
    }

    #[test]
    fn test_lerp_clamps_out_of_range() {
        let a = Rgb::hex(0x102030);
        let b = Rgb::hex(0x405060);
        assert_eq!(a.lerp(b, -3.0), a);
        assert_eq!(a.lerp(b, 7.0), b);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert_eq!(
            lerp_color("nope", "#000000", 0.5),
            Err(ColorError::InvalidHex("nope".to_string()))
        );
    }
}
