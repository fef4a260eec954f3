use std::{fmt, str::FromStr};

use anyhow::bail;
use palette::{FromColor, Hsv, Srgb};
use serde::{de::Visitor, Deserialize};

/// An 8-bit sRGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Self = Rgb([0xff, 0xff, 0xff]);
    pub const RED: Self = Rgb([0xff, 0x00, 0x00]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    /// Attaches an opacity (0-1) to this color.
    pub fn with_alpha(self, alpha: f32) -> Rgba {
        let [r, g, b] = self.0;
        Rgba([
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            alpha.clamp(0.0, 1.0),
        ])
    }

    pub fn to_hsv(self) -> Hsv {
        let [r, g, b] = self.0;
        Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>())
    }

    pub fn from_hsv(hsv: Hsv) -> Self {
        let rgb: Srgb = Srgb::from_color(hsv);
        let (r, g, b) = rgb.into_format::<u8>().into_components();
        Rgb([r, g, b])
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    /// Parses a `#rrggbb` hex triplet.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        let Some(hex) = s.strip_prefix('#') else {
            bail!("color '{s}' must start with '#'");
        };
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("color '{s}' is not of the form #rrggbb");
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl<'a> Deserialize<'a> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        struct HexVisitor;

        impl<'de> Visitor<'de> for HexVisitor {
            type Value = Rgb;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("color in #rrggbb form")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(|e| E::custom(format_args!("{e}")))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

/// Straight (non-premultiplied) RGBA color with channels in 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    /// Converts to premultiplied alpha, as expected by the blend state.
    pub fn premultiplied(&self) -> [f32; 4] {
        let [r, g, b, a] = self.0;
        [r * a, g * a, b * a, a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_triplets() {
        assert_eq!("#00ff00".parse::<Rgb>().unwrap(), Rgb::new(0, 255, 0));
        assert_eq!("#FF8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::new(0x12, 0xab, 0x09).to_string(), "#12ab09");
    }

    #[test]
    fn rejects_malformed_colors() {
        for bad in ["00ff00", "#00ff0", "#00ff000", "#gg0000", "", "#", "#+1ff00"] {
            assert!(bad.parse::<Rgb>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn alpha_is_clamped_and_premultiplied() {
        let c = Rgb::RED.with_alpha(1.5);
        assert_eq!(c.0[3], 1.0);
        let half = Rgb::WHITE.with_alpha(0.5);
        assert_eq!(half.premultiplied(), [0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn hsv_conversion() {
        let green = Rgb::new(0, 255, 0).to_hsv();
        assert!((green.hue.into_positive_degrees() - 120.0).abs() < 1e-3);
        assert_eq!((green.saturation, green.value), (1.0, 1.0));

        let hsv: Hsv = Hsv::new(0.0, 1.0, 0.6);
        assert_eq!(Rgb::from_hsv(hsv), Rgb::new(153, 0, 0));

        for c in [Rgb::new(0x12, 0xab, 0x09), Rgb::WHITE, Rgb::new(0, 0, 0)] {
            assert_eq!(Rgb::from_hsv(c.to_hsv()), c);
        }
    }
}
