use std::{fmt, ops::RangeInclusive};

use serde::Deserialize;

use crate::color::Rgb;

/// Pen width in pixels, always within [`Width::RANGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u32")]
pub struct Width(u8);

impl Width {
    pub const RANGE: RangeInclusive<u32> = 1..=20;
    pub const MIN: Self = Width(1);
    pub const MAX: Self = Width(20);

    /// Creates a width, clamping `px` into the allowed range.
    pub fn new(px: u32) -> Self {
        Width(px.clamp(*Self::RANGE.start(), *Self::RANGE.end()) as u8)
    }

    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    pub fn px(self) -> f32 {
        f32::from(self.0)
    }

    /// Moves the width by `delta` steps, saturating at the range bounds.
    pub fn step(self, delta: i32) -> Self {
        Self::new(self.get().saturating_add_signed(delta))
    }
}

impl Default for Width {
    fn default() -> Self {
        Width(4)
    }
}

impl TryFrom<u32> for Width {
    type Error = String;

    fn try_from(px: u32) -> Result<Self, Self::Error> {
        if Self::RANGE.contains(&px) {
            Ok(Width(px as u8))
        } else {
            Err(format!(
                "pen width {px} is outside of {}..={}",
                Self::RANGE.start(),
                Self::RANGE.end()
            ))
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// The settings new strokes are stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PenSettings {
    pub width: Width,
    pub color: Rgb,
}

impl Default for PenSettings {
    fn default() -> Self {
        Self {
            width: Width::default(),
            color: Rgb::RED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_clamped() {
        assert_eq!(Width::new(0), Width::MIN);
        assert_eq!(Width::new(7).get(), 7);
        assert_eq!(Width::new(500), Width::MAX);
        assert_eq!(Width::MAX.step(1), Width::MAX);
        assert_eq!(Width::MIN.step(-3), Width::MIN);
        assert_eq!(Width::new(10).step(-1).get(), 9);
    }

    #[test]
    fn width_rejects_out_of_range_config_values() {
        assert_eq!(Width::try_from(10), Ok(Width::new(10)));
        assert_eq!(Width::try_from(1), Ok(Width::MIN));
        assert!(Width::try_from(0).is_err());
        assert!(Width::try_from(21).is_err());
    }

    #[test]
    fn default_pen_is_red_and_4px() {
        let pen = PenSettings::default();
        assert_eq!(pen.width.get(), 4);
        assert_eq!(pen.color, Rgb::new(255, 0, 0));
    }
}
