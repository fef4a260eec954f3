use crate::{
    color::Rgba,
    math::{Rect, Vec2f},
};

/// How a polyline is stroked. Joins and caps are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Full line width in pixels.
    pub width: f32,
    /// Radius of the soft shadow drawn around the line, in the line's color. 0 disables it.
    pub blur: f32,
    pub color: Rgba,
}

/// A drawing surface the renderer and control panel paint onto.
///
/// Commands are applied in order, each one composited over the previous ones.
pub trait Canvas {
    /// Blanks the whole surface.
    fn clear(&mut self);

    /// Strokes `path` as one shape: where its segments overlap, the color is applied once.
    fn stroke(&mut self, path: &[Vec2f], style: &LineStyle);

    fn fill_rect(&mut self, rect: Rect, corner_radius: f32, color: Rgba);
}
