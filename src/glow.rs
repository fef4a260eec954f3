//! Layered glow strokes.
//!
//! A stroke is drawn as several wide, blurred passes in its own color, topped with a thin white
//! core. Layering blurred strokes like this approximates a glow without an offscreen blur pass.

use lyon_geom::point;
use lyon_path::{iterator::PathIterator, Path, PathEvent};
use serde::Deserialize;

use crate::{
    canvas::{Canvas, LineStyle},
    color::Rgb,
    math::{vec2, Vec2f},
    pen::Width,
    stroke::Point,
};

/// Offset applied to a degenerate path's end point so it still produces a visible dot.
const DEGENERATE_EPSILON: Vec2f = vec2(0.1, 0.1);

/// Maximum distance between a smoothed curve and its flattened polyline, in pixels.
pub const DEFAULT_TOLERANCE: f32 = 0.5;

/// One blurred pass underneath the core line.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlowLayer {
    /// Added to the stroke's width for this pass.
    pub extra_width: f32,
    /// Shadow blur radius in pixels.
    pub blur: f32,
}

const fn layer(extra_width: f32, blur: f32) -> GlowLayer {
    GlowLayer { extra_width, blur }
}

pub const DEFAULT_LAYERS: [GlowLayer; 4] = [
    layer(5.0, 40.0),
    layer(8.0, 20.0),
    layer(8.0, 80.0),
    layer(8.0, 40.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GlowStyle {
    pub layers: Vec<GlowLayer>,
    pub core: Rgb,
    /// Flattening tolerance for the smoothed path, in pixels.
    pub tolerance: f32,
}

impl Default for GlowStyle {
    fn default() -> Self {
        Self {
            layers: DEFAULT_LAYERS.to_vec(),
            core: Rgb::WHITE,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl GlowStyle {
    /// Draws `path` as a glowing line at the given opacity.
    ///
    /// Empty paths draw nothing.
    pub fn draw(
        &self,
        canvas: &mut impl Canvas,
        path: &[Point],
        opacity: f32,
        color: Rgb,
        width: Width,
    ) {
        let line = smooth_path(path, self.tolerance);
        if line.is_empty() {
            return;
        }

        for layer in &self.layers {
            canvas.stroke(
                &line,
                &LineStyle {
                    width: width.px() + layer.extra_width,
                    blur: layer.blur,
                    color: color.with_alpha(opacity),
                },
            );
        }

        canvas.stroke(
            &line,
            &LineStyle {
                width: width.px(),
                blur: 0.0,
                color: self.core.with_alpha(opacity),
            },
        );
    }
}

/// Smooths raw pointer samples into a polyline.
///
/// Paths of 3 or more points become a chain of quadratic curves through the midpoints of
/// consecutive samples, with the samples themselves as control points, flattened to within
/// `tolerance` pixels. Shorter paths become a straight segment; a lone or repeated point gets a
/// tiny offset so it still shows up as a dot.
pub fn smooth_path(path: &[Point], tolerance: f32) -> Vec<Point> {
    match *path {
        [] => Vec::new(),
        [p] => vec![p, p + DEGENERATE_EPSILON],
        [a, b] if a == b => vec![a, a + DEGENERATE_EPSILON],
        [a, b] => vec![a, b],
        _ => curve_through(path)
            .iter()
            .flattened(tolerance)
            .filter_map(|event| match event {
                PathEvent::Begin { at } => Some(vec2(at.x, at.y)),
                PathEvent::Line { to, .. } => Some(vec2(to.x, to.y)),
                _ => None,
            })
            .collect(),
    }
}

/// Builds the midpoint quadratic chain for a path of at least 3 samples.
fn curve_through(path: &[Point]) -> Path {
    let at = |p: Point| point(p.x, p.y);
    let n = path.len();

    let mut builder = Path::builder();
    builder.begin(at(path[0]));
    for i in 1..n - 2 {
        builder.quadratic_bezier_to(at(path[i]), at(path[i].midpoint(path[i + 1])));
    }
    builder.quadratic_bezier_to(at(path[n - 2]), at(path[n - 1]));
    builder.end(false);
    builder.build()
}
