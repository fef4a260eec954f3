use std::ops::Sub;

use crate::{color::Rgb, math::Vec2f, pen::Width};

/// A pointer sample in window coordinates.
pub type Point = Vec2f;

/// Milliseconds since the overlay clock's epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub u64);

impl Sub for Millis {
    type Output = Millis;

    /// Saturating, so a timestamp from the "future" counts as zero elapsed time.
    fn sub(self, rhs: Millis) -> Millis {
        Millis(self.0.saturating_sub(rhs.0))
    }
}

/// How long a committed stroke takes to fade out completely.
pub const FADE_DURATION: Millis = Millis(500);

/// A committed freehand gesture. Never changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    path: Vec<Point>,
    timestamp: Millis,
    color: Rgb,
    width: Width,
}

impl Stroke {
    pub fn new(path: Vec<Point>, timestamp: Millis, color: Rgb, width: Width) -> Self {
        Self {
            path,
            timestamp,
            color,
            width,
        }
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    #[cfg(test)]
    pub fn timestamp(&self) -> Millis {
        self.timestamp
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn width(&self) -> Width {
        self.width
    }

    /// Linear fade from 1 at creation to 0 once `fade` has elapsed.
    pub fn opacity(&self, now: Millis, fade: Millis) -> f32 {
        if fade.0 == 0 {
            return 0.0;
        }
        let elapsed = now - self.timestamp;
        (1.0 - elapsed.0 as f32 / fade.0 as f32).max(0.0)
    }
}

/// Ordered, append-only list of committed strokes.
#[derive(Debug, Default)]
pub struct StrokeList {
    strokes: Vec<Stroke>,
}

impl StrokeList {
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter()
    }

    /// Drops strokes that have fully faded. Returns how many were removed.
    pub fn prune_faded(&mut self, now: Millis, fade: Millis) -> usize {
        let before = self.strokes.len();
        self.strokes.retain(|s| s.opacity(now, fade) > 0.0);
        before - self.strokes.len()
    }
}
