use std::ops::{Add, Mul, Sub};

use bytemuck::NoUninit;

/// A 2D vector in window pixel coordinates (y pointing down).
#[derive(Debug, Default, Clone, Copy, PartialEq, NoUninit)]
#[repr(C)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub fn midpoint(self, other: Self) -> Self {
        (self + other) * 0.5
    }
}

#[cfg(test)]
impl Vec2f {
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn dist(self, other: Self) -> f32 {
        (other - self).length()
    }
}

pub const fn vec2(x: f32, y: f32) -> Vec2f {
    Vec2f { x, y }
}

impl Add for Vec2f {
    type Output = Vec2f;

    fn add(self, rhs: Vec2f) -> Vec2f {
        vec2(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2f {
    type Output = Vec2f;

    fn sub(self, rhs: Vec2f) -> Vec2f {
        vec2(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2f {
    type Output = Vec2f;

    fn mul(self, rhs: f32) -> Vec2f {
        vec2(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle, `min` inclusive, `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2f,
    pub max: Vec2f,
}

impl Rect {
    pub fn from_origin_size(origin: Vec2f, size: Vec2f) -> Self {
        Self {
            min: origin,
            max: origin + size,
        }
    }

    pub fn center(&self) -> Vec2f {
        self.min.midpoint(self.max)
    }

    pub fn contains(&self, p: Vec2f) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        let d = vec2(amount, amount);
        Self {
            min: self.min - d,
            max: self.max + d,
        }
    }
}
