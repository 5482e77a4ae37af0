//! Arena geometry and transient entities.
//!
//! The arena is the rectangle `[margin, field_width] x [margin, field_height]`.
//! Both bodies are clamped into it every tick and random boss positions are
//! drawn from the same box.

pub mod entities;
pub mod tween;

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::ARENA_MARGIN;

pub use entities::{ArenaEntity, CollisionProfile, EntityId, EntityKind, EntityStore};
pub use tween::{Easing, Tween, TweenSequence};

/// Playable rectangle of a stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl ArenaBounds {
    pub fn new(field_width: f32, field_height: f32) -> Self {
        Self {
            min: [ARENA_MARGIN, ARENA_MARGIN],
            max: [field_width, field_height],
        }
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min[0], self.max[0].max(self.min[0])),
            p.y.clamp(self.min[1], self.max[1].max(self.min[1])),
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }

    /// Uniformly random point inside the arena
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let x = sample_axis(rng, self.min[0], self.max[0]);
        let y = sample_axis(rng, self.min[1], self.max[1]);
        Vec2::new(x, y)
    }
}

fn sample_axis<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Angle (radians) of the direction from `from` to `to`.
pub fn facing_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    if d.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    d.y.atan2(d.x)
}

/// Unit vector for `angle`
pub fn direction(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

/// Unit vector perpendicular to `v`, or zero for a zero vector.
pub fn perpendicular(v: Vec2) -> Vec2 {
    v.normalize_or_zero().perp()
}

/// Points evenly spaced from `from` to `to`, both ends included.
pub fn evenly_spaced(from: Vec2, to: Vec2, count: usize) -> Vec<Vec2> {
    match count {
        0 => Vec::new(),
        1 => vec![from],
        n => (0..n)
            .map(|i| from.lerp(to, i as f32 / (n - 1) as f32))
            .collect(),
    }
}

/// Points on a circle, starting at angle zero.
pub fn ring_points(center: Vec2, radius: f32, count: usize) -> Vec<Vec2> {
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            center + direction(angle) * radius
        })
        .collect()
}
