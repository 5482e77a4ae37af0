//! Fire-and-forget interpolation of a single property.
//!
//! Knockback, hit bounces, the death sink and projectile flights all move
//! authoritative positions and elevations, so the core advances them itself
//! instead of leaving them to the host's tween behavior.

use bevy::math::curve::{Curve, EaseFunction, EasingCurve};
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Easing curves used by the encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    InSine,
    InOutSine,
    OutElastic,
}

impl Easing {
    /// Matching curve from `bevy_math`
    pub fn ease_function(self) -> EaseFunction {
        match self {
            Easing::Linear => EaseFunction::Linear,
            Easing::InSine => EaseFunction::SineIn,
            Easing::InOutSine => EaseFunction::SineInOut,
            Easing::OutElastic => EaseFunction::ElasticOut,
        }
    }

    /// Map linear progress `t` in `[0, 1]` to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        EasingCurve::new(0.0_f32, 1.0, self.ease_function()).sample_clamped(t)
    }
}

/// Values a [`Tween`] can interpolate
pub trait Interpolate: Copy {
    fn interpolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Vec2 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(from: T, to: T, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    /// Advance by `dt` and return the new value.
    pub fn advance(&mut self, dt: Duration) -> T {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> T {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.interpolate(self.to, self.easing.apply(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> T {
        self.to
    }

    /// Time left until the tween reaches its target
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

/// Tweens played back to back on the same property.
#[derive(Debug, Clone, Default)]
pub struct TweenSequence<T> {
    steps: VecDeque<Tween<T>>,
}

impl<T: Interpolate> TweenSequence<T> {
    /// Replace whatever is playing with `steps`.
    pub fn play(&mut self, steps: impl IntoIterator<Item = Tween<T>>) {
        self.steps = steps.into_iter().collect();
    }

    /// Advance the current step; `None` when nothing is playing.
    pub fn advance(&mut self, dt: Duration) -> Option<T> {
        let step = self.steps.front_mut()?;
        let value = step.advance(dt);
        if step.is_finished() {
            self.steps.pop_front();
        }
        Some(value)
    }

    pub fn is_playing(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn stop(&mut self) {
        self.steps.clear();
    }
}
