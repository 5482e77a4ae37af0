//! Supermove: a lunge followed by a chain of cuts toward the boss.
//!
//! The sequence is a [`SupermoveTask`] resumed by `SupermoveStep` entries on
//! the deferred queue, one step every 100 ms. It never blocks the tick.

use bevy::math::Vec2;

use crate::arena::{evenly_spaced, EntityId, EntityKind};
use crate::combat::{self, AttackKind};
use crate::constants::{
    SUPERMOVE_CUT_POINTS, SUPERMOVE_INPUT_LOCK, SUPERMOVE_LUNGE, SUPERMOVE_STEP_DELAY,
};
use crate::encounter::{DeferredAction, EncounterContext};
use crate::events::{EncounterEvent, Sound};
use crate::timer::secs;

/// Suspended supermove sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SupermoveTask {
    points: Vec<Vec2>,
    step: usize,
    effect: Option<EntityId>,
}

impl SupermoveTask {
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            points: evenly_spaced(from, to, SUPERMOVE_CUT_POINTS),
            step: 0,
            effect: None,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Cuts already performed
    pub fn step(&self) -> usize {
        self.step
    }
}

/// Fire the supermove; `false` unless tension is full and the fight is on.
pub fn activate(ctx: &mut EncounterContext) -> bool {
    if !ctx.player.supermove_ready
        || !ctx.inputs_enabled
        || ctx.is_terminal()
        || ctx.player.supermove.is_some()
    {
        return false;
    }

    ctx.player.supermove_ready = false;
    ctx.player.tension = 0;
    ctx.emit(EncounterEvent::SupermoveStarted);
    ctx.emit(EncounterEvent::Sound {
        sound: Sound::Super,
    });

    super::lock_on(ctx);
    let lunged = ctx.player.position + ctx.player.forward() * SUPERMOVE_LUNGE;
    ctx.player.position = ctx.bounds.clamp(lunged);
    super::play_attack_animation(ctx);
    super::refresh_animation(ctx);

    ctx.player.supermove = Some(SupermoveTask::new(ctx.player.position, ctx.boss.position));
    tracing::debug!(target: "arena_core::player", at = ?ctx.now(), "supermove started");
    resume(ctx);
    true
}

/// Run the next step of the running supermove.
pub fn resume(ctx: &mut EncounterContext) {
    let Some(mut task) = ctx.player.supermove.take() else {
        return;
    };

    if let Some(effect) = task.effect.take() {
        ctx.despawn(effect);
    }

    if task.step >= task.points.len() {
        finish(ctx);
        return;
    }

    let point = task.points[task.step];
    task.effect = Some(ctx.spawn(EntityKind::CutEffect, point, 0.0));
    task.step += 1;
    ctx.player.supermove = Some(task);

    let damage = ctx.config.player.supermove_damage;
    combat::check_attack_collide(ctx, damage, AttackKind::Cut);
    ctx.defer(SUPERMOVE_STEP_DELAY, DeferredAction::SupermoveStep);
}

fn finish(ctx: &mut EncounterContext) {
    let until = ctx.now() + secs(SUPERMOVE_INPUT_LOCK);
    ctx.player.input_locked_until = ctx.player.input_locked_until.max(until);
    ctx.emit(EncounterEvent::SupermoveFinished);
    tracing::debug!(target: "arena_core::player", at = ?ctx.now(), "supermove finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::config::{EncounterConfig, StageConfig};

    #[test]
    fn test_task_points_span_player_to_boss() {
        let task = SupermoveTask::new(Vec2::new(100.0, 100.0), Vec2::new(160.0, 100.0));
        assert_eq!(task.points().len(), 7);
        assert_eq!(task.points()[0], Vec2::new(100.0, 100.0));
        assert!((task.points()[6].x - 160.0).abs() < 1e-4);
        assert_eq!(task.step(), 0);
    }

    #[test]
    fn test_activate_requires_ready() {
        let mut ctx = EncounterContext::new(StageConfig::stage1(), EncounterConfig::default());
        ctx.inputs_enabled = true;
        assert!(!activate(&mut ctx));

        ctx.player.supermove_ready = true;
        ctx.player.tension = 100;
        assert!(activate(&mut ctx));
        assert_eq!(ctx.player.tension, 0);
        assert!(!ctx.player.supermove_ready);
        assert_eq!(ctx.player.supermove.as_ref().map(SupermoveTask::step), Some(1));
        assert_eq!(ctx.entities.count(EntityKind::CutEffect), 1);
        assert!(!activate(&mut ctx));
    }
}
