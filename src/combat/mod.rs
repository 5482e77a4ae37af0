//! Combat resolution: hits, damage, invincibility and the player meters.
//!
//! Every function works on the shared [`EncounterContext`]; nothing here owns
//! state of its own.

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::EntityKind;
use crate::boss::{self, BossState};
use crate::constants::{
    ATTACK_RANGE_CUE_INTERVAL, BLINK_FLASH, BLINK_INTERVAL, BODY_CONTACT_RANGE,
    BOSS_FLASH_DURATION, BOSS_KNOCKBACK, FRAME_RATE_SCALE, INVINCIBILITY_WINDOW,
    PLAYER_DAMAGE_FLASH, PLAYER_EFFECT_LIFETIME, PLAYER_EFFECT_OFFSET, TENSION_MAX,
    TENSION_ON_HIT, TENSION_ON_SLASH, VICTORY_DELAY,
};
use crate::encounter::{DeferredAction, EncounterContext, Outcome};
use crate::events::{Body, BossPose, EncounterEvent, Sound};
use crate::timer::{TimerName, TimerOwner};

/// Feedback variant of a player attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    /// Regular attack: slash effect and tension gain
    Slash,
    /// Supermove cut, no extra feedback
    Cut,
}

/// Hit the boss if it is within attack range; returns whether it connected.
pub fn check_attack_collide(ctx: &mut EncounterContext, damage: u32, kind: AttackKind) -> bool {
    if ctx.boss.state == BossState::Defeated {
        return false;
    }
    if ctx.distance() >= ctx.config.player.attack_range {
        return false;
    }

    ctx.flash(Body::Boss, BOSS_FLASH_DURATION);
    let knockback = ctx.boss.position + ctx.player.forward() * BOSS_KNOCKBACK;
    boss::knock_back(ctx, knockback);

    let front = ctx.player.position + ctx.player.forward() * PLAYER_EFFECT_OFFSET;
    match kind {
        AttackKind::Slash => {
            ctx.spawn_timed(EntityKind::SlashEffect, front, 0.0, PLAYER_EFFECT_LIFETIME);
            increment_tension(ctx, TENSION_ON_SLASH);
        }
        AttackKind::Cut => {}
    }

    tracing::debug!(target: "arena_core::combat", ?kind, damage, "attack connected");
    apply_boss_damage(ctx, damage);
    true
}

/// Deal `amount` to the boss, defeating it when health runs out.
pub fn apply_boss_damage(ctx: &mut EncounterContext, amount: u32) {
    if ctx.boss.state == BossState::Defeated {
        return;
    }

    if ctx.boss.health > amount {
        ctx.boss.health -= amount;
        ctx.emit(EncounterEvent::BossHit {
            damage: amount,
            health: ctx.boss.health,
        });
        boss::bounce(ctx);
        return;
    }

    ctx.boss.health = 0;
    ctx.emit(EncounterEvent::BossHit {
        damage: amount,
        health: 0,
    });
    boss::set_pose(ctx, BossPose::Idle);
    boss::sink(ctx);
    ctx.boss.state = BossState::Defeated;
    stop_everything(ctx);
    ctx.emit(EncounterEvent::BossDefeated);
    ctx.defer(VICTORY_DELAY, DeferredAction::DeclareOutcome(Outcome::Won));
    tracing::info!(target: "arena_core::combat", at = ?ctx.now(), "boss defeated");
}

/// The player was struck by a boss attack.
pub fn player_got_hit(ctx: &mut EncounterContext) {
    if ctx.player.invincible || ctx.is_terminal() || !ctx.player.is_alive() {
        return;
    }

    ctx.player.invincible = true;
    ctx.timers.start_once(TimerOwner::Player, TimerName::Invincibility, INVINCIBILITY_WINDOW);
    ctx.timers.start_repeating(TimerOwner::Player, TimerName::Blink, BLINK_INTERVAL);
    ctx.emit(EncounterEvent::BlinkStarted);

    ctx.player.hit_count += 1;
    increment_tension(ctx, TENSION_ON_HIT);

    let variant = ctx.rng.gen_range(0..3u8);
    ctx.emit(EncounterEvent::Sound {
        sound: Sound::TakeDamage(variant),
    });

    if ctx.player.health > 0 {
        ctx.player.health -= 1;
        ctx.flash(Body::Player, PLAYER_DAMAGE_FLASH);
        ctx.emit(EncounterEvent::PlayerHit {
            health: ctx.player.health,
        });
        tracing::debug!(target: "arena_core::combat", health = ctx.player.health, "player hit");
    } else {
        player_death(ctx);
    }
}

fn player_death(ctx: &mut EncounterContext) {
    ctx.player.model_height = 0.0;
    ctx.emit(EncounterEvent::PlayerDied);
    stop_everything(ctx);
    ctx.set_outcome(Outcome::Lost);
}

/// Invincibility window ran out.
pub fn end_invincibility(ctx: &mut EncounterContext) {
    ctx.player.invincible = false;
    ctx.timers.stop(TimerOwner::Player, TimerName::Blink);
    ctx.emit(EncounterEvent::BlinkStopped);
}

/// One blink of the invincibility loop.
pub fn blink(ctx: &mut EncounterContext) {
    ctx.flash(Body::Player, BLINK_FLASH);
}

/// Shield gain; a full shield restores one health point.
pub fn increment_shield(ctx: &mut EncounterContext) {
    ctx.player.shield += 1;
    if ctx.player.shield >= ctx.config.player.shield_threshold {
        ctx.player.shield = 0;
        ctx.player.health = ctx.player.health.saturating_add(1).min(ctx.player.max_health);
    }
}

/// Add tension, clamped; reaching the maximum unlocks the supermove once.
pub fn increment_tension(ctx: &mut EncounterContext, amount: u32) {
    ctx.player.tension = ctx.player.tension.saturating_add(amount).min(TENSION_MAX);
    if ctx.player.tension >= TENSION_MAX && !ctx.player.supermove_ready {
        ctx.player.supermove_ready = true;
        ctx.emit(EncounterEvent::SupermoveReady);
    }
}

/// Stop every boss timer and destroy every boss-owned entity.
pub fn stop_everything(ctx: &mut EncounterContext) {
    ctx.timers.stop_all(TimerOwner::Boss);
    for (id, kind) in ctx.entities.despawn_boss_owned() {
        ctx.emit(EncounterEvent::EntityDespawned { id, kind });
    }
}

/// Spatial pass run at the end of each tick.
pub fn resolve_collisions(ctx: &mut EncounterContext, dt: std::time::Duration) {
    if ctx.player.is_alive() && ctx.distance() < BODY_CONTACT_RANGE {
        let push = ctx.player.speed * FRAME_RATE_SCALE * dt.as_secs_f32();
        ctx.player.position -= ctx.player.forward() * push;
    }

    let player_pos = ctx.player.position;
    let touched = ctx.entities.iter().any(|e| {
        e.kind
            .collision()
            .is_some_and(|c| c.hits(e.position, e.elevation, player_pos))
    });
    if touched {
        player_got_hit(ctx);
    }

    ctx.player.position = ctx.bounds.clamp(ctx.player.position);
    ctx.boss.position = ctx.bounds.clamp(ctx.boss.position);

    attack_range_cue(ctx);
}

/// Hit the player if it stands within `radius` of `center`.
pub fn area_hit(ctx: &mut EncounterContext, center: Vec2, radius: f32) -> bool {
    if ctx.player.position.distance(center) < radius {
        player_got_hit(ctx);
        return true;
    }
    false
}

fn attack_range_cue(ctx: &mut EncounterContext) {
    if !ctx.inputs_enabled || ctx.player.range_cue_active {
        return;
    }
    if ctx.distance() < ctx.config.player.attack_range {
        ctx.player.range_cue_active = true;
        ctx.emit(EncounterEvent::AttackRangeCue);
        ctx.defer(ATTACK_RANGE_CUE_INTERVAL, DeferredAction::RangeCueEnd);
    }
}
