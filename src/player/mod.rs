//! Player action state machine.
//!
//! Locomotion, dash, attack and supermove are gated by flags on [`Player`];
//! their fixed windows (dash end, cooldowns, attack lock) run on the
//! encounter's deferred queue. The player always faces the boss.

pub mod supermove;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

use crate::arena::{direction, facing_angle};
use crate::combat::{self, AttackKind};
use crate::constants::{
    ATTACK_COOLDOWN, ATTACK_LOCK, DASH_COOLDOWN, DASH_DURATION, FRAME_RATE_SCALE,
    PLAYER_MODEL_HEIGHT, SUPERMOVE_INPUT_LOCK, TENSION_ON_BACK_DASH,
};
use crate::encounter::config::PlayerTuning;
use crate::encounter::{DeferredAction, EncounterContext};
use crate::events::{EncounterEvent, PlayerAnimation, Sound};
use crate::input::{KeyInput, LogicalKey};
use crate::timer::secs;

pub use supermove::SupermoveTask;

/// Direction of a dash relative to the player's facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashDirection {
    Left,
    Right,
    Forward,
    Backward,
}

impl DashDirection {
    /// Unit vector of this direction for a player facing `facing`.
    pub fn vector(self, facing: f32) -> Vec2 {
        match self {
            DashDirection::Left => direction(facing - FRAC_PI_2),
            DashDirection::Right => direction(facing + FRAC_PI_2),
            DashDirection::Forward => direction(facing),
            DashDirection::Backward => -direction(facing),
        }
    }

    /// Dash direction from held keys, checked Left, Right, Forward, Backward.
    pub fn from_keys(keys: &impl KeyInput) -> Option<Self> {
        [
            (LogicalKey::Left, DashDirection::Left),
            (LogicalKey::Right, DashDirection::Right),
            (LogicalKey::Up, DashDirection::Forward),
            (LogicalKey::Down, DashDirection::Backward),
        ]
        .into_iter()
        .find(|(key, _)| keys.is_key_down(*key))
        .map(|(_, dir)| dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownKind {
    Dash,
    Attack,
}

/// Observable action state, derived from [`PlayerActions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerActionState {
    Idle,
    Walking,
    Dashing(DashDirection),
    Attacking,
    InCooldown(CooldownKind),
}

/// Action flags of the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerActions {
    pub walking: bool,
    pub dashing: Option<DashDirection>,
    pub dash_cooldown: bool,
    pub attacking: bool,
    pub attack_cooldown: bool,
}

impl PlayerActions {
    pub fn state(&self) -> PlayerActionState {
        if let Some(dir) = self.dashing {
            PlayerActionState::Dashing(dir)
        } else if self.attacking {
            PlayerActionState::Attacking
        } else if self.walking {
            PlayerActionState::Walking
        } else if self.dash_cooldown {
            PlayerActionState::InCooldown(CooldownKind::Dash)
        } else if self.attack_cooldown {
            PlayerActionState::InCooldown(CooldownKind::Attack)
        } else {
            PlayerActionState::Idle
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec2,
    /// Facing angle in radians, locked onto the boss
    pub facing: f32,
    pub base_speed: f32,
    pub speed: f32,
    pub dash_multiplier: f32,
    pub health: u8,
    pub max_health: u8,
    pub shield: u32,
    pub tension: u32,
    pub supermove_ready: bool,
    pub invincible: bool,
    pub hit_count: u32,
    /// Zero once the player died
    pub model_height: f32,
    pub actions: PlayerActions,
    pub supermove: Option<SupermoveTask>,
    /// Attack input stays locked until this instant
    pub input_locked_until: Duration,
    pub range_cue_active: bool,
    pub animation: PlayerAnimation,
}

impl Player {
    pub fn new(position: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            position,
            facing: 0.0,
            base_speed: tuning.speed,
            speed: tuning.speed,
            dash_multiplier: tuning.dash_multiplier,
            health: tuning.max_health,
            max_health: tuning.max_health,
            shield: 0,
            tension: tuning.start_tension,
            supermove_ready: false,
            invincible: false,
            hit_count: 0,
            model_height: PLAYER_MODEL_HEIGHT,
            actions: PlayerActions::default(),
            supermove: None,
            input_locked_until: Duration::ZERO,
            range_cue_active: false,
            animation: PlayerAnimation::Idle,
        }
    }

    pub fn forward(&self) -> Vec2 {
        direction(self.facing)
    }

    pub fn is_alive(&self) -> bool {
        self.model_height > 0.0
    }
}

/// Whether the attack action is locked by a supermove.
pub fn is_input_locked(ctx: &EncounterContext) -> bool {
    ctx.player.supermove.is_some() || ctx.now() < ctx.player.input_locked_until
}

/// Lock the attack action for a short window.
pub fn lock_input_for_supermove(ctx: &mut EncounterContext) {
    let until = ctx.now() + secs(SUPERMOVE_INPUT_LOCK);
    ctx.player.input_locked_until = ctx.player.input_locked_until.max(until);
}

/// Point the player at the boss.
pub fn lock_on(ctx: &mut EncounterContext) {
    ctx.player.facing = facing_angle(ctx.player.position, ctx.boss.position);
}

/// Poll input for one tick: movement, dash, attack, supermove.
pub fn handle_input(ctx: &mut EncounterContext, keys: &impl KeyInput, dt: Duration) {
    lock_on(ctx);
    ctx.player.actions.walking = false;
    if !ctx.inputs_enabled {
        refresh_animation(ctx);
        return;
    }

    let actions = ctx.player.actions;
    if actions.dashing.is_none() && !actions.attacking {
        let step = ctx.player.speed * FRAME_RATE_SCALE * dt.as_secs_f32();
        let facing = ctx.player.facing;
        for (key, dir) in [
            (LogicalKey::Up, DashDirection::Forward),
            (LogicalKey::Down, DashDirection::Backward),
            (LogicalKey::Left, DashDirection::Left),
            (LogicalKey::Right, DashDirection::Right),
        ] {
            if keys.is_key_down(key) {
                ctx.player.position += dir.vector(facing) * step;
                ctx.player.actions.walking = true;
            }
        }
    }

    if keys.is_key_down(LogicalKey::Dash) {
        if let Some(dir) = DashDirection::from_keys(keys) {
            try_dash(ctx, dir);
        }
    }

    if keys.is_key_down(LogicalKey::Attack) {
        try_attack(ctx);
    }

    if keys.is_key_down(LogicalKey::Supermove) {
        supermove::activate(ctx);
    }

    refresh_animation(ctx);
}

/// Start a dash; `false` when the dash is not allowed right now.
pub fn try_dash(ctx: &mut EncounterContext, dir: DashDirection) -> bool {
    let actions = ctx.player.actions;
    if !ctx.inputs_enabled
        || actions.dash_cooldown
        || actions.dashing.is_some()
        || actions.attacking
        || ctx.player.supermove.is_some()
    {
        return false;
    }

    ctx.player.actions.dashing = Some(dir);
    ctx.player.actions.dash_cooldown = true;
    ctx.player.speed = ctx.player.base_speed * ctx.player.dash_multiplier * 2.0;
    ctx.emit(EncounterEvent::Sound {
        sound: Sound::Boost,
    });
    if dir == DashDirection::Backward {
        combat::increment_tension(ctx, TENSION_ON_BACK_DASH);
    }
    ctx.defer(DASH_DURATION, DeferredAction::DashEnd);
    ctx.defer(DASH_COOLDOWN, DeferredAction::DashCooldownEnd);
    tracing::trace!(target: "arena_core::player", ?dir, "dash");
    true
}

/// Swing at the boss; `false` when the attack is not allowed right now.
pub fn try_attack(ctx: &mut EncounterContext) -> bool {
    let actions = ctx.player.actions;
    if !ctx.inputs_enabled
        || actions.attack_cooldown
        || actions.dashing.is_some()
        || actions.attacking
        || is_input_locked(ctx)
    {
        return false;
    }

    play_attack_animation(ctx);
    let damage = ctx.config.player.attack_damage;
    combat::check_attack_collide(ctx, damage, AttackKind::Slash);
    true
}

/// Attack lock and cooldown shared by the slash and the supermove.
pub fn play_attack_animation(ctx: &mut EncounterContext) {
    ctx.player.actions.attacking = true;
    ctx.player.actions.attack_cooldown = true;
    ctx.emit(EncounterEvent::Sound {
        sound: Sound::Saber,
    });
    ctx.defer(ATTACK_LOCK, DeferredAction::AttackLockEnd);
    ctx.defer(ATTACK_COOLDOWN, DeferredAction::AttackCooldownEnd);
}

/// Move the player along an active dash.
pub fn advance_dash(ctx: &mut EncounterContext, dt: Duration) {
    if let Some(dir) = ctx.player.actions.dashing {
        let step = ctx.player.speed * FRAME_RATE_SCALE * dt.as_secs_f32();
        ctx.player.position += dir.vector(ctx.player.facing) * step;
    }
}

pub fn end_dash(ctx: &mut EncounterContext) {
    ctx.player.actions.dashing = None;
    ctx.player.speed = ctx.player.base_speed;
    refresh_animation(ctx);
}

/// Emit the player animation when it changes.
pub fn refresh_animation(ctx: &mut EncounterContext) {
    let actions = ctx.player.actions;
    let animation = if actions.dashing.is_some() {
        PlayerAnimation::Dash
    } else if actions.attacking {
        PlayerAnimation::Attack
    } else if actions.walking {
        PlayerAnimation::Walk
    } else {
        PlayerAnimation::Idle
    };
    if animation != ctx.player.animation {
        ctx.player.animation = animation;
        ctx.emit(EncounterEvent::PlayerAnimation { animation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::config::{EncounterConfig, StageConfig};
    use crate::input::KeyState;

    fn fighting_context() -> EncounterContext {
        let mut ctx = EncounterContext::new(StageConfig::stage2(), EncounterConfig::default());
        ctx.inputs_enabled = true;
        ctx
    }

    #[test]
    fn test_dash_direction_priority() {
        let keys = KeyState::pressed(&[LogicalKey::Down, LogicalKey::Right, LogicalKey::Up]);
        assert_eq!(DashDirection::from_keys(&keys), Some(DashDirection::Right));
        assert_eq!(DashDirection::from_keys(&KeyState::none()), None);
    }

    #[test]
    fn test_action_state_derivation() {
        let mut actions = PlayerActions::default();
        assert_eq!(actions.state(), PlayerActionState::Idle);
        actions.dash_cooldown = true;
        assert_eq!(
            actions.state(),
            PlayerActionState::InCooldown(CooldownKind::Dash)
        );
        actions.dashing = Some(DashDirection::Left);
        assert_eq!(
            actions.state(),
            PlayerActionState::Dashing(DashDirection::Left)
        );
    }

    #[test]
    fn test_walk_moves_toward_boss() {
        let mut ctx = fighting_context();
        let before = ctx.distance();
        handle_input(&mut ctx, &KeyState::pressed(&[LogicalKey::Up]), secs(1.0 / 60.0));
        assert!(ctx.distance() < before);
        assert!(ctx.player.actions.walking);
        assert!((before - ctx.distance() - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_inputs_disabled_ignores_keys() {
        let mut ctx = fighting_context();
        ctx.inputs_enabled = false;
        let start = ctx.player.position;
        handle_input(&mut ctx, &KeyState::pressed(&[LogicalKey::Up, LogicalKey::Attack]), secs(0.1));
        assert_eq!(ctx.player.position, start);
        assert!(!ctx.player.actions.attacking);
    }

    #[test]
    fn test_dash_blocks_attack_and_second_dash() {
        let mut ctx = fighting_context();
        assert!(try_dash(&mut ctx, DashDirection::Forward));
        assert!(!try_dash(&mut ctx, DashDirection::Left));
        assert!(!try_attack(&mut ctx));
        assert!(!ctx.player.actions.attacking);
        assert!((ctx.player.speed - 0.6 * 4.0 * 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_attack_blocks_dash() {
        let mut ctx = fighting_context();
        assert!(try_attack(&mut ctx));
        assert!(!try_dash(&mut ctx, DashDirection::Backward));
        assert!(!try_attack(&mut ctx));
    }

    #[test]
    fn test_backward_dash_adds_tension() {
        let mut ctx = fighting_context();
        let before = ctx.player.tension;
        try_dash(&mut ctx, DashDirection::Backward);
        assert_eq!(ctx.player.tension, before + TENSION_ON_BACK_DASH);
    }

    #[test]
    fn test_input_lock_blocks_attack() {
        let mut ctx = fighting_context();
        lock_input_for_supermove(&mut ctx);
        assert!(is_input_locked(&ctx));
        assert!(!try_attack(&mut ctx));
    }
}
