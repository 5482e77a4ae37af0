//! Centralized tuning constants for the arena combat core.
//!
//! Values that a designer may want to retune per build live in
//! [`EncounterConfig`](crate::encounter::config::EncounterConfig) and take
//! their defaults from here. Fixed windows of the attack sub-timelines and the
//! player action machine are used directly by their modules.

// =====================================================
// Player
// =====================================================

/// Maximum player health (hits the player can absorb before the killing blow)
pub const PLAYER_MAX_HEALTH: u8 = 2;

/// Base player speed in units per 1/60 s
pub const PLAYER_SPEED: f32 = 0.6;

/// Dash multiplier: dash speed = PLAYER_SPEED * PLAYER_DASH_MULT * 2
pub const PLAYER_DASH_MULT: f32 = 4.0;

/// Damage dealt by a regular slash
pub const PLAYER_ATTACK_DAMAGE: u32 = 5;

/// Damage dealt by each supermove cut
pub const PLAYER_SUPERMOVE_DAMAGE: u32 = 3;

/// Distance below which a player attack connects with the boss
pub const PLAYER_ATTACK_RANGE: f32 = 76.0;

/// Shield increments needed to restore one health point
pub const PLAYER_SHIELD_THRESHOLD: u32 = 1000;

/// Tension the player starts each encounter with
pub const PLAYER_START_TENSION: u32 = 20;

/// Tension ceiling; reaching it unlocks the supermove
pub const TENSION_MAX: u32 = 100;

/// Tension gained when a slash connects
pub const TENSION_ON_SLASH: u32 = 10;

/// Tension gained when the player is hit
pub const TENSION_ON_HIT: u32 = 20;

/// Tension gained by a backward dash
pub const TENSION_ON_BACK_DASH: u32 = 5;

/// Dash duration in seconds
pub const DASH_DURATION: f32 = 0.3;

/// Time from dash start until the next dash is allowed
pub const DASH_COOLDOWN: f32 = 0.5;

/// Attack animation lock in seconds
pub const ATTACK_LOCK: f32 = 0.5;

/// Time from attack start until the next attack is allowed
pub const ATTACK_COOLDOWN: f32 = 1.0;

/// Invincibility window after a hit
pub const INVINCIBILITY_WINDOW: f32 = 2.0;

/// Blink loop period while invincible
pub const BLINK_INTERVAL: f32 = 0.2;

/// Flash duration of one blink
pub const BLINK_FLASH: f32 = 0.05;

/// Input lock after a supermove activation
pub const SUPERMOVE_INPUT_LOCK: f32 = 0.2;

/// Number of cut points along the supermove line (ends inclusive)
pub const SUPERMOVE_CUT_POINTS: usize = 7;

/// Delay between two supermove cuts
pub const SUPERMOVE_STEP_DELAY: f32 = 0.1;

/// Forward lunge distance when the supermove starts
pub const SUPERMOVE_LUNGE: f32 = 60.0;

/// Distance in front of the player where slash/bash effects appear
pub const PLAYER_EFFECT_OFFSET: f32 = 20.0;

/// Lifetime of slash, bash and damage flashes on the player side
pub const PLAYER_EFFECT_LIFETIME: f32 = 0.1;

/// Damage flash duration on the player model
pub const PLAYER_DAMAGE_FLASH: f32 = 0.05;

/// Player model height (0 means the player died)
pub const PLAYER_MODEL_HEIGHT: f32 = 60.0;

/// Combined body radius used to keep the player out of the boss
pub const BODY_CONTACT_RANGE: f32 = 24.0;

/// Throttle of the in-range cue shown when the boss is attackable
pub const ATTACK_RANGE_CUE_INTERVAL: f32 = 0.5;

// =====================================================
// Boss
// =====================================================

/// Boss health ceiling (percentage-like)
pub const BOSS_MAX_HEALTH: u32 = 100;

/// Boss health above which the boss stays in phase one
pub const BOSS_PHASE_TWO_THRESHOLD: u32 = 70;

/// Distance below which the boss picks from the melee tables
pub const BOSS_MELEE_RANGE: f32 = 90.0;

/// Boss projectile speed (units per second)
pub const BOSS_PROJECTILE_SPEED: f32 = 355.0;

/// Curve missile speed (units per second)
pub const BOSS_MISSILE_SPEED: f32 = 100.0;

/// Elevation of a freshly fired projectile
pub const PROJECTILE_LAUNCH_ELEVATION: f32 = 24.0;

/// Random aim jitter applied on each axis, half-open [-J, J)
pub const PROJECTILE_AIM_JITTER: i32 = 8;

/// Perpendicular spread of the outer triple-shot projectiles
pub const TRIPLE_SHOT_SPREAD: f32 = 24.0;

/// Hit range of a projectile explosion
pub const EXPLOSION_HIT_RANGE: f32 = 16.0;

/// Lifetime of an explosion effect
pub const EXPLOSION_LIFETIME: f32 = 0.5;

/// Radius of the floor/air blast indicators
pub const BLAST_INDICATOR_RADIUS: f32 = 48.0;

/// Number of explosions spawned when an indicator goes off
pub const BLAST_EXPLOSION_COUNT: usize = 6;

/// Offset of the rush landing point from the player
pub const RUSH_OFFSET: f32 = 20.0;

/// Distance in front of the boss where the melee blast appears
pub const MELEE_SHOT_OFFSET: f32 = 30.0;

/// Lifetime of the melee blast
pub const MELEE_SHOT_LIFETIME: f32 = 0.3;

/// Health restored per heal tick
pub const BOSS_HEAL_PER_TICK: u32 = 10;

/// Heal tick interval
pub const BOSS_HEAL_INTERVAL: f32 = 0.2;

/// Total heal duration
pub const BOSS_HEAL_DURATION: f32 = 1.2;

/// Delay before the first decision once the fight starts
pub const BOSS_FIRST_DECISION_DELAY: f32 = 1.0;

/// Knockback distance along the player's facing
pub const BOSS_KNOCKBACK: f32 = 15.0;

/// Knockback tween duration
pub const BOSS_KNOCKBACK_DURATION: f32 = 0.3;

/// Peak of the hit-reaction bounce
pub const BOSS_BOUNCE_HEIGHT: f32 = 54.0;

/// Duration of each half of the bounce
pub const BOSS_BOUNCE_DURATION: f32 = 0.1;

/// Elevation the boss sinks to when defeated
pub const BOSS_DEAD_ELEVATION: f32 = -64.0;

/// Death sink duration
pub const BOSS_SINK_DURATION: f32 = 2.0;

/// Boss flash duration on hit or heal
pub const BOSS_FLASH_DURATION: f32 = 0.1;

/// Delay between the boss dying and the encounter being won
pub const VICTORY_DELAY: f32 = 2.0;

// =====================================================
// Arena
// =====================================================

/// Lower bound of both arena axes
pub const ARENA_MARGIN: f32 = 100.0;

/// Scale from "per 1/60 s" speeds to per-second displacement
pub const FRAME_RATE_SCALE: f32 = 60.0;

/// Fade duration of the host UI overlays
pub const UI_FADE_DURATION: f32 = 0.5;

/// Default RNG seed for encounters built without explicit config
pub const DEFAULT_SEED: u64 = 42;
