//! Boss attacks and their sub-timelines.
//!
//! Each attack runs in three parts: a windup timer, the execution when the
//! windup completes, and follow-up timers (back-to-idle, explosions, chained
//! shots, the next decision).

use bevy::math::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::arena::{perpendicular, ring_points, ArenaEntity, Easing, EntityKind};
use crate::combat;
use crate::constants::{
    BLAST_EXPLOSION_COUNT, BLAST_INDICATOR_RADIUS, BOSS_FLASH_DURATION, BOSS_HEAL_DURATION,
    BOSS_HEAL_INTERVAL, BOSS_HEAL_PER_TICK, EXPLOSION_HIT_RANGE, EXPLOSION_LIFETIME,
    MELEE_SHOT_LIFETIME, MELEE_SHOT_OFFSET, PROJECTILE_AIM_JITTER, PROJECTILE_LAUNCH_ELEVATION,
    RUSH_OFFSET, TRIPLE_SHOT_SPREAD,
};
use crate::encounter::EncounterContext;
use crate::events::{Body, EncounterEvent};
use crate::timer::{TimerName, TimerOwner};

const BOSS: TimerOwner = TimerOwner::Boss;

/// Windup of most attacks
pub const WINDUP: f32 = 0.5;
/// Shorter windup of the melee blast
pub const MELEE_WINDUP: f32 = 0.3;
/// Fuse of the floor and air blast indicators
pub const INDICATOR_FUSE: f32 = 2.0;
/// Interval between chained shots
pub const CHAIN_SHOT_INTERVAL: f32 = 0.3;
/// Shots (or reposition + shot steps) of a chained attack
pub const CHAIN_STEPS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossAttack {
    FloorBlast,
    RushFloorBlast,
    MeleeShot,
    ChainTripleShot,
    SingleShot,
    TripleShot,
    CurveMissile,
    Heal,
    RandomMove,
    ChainMove,
}

impl BossAttack {
    pub const ALL: [BossAttack; 10] = [
        BossAttack::FloorBlast,
        BossAttack::RushFloorBlast,
        BossAttack::MeleeShot,
        BossAttack::ChainTripleShot,
        BossAttack::SingleShot,
        BossAttack::TripleShot,
        BossAttack::CurveMissile,
        BossAttack::Heal,
        BossAttack::RandomMove,
        BossAttack::ChainMove,
    ];

    /// Delay between choosing the attack and executing it
    pub fn windup(self) -> f32 {
        match self {
            BossAttack::MeleeShot => MELEE_WINDUP,
            BossAttack::RandomMove => 0.0,
            _ => WINDUP,
        }
    }

    /// Time from execution until the boss returns to its idle pose
    pub fn back_to_idle(self) -> f32 {
        match self {
            BossAttack::CurveMissile => 1.0,
            _ => 0.4,
        }
    }

    /// Time from execution (or the end of a chain) until the next decision
    pub fn next_decision(self) -> f32 {
        match self {
            BossAttack::SingleShot
            | BossAttack::TripleShot
            | BossAttack::ChainTripleShot
            | BossAttack::ChainMove => 2.0,
            BossAttack::RandomMove => 1.0,
            _ => 2.5,
        }
    }

    pub fn is_chained(self) -> bool {
        matches!(self, BossAttack::ChainTripleShot | BossAttack::ChainMove)
    }
}

/// Run the body of `attack` once its windup completed.
pub(super) fn execute(ctx: &mut EncounterContext, attack: BossAttack) {
    match attack {
        BossAttack::FloorBlast => {
            let at = ctx.boss.position;
            ctx.spawn(EntityKind::FloorBlastIndicator, at, 0.0);
            ctx.timers.start_once(BOSS, TimerName::FloorBlastExplosion, INDICATOR_FUSE);
        }
        BossAttack::RushFloorBlast => {
            let landing = ctx.bounds.clamp(ctx.player.position + Vec2::splat(RUSH_OFFSET));
            super::teleport(ctx, landing);
            ctx.spawn(EntityKind::AirBlastIndicator, landing, 0.0);
            ctx.timers.start_once(BOSS, TimerName::AirBlastExplosion, INDICATOR_FUSE);
        }
        BossAttack::MeleeShot => {
            let front = ctx.boss.position + ctx.boss.forward_to(ctx.player.position) * MELEE_SHOT_OFFSET;
            ctx.spawn_timed(EntityKind::MeleeBlast, front, 0.0, MELEE_SHOT_LIFETIME);
        }
        BossAttack::SingleShot => {
            let aim = jittered_aim(ctx);
            fire_projectile(ctx, aim);
        }
        BossAttack::TripleShot => {
            let aim = jittered_aim(ctx);
            let spread = perpendicular(aim - ctx.boss.position) * TRIPLE_SHOT_SPREAD;
            for target in [aim, aim + spread, aim - spread] {
                fire_projectile(ctx, target);
            }
        }
        BossAttack::ChainTripleShot | BossAttack::ChainMove => {
            ctx.boss.chain_fired = 0;
            chain_step(ctx, attack);
            ctx.timers.start_repeating(BOSS, TimerName::ChainShot, CHAIN_SHOT_INTERVAL);
            return;
        }
        BossAttack::CurveMissile => {
            let from = ctx.boss.position;
            let to = ctx.player.position;
            let flight = from.distance(to) / ctx.config.boss.missile_speed;
            ctx.spawn_flying(EntityKind::CurveMissile, from, to, 0.0, flight, Easing::InSine);
        }
        BossAttack::Heal => {
            ctx.timers.start_repeating(BOSS, TimerName::HealTick, BOSS_HEAL_INTERVAL);
            ctx.timers.start_once(BOSS, TimerName::HealEnd, BOSS_HEAL_DURATION);
            return;
        }
        BossAttack::RandomMove => {
            random_move(ctx);
            return;
        }
    }
    wind_down(ctx, attack);
}

/// Back-to-idle and the next decision after an attack body finished.
pub(super) fn wind_down(ctx: &mut EncounterContext, attack: BossAttack) {
    ctx.timers.start_once(BOSS, TimerName::BackToIdle, attack.back_to_idle());
    ctx.timers.start_once(BOSS, TimerName::AttackDecision, attack.next_decision());
}

/// One step of a chained attack; ends the chain after the last step.
pub(super) fn chain_step(ctx: &mut EncounterContext, attack: BossAttack) {
    if attack == BossAttack::ChainMove {
        let spot = ctx.bounds.random_point(&mut ctx.rng);
        super::teleport(ctx, spot);
    }
    let aim = jittered_aim(ctx);
    fire_projectile(ctx, aim);

    ctx.boss.chain_fired += 1;
    if ctx.boss.chain_fired >= CHAIN_STEPS {
        ctx.timers.stop(BOSS, TimerName::ChainShot);
        wind_down(ctx, attack);
    }
}

pub(super) fn heal_tick(ctx: &mut EncounterContext) {
    ctx.boss.health = ctx.boss.health.saturating_add(BOSS_HEAL_PER_TICK).min(ctx.boss.max_health);
    ctx.flash(Body::Boss, BOSS_FLASH_DURATION);
    ctx.emit(EncounterEvent::BossHealed {
        health: ctx.boss.health,
    });
}

pub(super) fn heal_end(ctx: &mut EncounterContext) {
    ctx.timers.stop(BOSS, TimerName::HealTick);
    wind_down(ctx, BossAttack::Heal);
}

/// Glide to a random arena point and re-arm the decision.
pub(super) fn random_move(ctx: &mut EncounterContext) {
    let spot = ctx.bounds.random_point(&mut ctx.rng);
    super::glide_to(ctx, spot);
    ctx.timers.start_once(
        BOSS,
        TimerName::AttackDecision,
        BossAttack::RandomMove.next_decision(),
    );
}

/// Detonate every indicator of `kind`: a ring of explosions and an area hit.
pub(super) fn explode_indicators(ctx: &mut EncounterContext, kind: EntityKind) {
    let indicators: Vec<_> = ctx.entities.of_kind(kind).iter().map(|e| (e.id, e.position)).collect();
    for (id, center) in indicators {
        if ctx.is_terminal() {
            break;
        }
        for point in ring_points(center, BLAST_INDICATOR_RADIUS, BLAST_EXPLOSION_COUNT) {
            ctx.spawn_timed(EntityKind::Explosion, point, 0.0, EXPLOSION_LIFETIME);
        }
        combat::area_hit(ctx, center, BLAST_INDICATOR_RADIUS);
        ctx.despawn(id);
    }
}

/// A projectile or missile reached its target: replace it with an explosion.
///
/// Once the fight is over the projectile just disappears.
pub fn projectile_arrived(ctx: &mut EncounterContext, entity: &ArenaEntity) {
    ctx.emit(EncounterEvent::EntityDespawned {
        id: entity.id,
        kind: entity.kind,
    });
    if ctx.is_terminal() {
        return;
    }
    ctx.spawn_timed(EntityKind::Explosion, entity.position, 0.0, EXPLOSION_LIFETIME);
    combat::area_hit(ctx, entity.position, EXPLOSION_HIT_RANGE);
}

fn jittered_aim(ctx: &mut EncounterContext) -> Vec2 {
    let jx = ctx.rng.gen_range(-PROJECTILE_AIM_JITTER..PROJECTILE_AIM_JITTER);
    let jy = ctx.rng.gen_range(-PROJECTILE_AIM_JITTER..PROJECTILE_AIM_JITTER);
    ctx.player.position + Vec2::new(jx as f32, jy as f32)
}

fn fire_projectile(ctx: &mut EncounterContext, target: Vec2) {
    let from = ctx.boss.position;
    let flight = from.distance(target) / ctx.config.boss.projectile_speed;
    ctx.spawn_flying(
        EntityKind::BossProjectile,
        from,
        target,
        PROJECTILE_LAUNCH_ELEVATION,
        flight,
        Easing::InSine,
    );
}
