//! Boss attack state machine.
//!
//! Decisions come from the `AttackDecision` timer; every attack then runs on
//! boss-owned timers checked in a fixed order each tick. Defeat stops all
//! boss timers, so no decision is evaluated afterwards.

pub mod attacks;
pub mod selection;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::arena::{direction, facing_angle, EntityKind, Easing, Tween, TweenSequence};
use crate::constants::{
    BOSS_BOUNCE_DURATION, BOSS_BOUNCE_HEIGHT, BOSS_DEAD_ELEVATION, BOSS_FIRST_DECISION_DELAY,
    BOSS_KNOCKBACK_DURATION, BOSS_SINK_DURATION,
};
use crate::encounter::config::BossTuning;
use crate::encounter::EncounterContext;
use crate::events::{Body, BossPose, EncounterEvent};
use crate::timer::{secs, TimerName, TimerOwner};

pub use attacks::BossAttack;
pub use selection::{AttackRow, AttackTable, Phase, Range};

const BOSS: TimerOwner = TimerOwner::Boss;

/// Glide duration of a random reposition
const GLIDE_DURATION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossState {
    /// No decision armed yet
    Idle,
    Windup(BossAttack),
    Active(BossAttack),
    /// Back in the idle pose while an indicator is still pending
    Resolving(BossAttack),
    /// Waiting for the next decision
    Cooldown,
    Defeated,
}

#[derive(Debug, Clone)]
pub struct Boss {
    pub position: Vec2,
    /// Negative once sunk, positive during a hit bounce
    pub elevation: f32,
    pub health: u32,
    pub max_health: u32,
    pub state: BossState,
    pub pose: BossPose,
    pub table: AttackTable,
    /// Decisions taken this fight
    pub decisions: u32,
    chain_fired: u8,
    glide: Option<Tween<Vec2>>,
    lift: TweenSequence<f32>,
}

impl Boss {
    pub fn new(position: Vec2, tuning: &BossTuning) -> Self {
        Self {
            position,
            elevation: 0.0,
            health: tuning.max_health,
            max_health: tuning.max_health,
            state: BossState::Idle,
            pose: BossPose::Idle,
            table: tuning.attack_table.clone(),
            decisions: 0,
            chain_fired: 0,
            glide: None,
            lift: TweenSequence::default(),
        }
    }

    /// Unit vector from the boss toward `target`
    pub fn forward_to(&self, target: Vec2) -> Vec2 {
        direction(facing_angle(self.position, target))
    }

    /// Attack in progress, if any
    pub fn current_attack(&self) -> Option<BossAttack> {
        match self.state {
            BossState::Windup(a) | BossState::Active(a) | BossState::Resolving(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.state == BossState::Defeated
    }
}

/// Arm the first decision of a fight.
pub fn arm_first_decision(ctx: &mut EncounterContext) {
    ctx.timers
        .start_once(BOSS, TimerName::AttackDecision, BOSS_FIRST_DECISION_DELAY);
    ctx.boss.state = BossState::Cooldown;
}

/// Evaluate boss timer completions in a fixed order.
pub fn update(ctx: &mut EncounterContext) {
    if ctx.boss.is_defeated() {
        return;
    }

    if ctx.timers.has_finished(BOSS, TimerName::AttackDecision) {
        decide(ctx);
    }

    if ctx.timers.has_finished(BOSS, TimerName::Windup) {
        if let BossState::Windup(attack) = ctx.boss.state {
            ctx.boss.state = BossState::Active(attack);
            set_pose(ctx, BossPose::Attack);
            attacks::execute(ctx, attack);
        }
    }

    if ctx.timers.has_finished(BOSS, TimerName::ChainShot) {
        if let Some(attack) = ctx.boss.current_attack().filter(|a| a.is_chained()) {
            attacks::chain_step(ctx, attack);
        }
    }

    if ctx.timers.has_finished(BOSS, TimerName::HealTick) {
        attacks::heal_tick(ctx);
    }

    if ctx.timers.has_finished(BOSS, TimerName::HealEnd) {
        attacks::heal_end(ctx);
    }

    for (name, kind) in [
        (TimerName::FloorBlastExplosion, EntityKind::FloorBlastIndicator),
        (TimerName::AirBlastExplosion, EntityKind::AirBlastIndicator),
    ] {
        if ctx.timers.has_finished(BOSS, name) {
            attacks::explode_indicators(ctx, kind);
            if matches!(ctx.boss.state, BossState::Resolving(_)) {
                ctx.boss.state = BossState::Cooldown;
            }
        }
    }

    if ctx.timers.has_finished(BOSS, TimerName::BackToIdle) {
        back_to_idle(ctx);
    }
}

/// Pick and begin the next attack.
fn decide(ctx: &mut EncounterContext) {
    let range = Range::classify(ctx.distance(), ctx.config.boss.melee_range);
    let phase = ctx.phase();
    let attack = ctx.boss.table.pick(range, phase, &mut ctx.rng);
    ctx.boss.decisions += 1;
    tracing::debug!(target: "arena_core::boss", ?range, ?phase, ?attack, "attack chosen");
    ctx.emit(EncounterEvent::AttackChosen { attack });
    begin(ctx, attack);
}

/// Start `attack` right away, bypassing the attack table.
///
/// Returns `false` once the boss is defeated or the fight is over.
pub fn force_attack(ctx: &mut EncounterContext, attack: BossAttack) -> bool {
    if ctx.boss.is_defeated() || ctx.is_terminal() {
        return false;
    }
    ctx.timers.stop(BOSS, TimerName::AttackDecision);
    ctx.emit(EncounterEvent::AttackChosen { attack });
    begin(ctx, attack);
    true
}

fn begin(ctx: &mut EncounterContext, attack: BossAttack) {
    if attack == BossAttack::RandomMove {
        ctx.boss.state = BossState::Cooldown;
        attacks::random_move(ctx);
        return;
    }
    ctx.boss.state = BossState::Windup(attack);
    set_pose(ctx, BossPose::Windup);
    ctx.timers.start_once(BOSS, TimerName::Windup, attack.windup());
}

fn back_to_idle(ctx: &mut EncounterContext) {
    set_pose(ctx, BossPose::Idle);
    let pending = ctx.timers.is_active(BOSS, TimerName::FloorBlastExplosion)
        || ctx.timers.is_active(BOSS, TimerName::AirBlastExplosion);
    ctx.boss.state = match ctx.boss.state {
        BossState::Active(attack) if pending => BossState::Resolving(attack),
        BossState::Active(_) => BossState::Cooldown,
        other => other,
    };
}

pub fn set_pose(ctx: &mut EncounterContext, pose: BossPose) {
    if ctx.boss.pose != pose {
        ctx.boss.pose = pose;
        ctx.emit(EncounterEvent::BossPose { pose });
    }
}

/// Push the boss toward `target` with an elastic settle.
pub fn knock_back(ctx: &mut EncounterContext, target: Vec2) {
    let duration = BOSS_KNOCKBACK_DURATION;
    ctx.boss.glide = Some(Tween::new(
        ctx.boss.position,
        target,
        secs(duration),
        Easing::OutElastic,
    ));
    ctx.emit(EncounterEvent::MoveTween {
        body: Body::Boss,
        to: target.to_array(),
        duration,
        easing: Easing::OutElastic,
    });
}

/// Smoothly move the boss to `target`.
pub fn glide_to(ctx: &mut EncounterContext, target: Vec2) {
    ctx.boss.glide = Some(Tween::new(
        ctx.boss.position,
        target,
        secs(GLIDE_DURATION),
        Easing::InOutSine,
    ));
    ctx.emit(EncounterEvent::MoveTween {
        body: Body::Boss,
        to: target.to_array(),
        duration: GLIDE_DURATION,
        easing: Easing::InOutSine,
    });
}

/// Place the boss at `target` instantly.
pub fn teleport(ctx: &mut EncounterContext, target: Vec2) {
    ctx.boss.glide = None;
    ctx.boss.position = target;
    ctx.emit(EncounterEvent::BossTeleported {
        position: target.to_array(),
    });
}

/// Hit-reaction hop: up to the bounce height and back down.
pub fn bounce(ctx: &mut EncounterContext) {
    let d = secs(BOSS_BOUNCE_DURATION);
    let from = ctx.boss.elevation;
    ctx.boss.lift.play([
        Tween::new(from, BOSS_BOUNCE_HEIGHT, d, Easing::InSine),
        Tween::new(BOSS_BOUNCE_HEIGHT, 0.0, d, Easing::InSine),
    ]);
    ctx.emit(EncounterEvent::ElevationTween {
        body: Body::Boss,
        to: BOSS_BOUNCE_HEIGHT,
        duration: BOSS_BOUNCE_DURATION,
        easing: Easing::InSine,
    });
}

/// Death sink below the floor.
pub fn sink(ctx: &mut EncounterContext) {
    let from = ctx.boss.elevation;
    ctx.boss.lift.play([Tween::new(
        from,
        BOSS_DEAD_ELEVATION,
        secs(BOSS_SINK_DURATION),
        Easing::InSine,
    )]);
    ctx.emit(EncounterEvent::ElevationTween {
        body: Body::Boss,
        to: BOSS_DEAD_ELEVATION,
        duration: BOSS_SINK_DURATION,
        easing: Easing::InSine,
    });
}

/// Advance the boss position and elevation tweens.
pub fn advance_motion(ctx: &mut EncounterContext, dt: Duration) {
    if let Some(glide) = ctx.boss.glide.as_mut() {
        ctx.boss.position = glide.advance(dt);
        if glide.is_finished() {
            ctx.boss.glide = None;
        }
    }
    if let Some(elevation) = ctx.boss.lift.advance(dt) {
        ctx.boss.elevation = elevation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::config::{EncounterConfig, StageConfig};

    fn context() -> EncounterContext {
        let mut ctx = EncounterContext::new(StageConfig::stage2(), EncounterConfig::default());
        ctx.inputs_enabled = true;
        ctx
    }

    fn run(ctx: &mut EncounterContext, seconds: f32, step: f32) {
        let ticks = (seconds / step).round() as usize;
        for _ in 0..ticks {
            let dt = ctx.clock.advance(step);
            ctx.timers.tick(dt);
            update(ctx);
            advance_motion(ctx, dt);
            let now = ctx.now();
            ctx.entities.advance(dt, now);
        }
    }

    #[test]
    fn test_first_decision_after_one_second() {
        let mut ctx = context();
        arm_first_decision(&mut ctx);
        run(&mut ctx, 0.9, 0.1);
        assert_eq!(ctx.boss.decisions, 0);
        run(&mut ctx, 0.1, 0.1);
        assert_eq!(ctx.boss.decisions, 1);
    }

    #[test]
    fn test_decisions_follow_configured_table() {
        let mut config = EncounterConfig::default();
        config.boss.attack_table = serde_json::from_value(serde_json::json!({
            "melee_one": [["MeleeShot", 1]],
            "melee_two": [["MeleeShot", 1]],
            "long_one": [["Heal", 1]],
            "long_two": [["Heal", 1]],
        }))
        .unwrap();
        let mut ctx = EncounterContext::new(StageConfig::stage2(), config);
        ctx.inputs_enabled = true;
        arm_first_decision(&mut ctx);
        run(&mut ctx, 1.0, 0.1);
        assert_eq!(ctx.boss.state, BossState::Windup(BossAttack::Heal));
    }

    #[test]
    fn test_floor_blast_timeline() {
        let mut ctx = context();
        assert!(force_attack(&mut ctx, BossAttack::FloorBlast));
        assert_eq!(ctx.boss.state, BossState::Windup(BossAttack::FloorBlast));

        run(&mut ctx, 0.5, 0.1);
        assert_eq!(ctx.boss.state, BossState::Active(BossAttack::FloorBlast));
        assert_eq!(ctx.entities.count(EntityKind::FloorBlastIndicator), 1);

        run(&mut ctx, 0.4, 0.1);
        assert_eq!(ctx.boss.state, BossState::Resolving(BossAttack::FloorBlast));
        assert_eq!(ctx.boss.pose, BossPose::Idle);

        run(&mut ctx, 1.6, 0.1);
        assert_eq!(ctx.boss.state, BossState::Cooldown);
        assert_eq!(ctx.entities.count(EntityKind::FloorBlastIndicator), 0);
        assert_eq!(ctx.entities.count(EntityKind::Explosion), 6);
        // player is far away
        assert_eq!(ctx.player.health, 2);

        run(&mut ctx, 0.5, 0.1);
        assert_eq!(ctx.entities.count(EntityKind::Explosion), 0);
        assert_eq!(ctx.boss.decisions, 1);
    }

    #[test]
    fn test_chain_triple_shot_fires_three() {
        let mut ctx = context();
        force_attack(&mut ctx, BossAttack::ChainTripleShot);
        run(&mut ctx, 0.5, 0.1);
        assert_eq!(ctx.entities.count(EntityKind::BossProjectile), 1);
        run(&mut ctx, 0.6, 0.1);
        assert!(!ctx.timers.is_active(BOSS, TimerName::ChainShot));
        let fired = ctx
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    EncounterEvent::EntitySpawned {
                        kind: EntityKind::BossProjectile,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(fired, 3);
        assert!(ctx.timers.is_active(BOSS, TimerName::AttackDecision));
    }

    #[test]
    fn test_heal_restores_clamped() {
        let mut ctx = context();
        ctx.boss.health = 75;
        force_attack(&mut ctx, BossAttack::Heal);
        run(&mut ctx, 0.5 + 1.2, 0.1);
        assert_eq!(ctx.boss.health, 100);
        assert!(!ctx.timers.is_active(BOSS, TimerName::HealTick));
        assert!(ctx.timers.is_active(BOSS, TimerName::AttackDecision));
    }

    #[test]
    fn test_heal_six_ticks() {
        let mut ctx = context();
        ctx.boss.health = 10;
        force_attack(&mut ctx, BossAttack::Heal);
        run(&mut ctx, 0.5 + 1.2, 0.1);
        assert_eq!(ctx.boss.health, 70);
    }

    #[test]
    fn test_random_move_stays_in_arena() {
        let mut ctx = context();
        force_attack(&mut ctx, BossAttack::RandomMove);
        assert_eq!(ctx.boss.state, BossState::Cooldown);
        run(&mut ctx, 0.5, 0.1);
        assert!(ctx.bounds.contains(ctx.boss.position));
        assert!(ctx.timers.is_active(BOSS, TimerName::AttackDecision));
    }

    #[test]
    fn test_rush_lands_next_to_player() {
        let mut ctx = context();
        force_attack(&mut ctx, BossAttack::RushFloorBlast);
        run(&mut ctx, 0.5, 0.1);
        let expected = ctx.player.position + Vec2::splat(20.0);
        assert!((ctx.boss.position - expected).length() < 1e-3);
        assert_eq!(ctx.entities.count(EntityKind::AirBlastIndicator), 1);
    }

    #[test]
    fn test_force_attack_refused_when_defeated() {
        let mut ctx = context();
        ctx.boss.state = BossState::Defeated;
        assert!(!force_attack(&mut ctx, BossAttack::Heal));
    }

    #[test]
    fn test_bounce_returns_to_ground() {
        let mut ctx = context();
        bounce(&mut ctx);
        advance_motion(&mut ctx, secs(0.1));
        assert!((ctx.boss.elevation - BOSS_BOUNCE_HEIGHT).abs() < 1e-3);
        advance_motion(&mut ctx, secs(0.1));
        assert!(ctx.boss.elevation.abs() < 1e-3);
    }
}
