//! End-to-end encounter scenarios
//!
//! Each test drives a real `Encounter` through its public surface and checks
//! timing to the millisecond:
//! - attack distribution of the phase-one melee row
//! - invincibility window after a hit
//! - lethal boss damage with a decision pending
//! - the supermove cut sequence and its input lock

use bevy::math::Vec2;
use std::collections::HashMap;
use std::time::Duration;

use arena_core::arena::EntityKind;
use arena_core::boss::{self, BossAttack, BossState, Phase};
use arena_core::combat;
use arena_core::encounter::{Encounter, EncounterConfig, Outcome, StageConfig};
use arena_core::events::EncounterEvent;
use arena_core::input::{KeyState, LogicalKey};
use arena_core::timer::{TimerName, TimerOwner};

fn encounter(seed: u64) -> Encounter {
    Encounter::with_config(StageConfig::stage2(), EncounterConfig::with_seed(seed))
}

fn idle() -> KeyState {
    KeyState::none()
}

fn ms(encounter: &Encounter) -> u128 {
    encounter.elapsed().as_millis()
}

fn tick_until(encounter: &mut Encounter, target_ms: u128) {
    while ms(encounter) < target_ms {
        encounter.on_tick(0.01, &idle());
    }
}

// ============================================================
// Scenario A: attack distribution
// ============================================================

#[test]
fn phase_one_melee_decisions_follow_weights() {
    let mut enc = encounter(2024);
    let mut counts: HashMap<BossAttack, u32> = HashMap::new();

    for _ in 0..1000 {
        let ctx = enc.context_mut();
        ctx.timers.clear();
        ctx.entities.clear();
        ctx.boss.state = BossState::Cooldown;
        ctx.player.position = ctx.boss.position - Vec2::new(40.0, 0.0);
        assert_eq!(ctx.phase(), Phase::One);

        ctx.timers
            .start_once(TimerOwner::Boss, TimerName::AttackDecision, 0.0);
        ctx.timers.tick(Duration::ZERO);
        boss::update(ctx);

        for event in enc.drain_events() {
            if let EncounterEvent::AttackChosen { attack } = event {
                *counts.entry(attack).or_default() += 1;
            }
        }
    }

    assert_eq!(counts.values().sum::<u32>(), 1000);
    for attack in [
        BossAttack::FloorBlast,
        BossAttack::ChainTripleShot,
        BossAttack::MeleeShot,
        BossAttack::RandomMove,
    ] {
        let share = counts.get(&attack).copied().unwrap_or(0) as f32 / 1000.0;
        assert!(
            (share - 0.25).abs() < 0.06,
            "{attack:?} chosen {share} of the time"
        );
    }
    assert_eq!(counts.len(), 4, "unexpected attacks: {counts:?}");
}

// ============================================================
// Scenario B: invincibility window
// ============================================================

#[test]
fn second_hit_within_window_is_ignored() {
    let mut enc = encounter(1);
    assert_eq!(enc.player_health(), 2);

    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.player_health(), 1);

    enc.on_tick(0.1, &idle());
    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.player_health(), 1);
    assert_eq!(enc.hit_count(), 1);

    while ms(&enc) < 1990 {
        enc.on_tick(0.01, &idle());
    }
    assert!(enc.context().player.invincible);

    enc.on_tick(0.01, &idle());
    assert_eq!(ms(&enc), 2000);
    assert!(!enc.context().player.invincible);
    assert!(enc.drain_events().contains(&EncounterEvent::BlinkStopped));

    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.player_health(), 0);
    assert_eq!(enc.outcome(), Outcome::Unresolved);
}

#[test]
fn hit_at_zero_health_loses_the_fight() {
    let mut enc = encounter(1);
    enc.begin_fight();
    enc.context_mut().player.health = 0;

    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.outcome(), Outcome::Lost);
    assert!(!enc.inputs_enabled());
    assert_eq!(enc.context().timers.active_count(TimerOwner::Boss), 0);
    assert!(enc.drain_events().contains(&EncounterEvent::PlayerDied));
}

// ============================================================
// Scenario C: lethal damage with a decision pending
// ============================================================

#[test]
fn lethal_damage_stops_boss_and_wins_after_delay() {
    let mut enc = encounter(7);
    enc.begin_fight();
    for _ in 0..50 {
        enc.on_tick(0.01, &idle());
    }
    assert!(enc
        .context()
        .timers
        .is_active(TimerOwner::Boss, TimerName::AttackDecision));
    enc.drain_events();

    enc.context_mut().boss.health = 5;
    combat::apply_boss_damage(enc.context_mut(), 10);

    assert_eq!(enc.context().boss.health, 0);
    assert_eq!(enc.boss_state(), BossState::Defeated);
    assert_eq!(enc.context().timers.active_count(TimerOwner::Boss), 0);
    assert_eq!(enc.outcome(), Outcome::Unresolved);

    let defeated_at = ms(&enc);
    let mut chosen_after = 0;
    while ms(&enc) < defeated_at + 1990 {
        enc.on_tick(0.01, &idle());
        chosen_after += enc
            .drain_events()
            .iter()
            .filter(|e| matches!(e, EncounterEvent::AttackChosen { .. }))
            .count();
    }
    assert_eq!(enc.outcome(), Outcome::Unresolved);

    enc.on_tick(0.01, &idle());
    assert_eq!(ms(&enc), defeated_at + 2000);
    assert_eq!(enc.outcome(), Outcome::Won);
    assert!(!enc.inputs_enabled());
    assert_eq!(chosen_after, 0);
    assert_eq!(enc.context().boss.decisions, 0);
}

// ============================================================
// Scenario D: supermove
// ============================================================

#[test]
fn supermove_cuts_every_100ms_and_locks_input() {
    let mut enc = encounter(3);
    enc.begin_fight();
    combat::increment_tension(enc.context_mut(), 80);
    assert!(enc.supermove_ready());

    {
        let ctx = enc.context_mut();
        ctx.player.position = ctx.boss.position - Vec2::new(300.0, 0.0);
    }
    assert!(enc.activate_supermove());
    assert_eq!(enc.player_tension(), 0);
    assert!(!enc.supermove_ready());
    assert!(enc.is_input_locked());

    let mut cut_times = Vec::new();
    let mut record = |enc: &mut Encounter| {
        let now = ms(enc);
        for event in enc.drain_events() {
            if let EncounterEvent::EntitySpawned {
                kind: EntityKind::CutEffect,
                ..
            } = event
            {
                cut_times.push(now);
            }
        }
    };
    record(&mut enc);

    while ms(&enc) < 890 {
        enc.on_tick(0.01, &idle());
        record(&mut enc);
        assert!(enc.is_input_locked(), "unlocked early at {}ms", ms(&enc));
    }
    enc.on_tick(0.01, &idle());
    assert_eq!(ms(&enc), 900);
    assert!(!enc.is_input_locked());

    assert_eq!(cut_times, vec![0, 100, 200, 300, 400, 500, 600]);
    assert!(enc.context().player.supermove.is_none());
}

#[test]
fn supermove_cuts_damage_boss_in_range() {
    let mut enc = encounter(3);
    enc.begin_fight();
    combat::increment_tension(enc.context_mut(), 80);
    {
        let ctx = enc.context_mut();
        ctx.player.position = ctx.boss.position - Vec2::new(100.0, 0.0);
    }
    assert!(enc.activate_supermove());
    for _ in 0..80 {
        enc.on_tick(0.01, &idle());
    }
    assert!(enc.context().boss.health < 100);
    assert_eq!((100 - enc.context().boss.health) % 3, 0);
}

// ============================================================
// Start and restart flow
// ============================================================

#[test]
fn start_after_loss_restarts_fight() {
    let mut enc = encounter(5);
    enc.begin_fight();
    enc.context_mut().player.health = 0;
    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.outcome(), Outcome::Lost);
    enc.drain_events();

    assert!(enc.begin_fight());
    assert_eq!(enc.outcome(), Outcome::Unresolved);
    assert_eq!(enc.player_health(), 2);
    assert!(enc.inputs_enabled());
    assert!(enc.context().player.is_alive());
    let events = enc.drain_events();
    let restarted = events
        .iter()
        .position(|e| *e == EncounterEvent::Restarted)
        .unwrap();
    let started = events
        .iter()
        .position(|e| *e == EncounterEvent::FightStarted)
        .unwrap();
    assert!(restarted < started);
}

#[test]
fn boss_acts_on_its_own_once_started() {
    let mut enc = encounter(11);
    enc.begin_fight();
    for _ in 0..600 {
        enc.on_tick(1.0 / 60.0, &idle());
    }
    assert!(enc.context().boss.decisions >= 2);
}

#[test]
fn start_frame_slash_uses_the_restarted_clock() {
    let stage = StageConfig {
        name: "duel".into(),
        field_width: 1024.0,
        field_height: 768.0,
        player_spawn: [300.0, 300.0],
        boss_spawn: [340.0, 300.0],
    };
    let mut enc = Encounter::with_config(stage, EncounterConfig::with_seed(8));
    enc.begin_fight();
    tick_until(&mut enc, 300);
    enc.context_mut().player.health = 0;
    combat::player_got_hit(enc.context_mut());
    assert_eq!(enc.outcome(), Outcome::Lost);

    enc.on_tick(0.016, &KeyState::pressed(&[LogicalKey::Start, LogicalKey::Attack]));
    assert_eq!(ms(&enc), 0);
    assert_eq!(enc.context().entities.count(EntityKind::SlashEffect), 1);

    tick_until(&mut enc, 90);
    assert_eq!(enc.context().entities.count(EntityKind::SlashEffect), 1);
    tick_until(&mut enc, 100);
    assert_eq!(enc.context().entities.count(EntityKind::SlashEffect), 0);
}

// ============================================================
// Player action windows, 10 ms resolution
// ============================================================

#[test]
fn dash_ends_at_300ms_and_cooldown_clears_at_500ms() {
    let mut enc = encounter(3);
    enc.begin_fight();
    enc.on_tick(0.01, &KeyState::pressed(&[LogicalKey::Dash, LogicalKey::Up]));
    let start = ms(&enc);
    let base = enc.context().player.base_speed;
    let boosted = base * enc.context().player.dash_multiplier * 2.0;
    assert!(enc.context().player.actions.dashing.is_some());
    assert_eq!(enc.context().player.speed, boosted);

    tick_until(&mut enc, start + 290);
    assert!(enc.context().player.actions.dashing.is_some());
    assert_eq!(enc.context().player.speed, boosted);
    tick_until(&mut enc, start + 300);
    assert!(enc.context().player.actions.dashing.is_none());
    assert_eq!(enc.context().player.speed, base);

    tick_until(&mut enc, start + 490);
    assert!(enc.context().player.actions.dash_cooldown);
    tick_until(&mut enc, start + 500);
    assert!(!enc.context().player.actions.dash_cooldown);
}

#[test]
fn attack_lock_ends_at_500ms_and_cooldown_clears_at_1s() {
    let mut enc = encounter(3);
    enc.begin_fight();
    enc.on_tick(0.01, &KeyState::pressed(&[LogicalKey::Attack]));
    let start = ms(&enc);
    assert!(enc.context().player.actions.attacking);
    assert!(enc.context().player.actions.attack_cooldown);

    tick_until(&mut enc, start + 490);
    assert!(enc.context().player.actions.attacking);
    tick_until(&mut enc, start + 500);
    assert!(!enc.context().player.actions.attacking);

    tick_until(&mut enc, start + 600);
    enc.on_tick(0.01, &KeyState::pressed(&[LogicalKey::Attack]));
    assert!(!enc.context().player.actions.attacking);

    tick_until(&mut enc, start + 990);
    assert!(enc.context().player.actions.attack_cooldown);
    tick_until(&mut enc, start + 1000);
    assert!(!enc.context().player.actions.attack_cooldown);
}

// ============================================================
// Fight over while shots are in the air
// ============================================================

#[test]
fn arrivals_after_a_lethal_hit_leave_nothing_behind() {
    let mut enc = encounter(9);
    enc.begin_fight();
    enc.context_mut().player.health = 0;
    assert!(enc.force_attack(BossAttack::TripleShot));
    enc.on_tick(0.5, &idle());
    assert_eq!(enc.context().entities.count(EntityKind::BossProjectile), 3);

    enc.on_tick(3.0, &idle());
    assert_eq!(enc.outcome(), Outcome::Lost);
    assert_eq!(enc.context().entities.count(EntityKind::Explosion), 0);
    assert_eq!(enc.context().entities.count(EntityKind::BossProjectile), 0);
}
