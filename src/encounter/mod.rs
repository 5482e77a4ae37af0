//! Encounter controller.
//!
//! Owns the [`EncounterContext`] and drives one frame at a time:
//!
//! 1. advance the clock and run due deferred actions
//! 2. handle the start key
//! 3. tick the timer engine
//! 4. player timers (invincibility, blink)
//! 5. player input
//! 6. boss timers
//! 7. dash, entity and boss motion
//! 8. collisions and arena clamping

pub mod config;
pub mod context;
pub mod plugin;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::arena::EntityKind;
use crate::boss::{self, BossAttack, BossState, Phase};
use crate::combat;
use crate::events::{EncounterEvent, Overlay};
use crate::input::{KeyInput, LogicalKey};
use crate::player::{self, supermove, PlayerActionState};
use crate::timer::{TimerName, TimerOwner};

pub use config::{BossTuning, ConfigError, EncounterConfig, PlayerTuning, StageConfig};
pub use context::{DeferredAction, EncounterContext, Outcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: [f32; 2],
    pub facing: f32,
    pub health: u8,
    pub shield: u32,
    pub tension: u32,
    pub supermove_ready: bool,
    pub invincible: bool,
    pub input_locked: bool,
    pub hit_count: u32,
    pub action: PlayerActionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub position: [f32; 2],
    pub elevation: f32,
    pub health: u32,
    pub health_percent: u32,
    pub phase: Phase,
    pub state: BossState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub kind: EntityKind,
    pub position: [f32; 2],
    pub elevation: f32,
}

/// Serializable view of an encounter at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub stage: String,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
    pub inputs_enabled: bool,
    pub player: PlayerSnapshot,
    pub boss: BossSnapshot,
    pub entities: Vec<EntitySnapshot>,
}

impl EncounterSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One player versus one boss.
#[derive(Debug)]
pub struct Encounter {
    ctx: EncounterContext,
    pending_config: Option<EncounterConfig>,
}

impl Encounter {
    /// Build the encounter for `stage` with default tuning.
    pub fn on_encounter_start(stage: StageConfig) -> Self {
        Self::with_config(stage, EncounterConfig::default())
    }

    pub fn with_config(stage: StageConfig, config: EncounterConfig) -> Self {
        tracing::info!(target: "arena_core::encounter", stage = %stage.name, seed = config.seed, "encounter created");
        let mut ctx = EncounterContext::new(stage, config);
        ctx.emit(EncounterEvent::UiFade {
            overlay: Overlay::Title,
            visible: true,
            duration: crate::constants::UI_FADE_DURATION,
        });
        Self {
            ctx,
            pending_config: None,
        }
    }

    /// Advance the encounter by `elapsed` seconds with the keys held this frame.
    pub fn on_tick(&mut self, elapsed: f32, keys: &impl KeyInput) {
        let dt = self.ctx.clock.advance(elapsed);
        for action in self.ctx.deferred.drain_due(self.ctx.now()) {
            self.run_deferred(action);
        }

        // Timers armed by the start key begin counting next frame
        let started = keys.is_key_down(LogicalKey::Start) && !self.is_fighting() && self.begin_fight();

        let ctx = &mut self.ctx;
        let now = ctx.now();
        if !started {
            ctx.timers.tick(dt);
        }

        if ctx.timers.has_finished(TimerOwner::Player, TimerName::Invincibility) {
            combat::end_invincibility(ctx);
        }
        if ctx.timers.has_finished(TimerOwner::Player, TimerName::Blink) {
            combat::blink(ctx);
        }

        player::handle_input(ctx, keys, dt);
        boss::update(ctx);

        player::advance_dash(ctx, dt);
        let report = ctx.entities.advance(dt, now);
        for (id, kind) in report.expired {
            ctx.emit(EncounterEvent::EntityDespawned { id, kind });
        }
        for entity in &report.arrived {
            boss::attacks::projectile_arrived(ctx, entity);
        }
        boss::advance_motion(ctx, dt);

        combat::resolve_collisions(ctx, dt);
    }

    fn run_deferred(&mut self, action: DeferredAction) {
        let ctx = &mut self.ctx;
        match action {
            DeferredAction::FlashOff(body) => ctx.emit(EncounterEvent::FlashOff { body }),
            DeferredAction::DashEnd => player::end_dash(ctx),
            DeferredAction::DashCooldownEnd => ctx.player.actions.dash_cooldown = false,
            DeferredAction::AttackLockEnd => {
                ctx.player.actions.attacking = false;
                player::refresh_animation(ctx);
            }
            DeferredAction::AttackCooldownEnd => ctx.player.actions.attack_cooldown = false,
            DeferredAction::SupermoveStep => supermove::resume(ctx),
            DeferredAction::RangeCueEnd => ctx.player.range_cue_active = false,
            DeferredAction::DeclareOutcome(outcome) => ctx.set_outcome(outcome),
        }
    }

    fn is_fighting(&self) -> bool {
        self.ctx.inputs_enabled && !self.ctx.is_terminal()
    }

    /// What the start key does: arm the first decision and enable inputs,
    /// restarting first if the previous fight is over.
    pub fn begin_fight(&mut self) -> bool {
        if self.is_fighting() {
            return false;
        }
        let over = self.ctx.is_terminal()
            || self.ctx.boss.is_defeated()
            || !self.ctx.player.is_alive()
            || self.ctx.boss.state != BossState::Idle;
        if over {
            self.restart();
        }

        boss::arm_first_decision(&mut self.ctx);
        self.ctx.inputs_enabled = true;
        self.ctx.emit(EncounterEvent::FightStarted);
        self.ctx.emit(EncounterEvent::UiFade {
            overlay: Overlay::Title,
            visible: false,
            duration: crate::constants::UI_FADE_DURATION,
        });
        tracing::info!(target: "arena_core::encounter", stage = %self.ctx.stage.name, "fight started");
        true
    }

    /// Reset the encounter in place; a pending config takes effect here.
    pub fn restart(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.ctx.rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
            self.ctx.config = config;
        }
        self.ctx.reset();
        self.ctx.emit(EncounterEvent::Restarted);
        tracing::info!(target: "arena_core::encounter", "encounter restarted");
    }

    /// Queue new tuning for the next restart.
    pub fn apply_config(&mut self, config: EncounterConfig) {
        tracing::info!(target: "arena_core::encounter", seed = config.seed, "tuning queued for next restart");
        self.pending_config = Some(config);
    }

    // ---- queries ----

    pub fn player_health(&self) -> u8 {
        self.ctx.player.health
    }

    pub fn player_shield(&self) -> u32 {
        self.ctx.player.shield
    }

    pub fn player_tension(&self) -> u32 {
        self.ctx.player.tension
    }

    pub fn boss_health(&self) -> u32 {
        self.ctx.boss.health
    }

    pub fn boss_health_percent(&self) -> u32 {
        let max = self.ctx.boss.max_health.max(1);
        self.ctx.boss.health * 100 / max
    }

    pub fn outcome(&self) -> Outcome {
        self.ctx.outcome
    }

    pub fn supermove_ready(&self) -> bool {
        self.ctx.player.supermove_ready
    }

    pub fn is_input_locked(&self) -> bool {
        player::is_input_locked(&self.ctx)
    }

    pub fn inputs_enabled(&self) -> bool {
        self.ctx.inputs_enabled
    }

    pub fn boss_state(&self) -> BossState {
        self.ctx.boss.state
    }

    pub fn player_action_state(&self) -> PlayerActionState {
        self.ctx.player.actions.state()
    }

    pub fn hit_count(&self) -> u32 {
        self.ctx.player.hit_count
    }

    pub fn phase(&self) -> Phase {
        self.ctx.phase()
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.ctx.now()
    }

    pub fn context(&self) -> &EncounterContext {
        &self.ctx
    }

    /// Direct state access for hosts and test harnesses.
    pub fn context_mut(&mut self) -> &mut EncounterContext {
        &mut self.ctx
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        let ctx = &self.ctx;
        EncounterSnapshot {
            stage: ctx.stage.name.clone(),
            elapsed_ms: ctx.now().as_millis() as u64,
            outcome: ctx.outcome,
            inputs_enabled: ctx.inputs_enabled,
            player: PlayerSnapshot {
                position: ctx.player.position.to_array(),
                facing: ctx.player.facing,
                health: ctx.player.health,
                shield: ctx.player.shield,
                tension: ctx.player.tension,
                supermove_ready: ctx.player.supermove_ready,
                invincible: ctx.player.invincible,
                input_locked: self.is_input_locked(),
                hit_count: ctx.player.hit_count,
                action: ctx.player.actions.state(),
            },
            boss: BossSnapshot {
                position: ctx.boss.position.to_array(),
                elevation: ctx.boss.elevation,
                health: ctx.boss.health,
                health_percent: self.boss_health_percent(),
                phase: ctx.phase(),
                state: ctx.boss.state,
            },
            entities: ctx
                .entities
                .iter()
                .map(|e| EntitySnapshot {
                    id: e.id.0,
                    kind: e.kind,
                    position: e.position.to_array(),
                    elevation: e.elevation,
                })
                .collect(),
        }
    }

    // ---- triggers ----

    pub fn increment_shield(&mut self) {
        combat::increment_shield(&mut self.ctx);
    }

    pub fn activate_supermove(&mut self) -> bool {
        supermove::activate(&mut self.ctx)
    }

    pub fn lock_input_for_supermove(&mut self) {
        player::lock_input_for_supermove(&mut self.ctx);
    }

    /// Debug hook: start `attack` now, bypassing the attack table.
    pub fn force_attack(&mut self, attack: BossAttack) -> bool {
        boss::force_attack(&mut self.ctx, attack)
    }

    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        self.ctx.events.drain()
    }
}
