//! Mutable state shared by every component of one encounter.
//!
//! Components receive `&mut EncounterContext` instead of reaching for
//! globals; restart resets it in place.

use bevy::math::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::{EncounterConfig, StageConfig};
use crate::arena::{ArenaBounds, Easing, EntityId, EntityKind, EntityStore};
use crate::boss::selection::Phase;
use crate::boss::Boss;
use crate::events::{Body, EncounterEvent, EventLog};
use crate::player::Player;
use crate::timer::{secs, Clock, DeferredQueue, TimerEngine};

/// How the encounter ended, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Unresolved,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Unresolved
    }
}

/// Short fixed-duration effects run from the deferred queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    FlashOff(Body),
    DashEnd,
    DashCooldownEnd,
    AttackLockEnd,
    AttackCooldownEnd,
    SupermoveStep,
    RangeCueEnd,
    DeclareOutcome(Outcome),
}

#[derive(Debug)]
pub struct EncounterContext {
    pub config: EncounterConfig,
    pub stage: StageConfig,
    pub bounds: ArenaBounds,
    pub clock: Clock,
    pub timers: TimerEngine,
    pub deferred: DeferredQueue<DeferredAction>,
    pub entities: EntityStore,
    pub events: EventLog,
    pub rng: Xoshiro256PlusPlus,
    pub player: Player,
    pub boss: Boss,
    pub outcome: Outcome,
    /// False before the fight starts and after it ends
    pub inputs_enabled: bool,
}

impl EncounterContext {
    pub fn new(stage: StageConfig, config: EncounterConfig) -> Self {
        let bounds = ArenaBounds::new(stage.field_width, stage.field_height);
        Self {
            player: Player::new(stage.player_position(), &config.player),
            boss: Boss::new(stage.boss_position(), &config.boss),
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            bounds,
            clock: Clock::default(),
            timers: TimerEngine::new(),
            deferred: DeferredQueue::new(),
            entities: EntityStore::new(),
            events: EventLog::default(),
            outcome: Outcome::Unresolved,
            inputs_enabled: false,
            config,
            stage,
        }
    }

    /// Put everything back to the state right after construction.
    ///
    /// The RNG is not reseeded so consecutive fights differ.
    pub fn reset(&mut self) {
        self.bounds = ArenaBounds::new(self.stage.field_width, self.stage.field_height);
        self.player = Player::new(self.stage.player_position(), &self.config.player);
        self.boss = Boss::new(self.stage.boss_position(), &self.config.boss);
        self.clock.reset();
        self.timers.clear();
        self.deferred.clear();
        self.entities.clear();
        self.outcome = Outcome::Unresolved;
        self.inputs_enabled = false;
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn emit(&mut self, event: EncounterEvent) {
        self.events.push(event);
    }

    /// Run `action` after `seconds` of encounter time.
    pub fn defer(&mut self, seconds: f32, action: DeferredAction) {
        let now = self.now();
        self.deferred.schedule(now, secs(seconds), action);
    }

    pub fn distance(&self) -> f32 {
        self.player.position.distance(self.boss.position)
    }

    pub fn phase(&self) -> Phase {
        Phase::from_health(self.boss.health, self.config.boss.phase_two_threshold)
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Move to a terminal outcome; ignored once one is set.
    pub fn set_outcome(&mut self, outcome: Outcome) {
        if self.outcome.is_terminal() || !outcome.is_terminal() {
            return;
        }
        self.outcome = outcome;
        self.inputs_enabled = false;
        tracing::info!(target: "arena_core::encounter", ?outcome, elapsed = ?self.now(), "encounter resolved");
        self.emit(EncounterEvent::OutcomeChanged { outcome });
        let overlay = match outcome {
            Outcome::Won => crate::events::Overlay::Victory,
            _ => crate::events::Overlay::Defeat,
        };
        self.emit(EncounterEvent::UiFade {
            overlay,
            visible: true,
            duration: crate::constants::UI_FADE_DURATION,
        });
    }

    /// Flash `body` for `seconds`.
    pub fn flash(&mut self, body: Body, seconds: f32) {
        self.emit(EncounterEvent::FlashOn { body });
        self.defer(seconds, DeferredAction::FlashOff(body));
    }

    pub fn spawn(&mut self, kind: EntityKind, position: Vec2, elevation: f32) -> EntityId {
        let id = self.entities.spawn(kind, position, elevation);
        self.emit(EncounterEvent::EntitySpawned {
            id,
            kind,
            position: position.to_array(),
            elevation,
        });
        id
    }

    /// Spawn an entity destroyed after `lifetime` seconds.
    pub fn spawn_timed(
        &mut self,
        kind: EntityKind,
        position: Vec2,
        elevation: f32,
        lifetime: f32,
    ) -> EntityId {
        let id = self.spawn(kind, position, elevation);
        let at = self.now() + secs(lifetime);
        self.entities.set_expiry(id, at);
        id
    }

    pub fn spawn_flying(
        &mut self,
        kind: EntityKind,
        from: Vec2,
        to: Vec2,
        elevation: f32,
        duration: f32,
        easing: Easing,
    ) -> EntityId {
        let id = self
            .entities
            .spawn_flying(kind, from, to, elevation, secs(duration), easing);
        self.emit(EncounterEvent::EntitySpawned {
            id,
            kind,
            position: from.to_array(),
            elevation,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.despawn(id) {
            self.emit(EncounterEvent::EntityDespawned {
                id,
                kind: entity.kind,
            });
        }
    }
}
