//! Presentation events emitted by the encounter.
//!
//! The host renders, tweens and plays sounds from these; none of them feed
//! back into combat. Events are buffered per encounter and drained by the host
//! (see [`Encounter::drain_events`](crate::encounter::Encounter::drain_events)).

use bevy::prelude::Event;
use serde::{Deserialize, Serialize};

use crate::arena::{Easing, EntityId, EntityKind};
use crate::boss::BossAttack;
use crate::encounter::Outcome;

/// One of the two bodies in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Body {
    Player,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sound {
    Saber,
    Boost,
    Super,
    /// One of three take-damage variants
    TakeDamage(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPose {
    Idle,
    Windup,
    Attack,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAnimation {
    Idle,
    Walk,
    Dash,
    Attack,
}

/// Host overlays faded in and out around the fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    Title,
    Victory,
    Defeat,
}

#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EncounterEvent {
    FightStarted,
    Restarted,
    EntitySpawned {
        id: EntityId,
        kind: EntityKind,
        position: [f32; 2],
        elevation: f32,
    },
    EntityDespawned {
        id: EntityId,
        kind: EntityKind,
    },
    FlashOn {
        body: Body,
    },
    FlashOff {
        body: Body,
    },
    BlinkStarted,
    BlinkStopped,
    BossPose {
        pose: BossPose,
    },
    BossTeleported {
        position: [f32; 2],
    },
    PlayerAnimation {
        animation: PlayerAnimation,
    },
    MoveTween {
        body: Body,
        to: [f32; 2],
        duration: f32,
        easing: Easing,
    },
    ElevationTween {
        body: Body,
        to: f32,
        duration: f32,
        easing: Easing,
    },
    Sound {
        sound: Sound,
    },
    AttackChosen {
        attack: BossAttack,
    },
    PlayerHit {
        health: u8,
    },
    PlayerDied,
    BossHit {
        damage: u32,
        health: u32,
    },
    BossHealed {
        health: u32,
    },
    BossDefeated,
    OutcomeChanged {
        outcome: Outcome,
    },
    SupermoveReady,
    SupermoveStarted,
    SupermoveFinished,
    AttackRangeCue,
    UiFade {
        overlay: Overlay,
        visible: bool,
        duration: f32,
    },
}

/// Buffer of events awaiting the host
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<EncounterEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: EncounterEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<EncounterEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EncounterEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::default();
        log.push(EncounterEvent::FightStarted);
        log.push(EncounterEvent::SupermoveReady);
        assert_eq!(log.len(), 2);
        let drained = log.drain();
        assert_eq!(drained[1], EncounterEvent::SupermoveReady);
        assert!(log.is_empty());
    }

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_string(&EncounterEvent::BossHit {
            damage: 5,
            health: 95,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"BossHit\""));
        let back: EncounterEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back,
            EncounterEvent::BossHit {
                damage: 5,
                health: 95
            }
        );
    }
}
