//! Arena Combat Core Library
//!
//! Deterministic game logic for a one-on-one boss arena:
//! - Timer engine with a per-tick deferred action queue
//! - Boss attack state machine (weighted tables keyed on range and phase)
//! - Player actions (walk, dash, attack, supermove)
//! - Combat resolution (damage, invincibility, tension, outcome)
//! - Presentation events for the host to render
//! - Bevy plugin and FFI bridge for hosts

pub mod arena;
pub mod balance;
pub mod boss;
pub mod bridge;
pub mod combat;
pub mod constants;
pub mod encounter;
pub mod events;
pub mod hotreload;
pub mod input;
pub mod logging;
pub mod player;
pub mod timer;

pub use encounter::{Encounter, EncounterConfig, EncounterSnapshot, Outcome, StageConfig};
pub use events::EncounterEvent;
pub use input::{KeyInput, KeyState, LogicalKey};
