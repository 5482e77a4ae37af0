//! Logical keys polled by the encounter each tick.
//!
//! The core never talks to a keyboard. Hosts implement [`KeyInput`] (the Bevy
//! adapter maps `ButtonInput<KeyCode>`, the FFI bridge passes a bitmask).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalKey {
    Up,
    Down,
    Left,
    Right,
    Dash,
    Attack,
    Start,
    Supermove,
}

impl LogicalKey {
    pub const ALL: [LogicalKey; 8] = [
        LogicalKey::Up,
        LogicalKey::Down,
        LogicalKey::Left,
        LogicalKey::Right,
        LogicalKey::Dash,
        LogicalKey::Attack,
        LogicalKey::Start,
        LogicalKey::Supermove,
    ];

    /// Bit of this key in a [`KeyState`] mask
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Polled key-down query
pub trait KeyInput {
    fn is_key_down(&self, key: LogicalKey) -> bool;
}

/// Keys held this frame, as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyState {
    mask: u32,
}

impl KeyState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_mask(mask: u32) -> Self {
        Self { mask }
    }

    pub fn pressed(keys: &[LogicalKey]) -> Self {
        Self {
            mask: keys.iter().fold(0, |m, k| m | k.bit()),
        }
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn set(&mut self, key: LogicalKey, down: bool) {
        if down {
            self.mask |= key.bit();
        } else {
            self.mask &= !key.bit();
        }
    }

    pub fn with(mut self, key: LogicalKey) -> Self {
        self.set(key, true);
        self
    }
}

impl KeyInput for KeyState {
    fn is_key_down(&self, key: LogicalKey) -> bool {
        self.mask & key.bit() != 0
    }
}
