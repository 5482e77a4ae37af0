//! Weighted attack selection keyed on range and health phase.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::attacks::BossAttack;

/// Distance bucket between player and boss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Range {
    Melee,
    Long,
}

impl Range {
    pub fn classify(distance: f32, melee_range: f32) -> Self {
        if distance < melee_range {
            Range::Melee
        } else {
            Range::Long
        }
    }
}

/// Boss health phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    One,
    Two,
}

impl Phase {
    /// Phase one while health stays above `threshold`.
    pub fn from_health(health: u32, threshold: u32) -> Self {
        if health > threshold {
            Phase::One
        } else {
            Phase::Two
        }
    }
}

/// One weighted row of the attack table
///
/// Serialized as a list of `(attack, weight)` pairs; a row that cannot be
/// sampled is rejected on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(BossAttack, u32)>", into = "Vec<(BossAttack, u32)>")]
pub struct AttackRow {
    entries: Vec<(BossAttack, u32)>,
}

impl AttackRow {
    /// Build a row; `None` if the row is empty or every weight is zero.
    pub fn new(entries: &[(BossAttack, u32)]) -> Option<Self> {
        if entries.iter().all(|(_, w)| *w == 0) {
            return None;
        }
        Some(Self {
            entries: entries.to_vec(),
        })
    }

    /// Weighted pick; `RandomMove` if the row cannot be sampled.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> BossAttack {
        self.entries
            .choose_weighted(rng, |(_, w)| *w)
            .map(|(attack, _)| *attack)
            .unwrap_or(BossAttack::RandomMove)
    }

    pub fn attacks(&self) -> Vec<BossAttack> {
        self.entries.iter().map(|(a, _)| *a).collect()
    }

    /// Probability of `attack` in this row
    pub fn probability(&self, attack: BossAttack) -> f64 {
        let total: u32 = self.entries.iter().map(|(_, w)| w).sum();
        let weight: u32 = self
            .entries
            .iter()
            .filter(|(a, _)| *a == attack)
            .map(|(_, w)| w)
            .sum();
        weight as f64 / total as f64
    }
}

impl TryFrom<Vec<(BossAttack, u32)>> for AttackRow {
    type Error = String;

    fn try_from(entries: Vec<(BossAttack, u32)>) -> Result<Self, Self::Error> {
        Self::new(&entries).ok_or_else(|| "attack row needs at least one positive weight".to_string())
    }
}

impl From<AttackRow> for Vec<(BossAttack, u32)> {
    fn from(row: AttackRow) -> Self {
        row.entries
    }
}

/// Attack weights for every `(Range, Phase)` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackTable {
    melee_one: AttackRow,
    melee_two: AttackRow,
    long_one: AttackRow,
    long_two: AttackRow,
}

impl AttackTable {
    pub fn row(&self, range: Range, phase: Phase) -> &AttackRow {
        match (range, phase) {
            (Range::Melee, Phase::One) => &self.melee_one,
            (Range::Melee, Phase::Two) => &self.melee_two,
            (Range::Long, Phase::One) => &self.long_one,
            (Range::Long, Phase::Two) => &self.long_two,
        }
    }

    pub fn pick<R: Rng>(&self, range: Range, phase: Phase, rng: &mut R) -> BossAttack {
        self.row(range, phase).pick(rng)
    }
}

impl Default for AttackTable {
    fn default() -> Self {
        use BossAttack::*;
        let row = |entries: &[(BossAttack, u32)]| AttackRow {
            entries: entries.to_vec(),
        };
        Self {
            melee_one: row(&[
                (FloorBlast, 1),
                (ChainTripleShot, 1),
                (MeleeShot, 1),
                (RandomMove, 1),
            ]),
            melee_two: row(&[(RushFloorBlast, 1), (ChainTripleShot, 1), (ChainMove, 2)]),
            long_one: row(&[(ChainTripleShot, 1), (RandomMove, 3)]),
            long_two: row(&[(RushFloorBlast, 1), (ChainMove, 1), (RandomMove, 3)]),
        }
    }
}
