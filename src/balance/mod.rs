//! Monte-Carlo balance runs.
//!
//! Two tools for tuning the boss:
//! - sampling each attack-table row many times and comparing the observed
//!   frequencies with the configured weights
//! - running batches of full encounters driven by a scripted pilot, reporting
//!   outcome rates, attack usage and any invariant violations
//!
//! Encounters are independent, so both run on rayon's pool.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::boss::{AttackTable, BossAttack, Phase, Range};
use crate::encounter::{Encounter, EncounterConfig, Outcome, StageConfig};
use crate::events::EncounterEvent;
use crate::input::{KeyState, LogicalKey};
use crate::logging::TimingSpan;
use crate::timer::TimerOwner;

/// Observed vs configured frequency of one attack in one row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackFrequency {
    pub attack: BossAttack,
    pub observed: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowDistribution {
    pub range: Range,
    pub phase: Phase,
    pub samples: u64,
    pub frequencies: Vec<AttackFrequency>,
}

impl RowDistribution {
    /// Largest absolute gap between observed and expected frequency.
    pub fn max_deviation(&self) -> f64 {
        self.frequencies
            .iter()
            .map(|f| (f.observed - f.expected).abs())
            .fold(0.0, f64::max)
    }
}

/// Sample every row of `table` `samples` times.
pub fn sample_attack_distribution(
    table: &AttackTable,
    samples: u64,
    seed: u64,
) -> Vec<RowDistribution> {
    let rows = [
        (Range::Melee, Phase::One),
        (Range::Melee, Phase::Two),
        (Range::Long, Phase::One),
        (Range::Long, Phase::Two),
    ];
    rows.par_iter()
        .enumerate()
        .map(|(i, &(range, phase))| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(i as u64));
            let row = table.row(range, phase);
            let mut counts: HashMap<BossAttack, u64> = HashMap::new();
            for _ in 0..samples {
                *counts.entry(row.pick(&mut rng)).or_default() += 1;
            }
            let frequencies = row
                .attacks()
                .into_iter()
                .map(|attack| AttackFrequency {
                    attack,
                    observed: counts.get(&attack).copied().unwrap_or(0) as f64
                        / samples.max(1) as f64,
                    expected: row.probability(attack),
                })
                .collect();
            RowDistribution {
                range,
                phase,
                samples,
                frequencies,
            }
        })
        .collect()
}

/// Scripted player behavior for simulated fights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pilot {
    /// Starts the fight and never moves
    Idle,
    /// Closes in with forward dashes and slashes whenever in range
    Aggressive,
    /// Back-dashes for tension, slashes when the boss comes close
    Evasive,
}

impl Pilot {
    pub const ALL: [Pilot; 3] = [Pilot::Idle, Pilot::Aggressive, Pilot::Evasive];

    /// Keys held this tick.
    pub fn keys(self, encounter: &Encounter) -> KeyState {
        let ctx = encounter.context();
        let mut keys = KeyState::none();
        if !ctx.inputs_enabled {
            return if ctx.is_terminal() {
                keys
            } else {
                keys.with(LogicalKey::Start)
            };
        }
        let in_range = ctx.distance() < ctx.config.player.attack_range;
        match self {
            Pilot::Idle => {}
            Pilot::Aggressive => {
                if in_range {
                    keys.set(LogicalKey::Attack, true);
                } else {
                    keys.set(LogicalKey::Up, true);
                    keys.set(LogicalKey::Dash, true);
                }
            }
            Pilot::Evasive => {
                if in_range {
                    keys.set(LogicalKey::Attack, true);
                    keys.set(LogicalKey::Down, true);
                    keys.set(LogicalKey::Dash, true);
                } else {
                    keys.set(LogicalKey::Left, true);
                }
            }
        }
        if ctx.player.supermove_ready && in_range {
            keys.set(LogicalKey::Supermove, true);
        }
        keys
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub encounter_count: u64,
    pub base_seed: u64,
    pub stage: StageConfig,
    pub tuning: EncounterConfig,
    pub pilot: Pilot,
    /// Fixed frame time in seconds
    pub tick: f32,
    /// Fights still unresolved after this long count as timeouts
    pub max_seconds: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            encounter_count: 1_000,
            base_seed: 42,
            stage: StageConfig::stage2(),
            tuning: EncounterConfig::default(),
            pilot: Pilot::Aggressive,
            tick: 1.0 / 60.0,
            max_seconds: 180.0,
        }
    }
}

/// Result of one simulated fight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterResult {
    pub seed: u64,
    pub outcome: Outcome,
    pub seconds: f32,
    pub boss_health_left: u32,
    pub hits_taken: u32,
    pub decisions: u32,
    pub attacks: Vec<BossAttack>,
    pub violations: Vec<String>,
}

/// Run one fight to its outcome or the time limit.
pub fn simulate_encounter(config: &SimConfig, seed: u64) -> EncounterResult {
    let mut tuning = config.tuning.clone();
    tuning.seed = seed;
    let mut encounter = Encounter::with_config(config.stage.clone(), tuning);

    let max_ticks = (config.max_seconds / config.tick).ceil() as u64;
    let mut attacks = Vec::new();
    let mut violations = Vec::new();
    let mut defeated = false;

    for _ in 0..max_ticks {
        let keys = config.pilot.keys(&encounter);
        encounter.on_tick(config.tick, &keys);

        for event in encounter.drain_events() {
            match event {
                EncounterEvent::AttackChosen { attack } => {
                    if defeated {
                        violations.push(format!("{attack:?} chosen after defeat"));
                    }
                    attacks.push(attack);
                }
                EncounterEvent::BossDefeated => defeated = true,
                _ => {}
            }
        }
        check_invariants(&encounter, &mut violations);

        if encounter.outcome().is_terminal() {
            break;
        }
    }

    let ctx = encounter.context();
    EncounterResult {
        seed,
        outcome: encounter.outcome(),
        seconds: encounter.elapsed().as_secs_f32(),
        boss_health_left: ctx.boss.health,
        hits_taken: ctx.player.hit_count,
        decisions: ctx.boss.decisions,
        attacks,
        violations,
    }
}

fn check_invariants(encounter: &Encounter, violations: &mut Vec<String>) {
    let ctx = encounter.context();
    let at = ctx.now().as_millis();
    if ctx.boss.health > ctx.boss.max_health {
        violations.push(format!("{at}ms: boss health {} above max", ctx.boss.health));
    }
    if ctx.player.health > ctx.player.max_health {
        violations.push(format!("{at}ms: player health {} above max", ctx.player.health));
    }
    if ctx.player.tension > crate::constants::TENSION_MAX {
        violations.push(format!("{at}ms: tension {} above max", ctx.player.tension));
    }
    if !ctx.bounds.contains(ctx.player.position) {
        violations.push(format!("{at}ms: player left the arena"));
    }
    if (ctx.is_terminal() || ctx.boss.is_defeated()) && ctx.timers.active_count(TimerOwner::Boss) > 0
    {
        violations.push(format!("{at}ms: boss timers running after the fight ended"));
    }
}

/// Aggregate of a batch of simulated fights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub pilot: Pilot,
    pub total: u64,
    pub wins: u64,
    pub losses: u64,
    pub timeouts: u64,
    pub win_rate: f32,
    pub avg_seconds: f32,
    pub avg_hits_taken: f32,
    pub attack_usage: Vec<(BossAttack, u64)>,
    pub violations: Vec<(u64, String)>,
}

impl BalanceReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Run `encounter_count` fights in parallel.
pub fn run_balance_simulation(config: &SimConfig) -> BalanceReport {
    let _span = TimingSpan::new("balance_simulation");
    let results: Vec<EncounterResult> = (0..config.encounter_count)
        .into_par_iter()
        .map(|i| simulate_encounter(config, config.base_seed.wrapping_add(i)))
        .collect();
    let report = analyze_results(config.pilot, &results);
    tracing::info!(
        target: "arena_core::balance",
        pilot = ?report.pilot,
        total = report.total,
        win_rate = report.win_rate,
        violations = report.violations.len(),
        "balance batch finished"
    );
    report
}

fn analyze_results(pilot: Pilot, results: &[EncounterResult]) -> BalanceReport {
    let total = results.len() as u64;
    let count = |o: Outcome| results.iter().filter(|r| r.outcome == o).count() as u64;
    let (wins, losses, timeouts) = (
        count(Outcome::Won),
        count(Outcome::Lost),
        count(Outcome::Unresolved),
    );
    let mean = |f: &dyn Fn(&EncounterResult) -> f32| {
        if results.is_empty() {
            0.0
        } else {
            results.iter().map(f).sum::<f32>() / results.len() as f32
        }
    };

    let mut usage: HashMap<BossAttack, u64> = HashMap::new();
    for attack in results.iter().flat_map(|r| &r.attacks) {
        *usage.entry(*attack).or_default() += 1;
    }
    let attack_usage = BossAttack::ALL
        .iter()
        .map(|a| (*a, usage.get(a).copied().unwrap_or(0)))
        .collect();

    BalanceReport {
        pilot,
        total,
        wins,
        losses,
        timeouts,
        win_rate: if total == 0 { 0.0 } else { wins as f32 / total as f32 },
        avg_seconds: mean(&|r| r.seconds),
        avg_hits_taken: mean(&|r| r.hits_taken as f32),
        attack_usage,
        violations: results
            .iter()
            .flat_map(|r| r.violations.iter().map(move |v| (r.seed, v.clone())))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(pilot: Pilot) -> SimConfig {
        SimConfig {
            encounter_count: 8,
            pilot,
            max_seconds: 60.0,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_distribution_matches_weights() {
        let rows = sample_attack_distribution(&AttackTable::default(), 20_000, 7);
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert!(
                row.max_deviation() < 0.02,
                "{:?}/{:?} deviates by {}",
                row.range,
                row.phase,
                row.max_deviation()
            );
        }
    }

    #[test]
    fn test_idle_pilot_batch_has_no_violations() {
        let report = run_balance_simulation(&small(Pilot::Idle));
        assert_eq!(report.total, 8);
        assert_eq!(report.wins, 0);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
        assert!(report.attack_usage.iter().map(|(_, n)| n).sum::<u64>() > 0);
    }

    #[test]
    fn test_aggressive_pilot_batch_has_no_violations() {
        let report = run_balance_simulation(&small(Pilot::Aggressive));
        assert_eq!(report.wins + report.losses + report.timeouts, 8);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let config = small(Pilot::Evasive);
        let a = simulate_encounter(&config, 11);
        let b = simulate_encounter(&config, 11);
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.attacks, b.attacks);
        assert_eq!(a.hits_taken, b.hits_taken);
    }

    #[test]
    fn test_report_json() {
        let report = run_balance_simulation(&SimConfig {
            encounter_count: 2,
            max_seconds: 5.0,
            ..SimConfig::default()
        });
        let json = report.to_json();
        assert!(json.contains("win_rate"));
        assert!(json.contains("attack_usage"));
    }
}
