use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::ffi::CString;

use arena_core::balance::{self, Pilot, SimConfig};
use arena_core::boss::{AttackTable, Phase, Range};
use arena_core::bridge::*;
use arena_core::encounter::{Encounter, EncounterConfig, StageConfig};
use arena_core::input::{KeyState, LogicalKey};

fn bench_tick(c: &mut Criterion) {
    c.bench_function("encounter_tick_60hz_10s", |b| {
        b.iter(|| {
            let mut enc =
                Encounter::with_config(StageConfig::stage2(), EncounterConfig::with_seed(42));
            enc.begin_fight();
            let keys = KeyState::pressed(&[LogicalKey::Up, LogicalKey::Attack]);
            for _ in 0..600 {
                enc.on_tick(black_box(1.0 / 60.0), &keys);
                black_box(enc.drain_events());
            }
        })
    });

    c.bench_function("encounter_snapshot", |b| {
        let mut enc = Encounter::on_encounter_start(StageConfig::stage2());
        enc.begin_fight();
        for _ in 0..240 {
            enc.on_tick(1.0 / 60.0, &KeyState::none());
        }
        b.iter(|| black_box(enc.snapshot().to_json()))
    });
}

fn bench_selection(c: &mut Criterion) {
    use rand::SeedableRng;
    let table = AttackTable::default();
    let mut rng = rand_xoshiro::Xoshiro256PlusPlus::seed_from_u64(7);
    c.bench_function("attack_table_pick", |b| {
        b.iter(|| black_box(table.pick(Range::Melee, Phase::Two, &mut rng)))
    });
}

fn bench_ffi(c: &mut Criterion) {
    let stage = CString::new(serde_json::to_string(&StageConfig::stage1()).unwrap()).unwrap();
    c.bench_function("ffi_tick_and_drain", |b| {
        let ptr = arena_encounter_new(stage.as_ptr(), 1);
        arena_encounter_start(ptr);
        b.iter(|| {
            arena_encounter_tick(ptr, black_box(1.0 / 60.0), LogicalKey::Up.bit());
            free_string(arena_encounter_drain_events(ptr));
        });
        arena_encounter_free(ptr);
    });
}

fn bench_balance(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance");
    group.sample_size(10);
    group.bench_function("batch_32_aggressive", |b| {
        let config = SimConfig {
            encounter_count: 32,
            pilot: Pilot::Aggressive,
            max_seconds: 60.0,
            ..SimConfig::default()
        };
        b.iter(|| black_box(balance::run_balance_simulation(&config)))
    });
    group.finish();
}

criterion_group!(benches, bench_tick, bench_selection, bench_ffi, bench_balance);
criterion_main!(benches);
