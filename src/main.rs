use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use arena_core::balance::{self, Pilot, SimConfig};
use arena_core::encounter::{Encounter, EncounterConfig, StageConfig};
use arena_core::logging::{self, LogLevel, TracingConfig};

#[derive(Parser)]
#[command(version, about = "Headless runner for the arena combat core")]
struct Cli {
    /// Stage preset name (stage1, stage2) or a .ron/.json stage file
    #[arg(short, long, default_value = "stage2")]
    stage: String,

    /// Tuning file (.ron or .json)
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Overrides the tuning seed
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long, value_enum, default_value_t = PilotArg::Aggressive)]
    pilot: PilotArg,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one fight at 60 Hz and print the final snapshot
    Run {
        #[arg(long, default_value_t = 180.0)]
        seconds: f32,
    },
    /// Run a batch of fights in parallel and print the balance report
    Balance {
        #[arg(short, long, default_value_t = 1_000)]
        count: u64,
        #[arg(long, default_value_t = 180.0)]
        seconds: f32,
    },
    /// Sample the attack tables and print observed frequencies
    Distribution {
        #[arg(short, long, default_value_t = 100_000)]
        samples: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PilotArg {
    Idle,
    Aggressive,
    Evasive,
}

impl From<PilotArg> for Pilot {
    fn from(arg: PilotArg) -> Self {
        match arg {
            PilotArg::Idle => Pilot::Idle,
            PilotArg::Aggressive => Pilot::Aggressive,
            PilotArg::Evasive => Pilot::Evasive,
        }
    }
}

const TICK: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    logging::init_tracing(&TracingConfig::with_level(level));

    let stage = load_stage(&cli.stage)?;
    let mut tuning = match &cli.tuning {
        Some(path) => EncounterConfig::load(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => EncounterConfig::default(),
    };
    if let Some(seed) = cli.seed {
        tuning.seed = seed;
    }
    let pilot = Pilot::from(cli.pilot);

    match cli.command.unwrap_or(Commands::Run { seconds: 180.0 }) {
        Commands::Run { seconds } => run_fight(stage, tuning, pilot, seconds),
        Commands::Balance { count, seconds } => {
            let report = balance::run_balance_simulation(&SimConfig {
                encounter_count: count,
                base_seed: tuning.seed,
                stage,
                tuning,
                pilot,
                tick: TICK,
                max_seconds: seconds,
            });
            println!("{}", report.to_json());
            Ok(())
        }
        Commands::Distribution { samples } => {
            let rows = balance::sample_attack_distribution(
                &tuning.boss.attack_table,
                samples,
                tuning.seed,
            );
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}

fn load_stage(arg: &str) -> Result<StageConfig> {
    if let Some(stage) = StageConfig::preset(arg) {
        return Ok(stage);
    }
    let path = Path::new(arg);
    if !path.exists() {
        bail!("unknown stage {arg:?}: not a preset and no such file");
    }
    StageConfig::load(path).with_context(|| format!("loading stage from {}", path.display()))
}

fn run_fight(stage: StageConfig, tuning: EncounterConfig, pilot: Pilot, seconds: f32) -> Result<()> {
    let mut encounter = Encounter::with_config(stage, tuning);
    let ticks = (seconds / TICK).ceil() as u64;
    for _ in 0..ticks {
        let keys = pilot.keys(&encounter);
        encounter.on_tick(TICK, &keys);
        encounter.drain_events();
        if encounter.outcome().is_terminal() {
            break;
        }
    }
    tracing::info!(
        target: "arena_core::sim",
        outcome = ?encounter.outcome(),
        seconds = encounter.elapsed().as_secs_f32(),
        "fight finished"
    );
    println!("{}", serde_json::to_string_pretty(&encounter.snapshot())?);
    Ok(())
}
