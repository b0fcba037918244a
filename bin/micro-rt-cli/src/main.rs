// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # micro-rt
//!
//! Command-line interface for the static-arena inference runtime.
//!
//! ## Usage
//! ```bash
//! # Benchmark a built-in model in a 21 KB arena
//! micro-rt benchmark --model lstm_gate_int16 --arena-size 21K --iterations 100
//!
//! # Run one iteration and print the outputs
//! micro-rt run --model kws_head --seed 7
//!
//! # Inspect a manifest: tensors, operators, planned layout
//! micro-rt inspect --model ./models/tanh_uint8.json
//!
//! # List the compiled-in models
//! micro-rt models
//! ```

mod commands;
mod models;

use arena_planner::PlannerKind;
use clap::{Args, Parser, Subcommand};
use runtime::BenchmarkConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "micro-rt",
    about = "Static-arena quantized inference runtime and benchmark harness",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file; flags override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Model and arena selection shared by every model-bound command.
#[derive(Args, Debug, Clone)]
struct TargetArgs {
    /// Built-in model name or path to a JSON manifest.
    #[arg(short, long)]
    model: Option<String>,

    /// Arena size (e.g., "21K", "1M").
    #[arg(short = 'a', long)]
    arena_size: Option<String>,

    /// Tensor planner: linear or greedy.
    #[arg(short, long)]
    planner: Option<PlannerKind>,
}

impl TargetArgs {
    fn apply(&self, config: &mut BenchmarkConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(size) = &self.arena_size {
            config.arena_size = size.clone();
        }
        if let Some(planner) = self.planner {
            config.planner = planner;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a runner, then time one iteration and N iterations.
    Benchmark {
        #[command(flatten)]
        target: TargetArgs,

        /// Iterations for the long run.
        #[arg(short = 'n', long)]
        iterations: Option<u32>,

        /// Print per-op tick totals as CSV.
        #[arg(long)]
        csv: bool,
    },

    /// Run one iteration on seeded random inputs and print the outputs.
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Seed for the input generator.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Print outputs as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect a model: tensors, operators, and the arena it needs.
    Inspect {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List the models compiled into this binary.
    Models,
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<BenchmarkConfig> {
    match path {
        Some(path) => {
            let config = BenchmarkConfig::from_file(path)?;
            tracing::info!("loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(BenchmarkConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Benchmark {
            target,
            iterations,
            csv,
        } => {
            target.apply(&mut config);
            if let Some(n) = iterations {
                config.iterations = n;
            }
            config.validate()?;
            commands::benchmark::execute(&config, csv)
        }
        Commands::Run { target, seed, json } => {
            target.apply(&mut config);
            config.validate()?;
            commands::run::execute(&config, seed, json)
        }
        Commands::Inspect { target } => {
            target.apply(&mut config);
            config.validate()?;
            commands::inspect::execute(&config)
        }
        Commands::Models => commands::models::execute(),
    }
}
