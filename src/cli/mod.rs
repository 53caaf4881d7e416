// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands exist:
//   1. `sweep` — the user-facing grid sweep
//   2. `run`   — hidden; one experiment, executed by the
//                dispatcher in a child process
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs, SweepArgs};

/// The main CLI struct. clap reads the fields and generates the
/// argument parsing code via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "topic-sweep",
    version = "0.1.0",
    about = "Grid search over topic-model hyperparameters, keeping the most coherent model."
)]
pub struct Cli {
    /// The subcommand to run (sweep, or the internal run)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin: it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Sweep(args) => Self::run_sweep(args),
            Commands::Run(args) => Self::run_experiment(args),
        }
    }

    /// Handles the `sweep` subcommand.
    fn run_sweep(args: SweepArgs) -> Result<()> {
        use crate::application::sweep_use_case::SweepUseCase;

        tracing::info!("Starting hyperparameter sweep on corpus: {}", args.corpus_file);

        // Convert CLI args into the application-layer config
        let use_case = SweepUseCase::new(args.into());
        use_case.execute()
    }

    /// Handles the hidden `run` subcommand inside a worker process.
    fn run_experiment(args: RunArgs) -> Result<()> {
        use crate::application::experiment_use_case::ExperimentUseCase;

        let use_case = ExperimentUseCase::new(args.into());
        use_case.execute()
    }
}
