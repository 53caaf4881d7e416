// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the `sweep` subcommand and the hidden `run` worker
// subcommand, with all their configurable flags.
//
// Every default below reproduces the production sweep: iteration
// and topic axes stepped by 10 up to 1000 and 100, vocabulary
// pruned at 200 documents minimum frequency with the 20 most
// frequent terms removed, seed 10, 40 training threads.

use clap::{Args, Subcommand};

use crate::application::experiment_use_case::ExperimentConfig;
use crate::application::sweep_use_case::SweepConfig;

/// The top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep the hyperparameter grid, keeping the most coherent model
    Sweep(SweepArgs),

    /// Train and score a single (iterations, num_topics) pair.
    /// Spawned by `sweep`; hidden from help output.
    #[command(hide = true)]
    Run(RunArgs),
}

/// All arguments for the `sweep` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Preprocessed corpus: one document per line, whitespace-separated tokens
    #[arg(long, default_value = "results/corpus.txt")]
    pub corpus_file: String,

    /// Directory holding the ledger, the model artifact, and the config snapshot
    #[arg(long, default_value = "results")]
    pub results_dir: String,

    /// Upper bound (inclusive) of the Gibbs-iteration axis
    #[arg(long, default_value_t = 1000)]
    pub max_iterations: u64,

    /// Upper bound (inclusive) of the topic-count axis
    #[arg(long, default_value_t = 100)]
    pub max_topics: u64,

    /// Increment along both grid axes (also the smallest value of each)
    #[arg(long, default_value_t = 10)]
    pub grid_step: u64,

    /// Words in fewer documents than this are pruned from the vocabulary
    #[arg(long, default_value_t = 200)]
    pub min_doc_freq: usize,

    /// Number of most-frequent surviving words to prune as well
    #[arg(long, default_value_t = 20)]
    pub remove_top_terms: usize,

    /// Random seed; the whole sweep is reproducible for a fixed seed
    #[arg(long, default_value_t = 10)]
    pub seed: u64,

    /// Thread count used inside each training run
    #[arg(long, default_value_t = 40)]
    pub workers: usize,
}

/// Convert CLI SweepArgs into the application-layer SweepConfig.
/// This is the boundary between Layer 1 and Layer 2; the
/// application layer never sees clap types.
impl From<SweepArgs> for SweepConfig {
    fn from(a: SweepArgs) -> Self {
        SweepConfig {
            corpus_file: a.corpus_file,
            results_dir: a.results_dir,
            max_iterations: a.max_iterations,
            max_topics: a.max_topics,
            grid_step: a.grid_step,
            min_doc_freq: a.min_doc_freq,
            remove_top_terms: a.remove_top_terms,
            seed: a.seed,
            workers: a.workers,
        }
    }
}

/// All arguments for the hidden `run` command. The dispatcher
/// passes every flag explicitly, so the defaults only matter when
/// a run is invoked by hand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Gibbs iterations to train for
    #[arg(long)]
    pub iterations: u64,

    /// Number of topics (k)
    #[arg(long)]
    pub num_topics: u64,

    /// Preprocessed corpus: one document per line, whitespace-separated tokens
    #[arg(long, default_value = "results/corpus.txt")]
    pub corpus_file: String,

    /// Directory holding the ledger and the model artifact
    #[arg(long, default_value = "results")]
    pub results_dir: String,

    /// Words in fewer documents than this are pruned from the vocabulary
    #[arg(long, default_value_t = 200)]
    pub min_doc_freq: usize,

    /// Number of most-frequent surviving words to prune as well
    #[arg(long, default_value_t = 20)]
    pub remove_top_terms: usize,

    /// Random seed
    #[arg(long, default_value_t = 10)]
    pub seed: u64,

    /// Thread count for the training pool
    #[arg(long, default_value_t = 40)]
    pub workers: usize,
}

impl From<RunArgs> for ExperimentConfig {
    fn from(a: RunArgs) -> Self {
        ExperimentConfig {
            iterations: a.iterations,
            num_topics: a.num_topics,
            corpus_file: a.corpus_file,
            results_dir: a.results_dir,
            min_doc_freq: a.min_doc_freq,
            remove_top_terms: a.remove_top_terms,
            seed: a.seed,
            workers: a.workers,
        }
    }
}
