// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// The dispatcher: runs the full hyperparameter grid in order.
//
//   Step 1: Open the ledger            (Layer 6 - infra)
//   Step 2: Snapshot the sweep config  (Layer 6 - infra)
//   Step 3: Compute the pending pairs  (grid minus ledger)
//   Step 4: Run each pending pair in a worker process
//   Step 5: Reload the ledger, print the best experiment
//
// Each pair runs in a child process: the same executable invoked
// with the hidden `run` subcommand. Process exit returns every
// byte the run allocated, so peak memory across the sweep is
// bounded by the largest single run. Exactly one worker is in
// flight at any time; the dispatcher blocks until it finishes.
//
// A worker that exits non-zero leaves no ledger row. The pair is
// logged and skipped; re-running the sweep retries exactly the
// missing pairs, which is what makes the sweep resumable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::process::Command;

use crate::domain::experiment::{ExperimentRecord, ParamGrid};
use crate::infra::{ledger::ExperimentLedger, model_store::ModelStore};

// ─── Sweep Configuration ─────────────────────────────────────────────────────
// Everything a full sweep needs. Serialisable so the results
// directory carries a snapshot of what produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    pub corpus_file: String,
    pub results_dir: String,
    pub max_iterations: u64,
    pub max_topics: u64,
    pub grid_step: u64,
    pub min_doc_freq: usize,
    pub remove_top_terms: usize,
    pub seed: u64,
    pub workers: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            corpus_file: "results/corpus.txt".to_string(),
            results_dir: "results".to_string(),
            max_iterations: 1000,
            max_topics: 100,
            grid_step: 10,
            min_doc_freq: 200,
            remove_top_terms: 20,
            seed: 10,
            workers: 40,
        }
    }
}

impl SweepConfig {
    /// The grid this configuration describes.
    pub fn grid(&self) -> ParamGrid {
        ParamGrid::new(self.max_iterations, self.max_topics, self.grid_step)
    }
}

// ─── SweepUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the dispatcher loop end to end.
pub struct SweepUseCase {
    config: SweepConfig,
}

impl SweepUseCase {
    /// Create a new SweepUseCase with the given configuration.
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// Execute the full sweep.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Open (or create) the ledger ───────────────────────────────
        let ledger = ExperimentLedger::open(&cfg.results_dir)?;

        // ── Step 2: Snapshot the configuration ────────────────────────────────
        ModelStore::new(&cfg.results_dir).save_sweep_config(cfg)?;

        // ── Step 3: Pending pairs = grid minus ledger ─────────────────────────
        let grid = cfg.grid();
        let records = ledger.records()?;
        let pending = pending_pairs(&grid, &records);
        tracing::info!(
            "Grid has {} pairs, {} already recorded, {} to run",
            grid.len(),
            grid.len() - pending.len(),
            pending.len(),
        );

        // ── Step 4: One isolated worker per pending pair ──────────────────────
        for (iterations, num_topics) in pending {
            self.dispatch_run(iterations, num_topics)?;
        }

        // ── Step 5: Report the best experiment ────────────────────────────────
        match ledger.best()? {
            Some(best) => println!("Best experiment: {}", best.summary()),
            None => tracing::warn!("Ledger holds no completed experiments; nothing to report"),
        }
        Ok(())
    }

    /// Run one (iterations, num_topics) pair in a child process and
    /// wait for it. A non-zero exit is logged and swallowed: the
    /// pair simply stays missing from the ledger.
    fn dispatch_run(&self, iterations: u64, num_topics: u64) -> Result<()> {
        let cfg = &self.config;
        let exe = std::env::current_exe().context("Cannot locate the current executable")?;

        tracing::info!("Dispatching experiment i={} k={}", iterations, num_topics);

        let status = Command::new(exe)
            .arg("run")
            .args(["--iterations", &iterations.to_string()])
            .args(["--num-topics", &num_topics.to_string()])
            .args(["--corpus-file", &cfg.corpus_file])
            .args(["--results-dir", &cfg.results_dir])
            .args(["--min-doc-freq", &cfg.min_doc_freq.to_string()])
            .args(["--remove-top-terms", &cfg.remove_top_terms.to_string()])
            .args(["--seed", &cfg.seed.to_string()])
            .args(["--workers", &cfg.workers.to_string()])
            .status()
            .with_context(|| {
                format!("Cannot spawn worker for experiment i={iterations} k={num_topics}")
            })?;

        if !status.success() {
            tracing::warn!(
                "Experiment i={} k={} failed ({}); no ledger row written, \
                 the pair will be retried on the next sweep",
                iterations,
                num_topics,
                status,
            );
        }
        Ok(())
    }
}

/// Grid pairs with no ledger record yet, in dispatch order.
pub(crate) fn pending_pairs(grid: &ParamGrid, records: &[ExperimentRecord]) -> Vec<(u64, u64)> {
    let done: HashSet<(u64, u64)> = records
        .iter()
        .map(|r| (r.iterations, r.num_topics))
        .collect();
    grid.pairs()
        .into_iter()
        .filter(|pair| !done.contains(pair))
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn record(iterations: u64, num_topics: u64) -> ExperimentRecord {
        ExperimentRecord {
            iterations,
            num_topics,
            execution_time: "0:00:01".to_string(),
            perplexity: 100.0,
            coherence: 0.4,
        }
    }

    #[test]
    fn test_fresh_ledger_leaves_whole_grid_pending() {
        let grid = ParamGrid::new(10, 20, 10);
        let pending = pending_pairs(&grid, &[]);
        assert_eq!(pending, vec![(10, 10), (10, 20)]);
    }

    #[test]
    fn test_recorded_pairs_are_skipped() {
        let grid = ParamGrid::new(10, 20, 10);
        let pending = pending_pairs(&grid, &[record(10, 10)]);
        assert_eq!(pending, vec![(10, 20)]);
    }

    #[test]
    fn test_fully_recorded_grid_has_nothing_pending() {
        // Second invocation over a completed grid executes zero runs
        let grid = ParamGrid::new(10, 20, 10);
        let pending = pending_pairs(&grid, &[record(10, 10), record(10, 20)]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_records_outside_the_grid_do_not_mask_pairs() {
        let grid = ParamGrid::new(10, 20, 10);
        let pending = pending_pairs(&grid, &[record(500, 70)]);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_default_config_matches_the_production_grid() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.grid().len(), 1000);
        assert_eq!(cfg.min_doc_freq, 200);
        assert_eq!(cfg.remove_top_terms, 20);
        assert_eq!(cfg.seed, 10);
    }
}
