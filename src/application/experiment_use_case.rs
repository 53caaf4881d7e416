// ============================================================
// Layer 2 — ExperimentUseCase
// ============================================================
// One training-and-scoring run, executed inside the worker
// process the dispatcher spawned:
//
//   Step 1: Re-check the ledger        (Layer 6 - infra)
//   Step 2: Load the corpus            (Layer 4 - data)
//   Step 3: Build and train the model  (Layer 5 - ml)
//   Step 4: Score it                   (Layer 5 - ml)
//   Step 5: Keep the artifact if best  (Layer 6 - infra)
//   Step 6: Append the ledger row, print the summary
//
// The ledger re-check makes the worker idempotent on its own: even
// if a stale dispatcher asks for a pair that finished meanwhile,
// no duplicate row can appear.
//
// "Best" is decided by folding over the ledger's coherence column
// as it stood before this run; the artifact is overwritten only on
// a strict improvement, so after any number of runs it corresponds
// to the maximum coherence recorded so far.

use anyhow::Result;
use std::time::Instant;

use crate::data::corpus::CorpusFile;
use crate::domain::experiment::{format_execution_time, ExperimentRecord};
use crate::domain::traits::CorpusSource;
use crate::infra::{ledger::ExperimentLedger, model_store::ModelStore};
use crate::ml::coherence::CoherenceEstimator;
use crate::ml::lda::{LdaConfig, LdaModel, DEFAULT_ALPHA, DEFAULT_ETA};

// ─── Experiment Configuration ────────────────────────────────────────────────
// One grid pair plus everything the worker needs to train it.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub iterations: u64,
    pub num_topics: u64,
    pub corpus_file: String,
    pub results_dir: String,
    pub min_doc_freq: usize,
    pub remove_top_terms: usize,
    pub seed: u64,
    pub workers: usize,
}

// ─── ExperimentUseCase ────────────────────────────────────────────────────────
// Owns the config and runs one experiment end to end.
pub struct ExperimentUseCase {
    config: ExperimentConfig,
}

impl ExperimentUseCase {
    /// Create a new ExperimentUseCase with the given configuration.
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config }
    }

    /// Execute the run. Returns Ok(()) without side effects when
    /// the pair is already recorded.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Skip if this pair already ran ─────────────────────────────
        let ledger = ExperimentLedger::open(&cfg.results_dir)?;
        if ledger.contains(cfg.iterations, cfg.num_topics)? {
            tracing::info!(
                "Experiment i={} k={} already recorded, skipping",
                cfg.iterations,
                cfg.num_topics,
            );
            return Ok(());
        }

        let start = Instant::now();

        // ── Step 2: Load the preprocessed corpus ──────────────────────────────
        // Zero-token documents were dropped by the loader
        let corpus = CorpusFile::new(&cfg.corpus_file).load_documents()?;

        // ── Step 3: Build the model and train ─────────────────────────────────
        let mut model = LdaModel::new(LdaConfig {
            num_topics: cfg.num_topics as usize,
            min_doc_freq: cfg.min_doc_freq,
            remove_top_terms: cfg.remove_top_terms,
            seed: cfg.seed,
            alpha: DEFAULT_ALPHA,
            eta: DEFAULT_ETA,
        });
        for doc in &corpus {
            model.add_doc(doc);
        }
        model.train(cfg.iterations, cfg.workers)?;

        // ── Step 4: Score the trained model ───────────────────────────────────
        let perplexity = model.perplexity();
        let coherence = CoherenceEstimator::new().score(&model, &corpus);

        // ── Step 5: Persist the artifact on a strict improvement ──────────────
        let best_so_far = ledger.best()?;
        if best_so_far.map_or(true, |b| coherence > b.coherence) {
            ModelStore::new(&cfg.results_dir).save_model(&model)?;
            tracing::info!(
                "New best model: i={} k={} cv={:.4}",
                cfg.iterations,
                cfg.num_topics,
                coherence,
            );
        }

        // ── Step 6: Record the run ────────────────────────────────────────────
        let record = ExperimentRecord {
            iterations: model.trained_iterations(),
            num_topics: cfg.num_topics,
            execution_time: format_execution_time(start.elapsed()),
            perplexity,
            coherence,
        };
        ledger.append(&record)?;
        println!("Experiment done: {}", record.summary());

        Ok(())
    }
}
