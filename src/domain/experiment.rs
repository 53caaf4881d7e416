// ============================================================
// Layer 3 — Experiment Types
// ============================================================
// One completed training run is summarised by an ExperimentRecord:
// the hyperparameter pair it ran with, how long it took, and the
// two quality scores (perplexity and c_v coherence).
//
// The sweep enumerates a ParamGrid: the Cartesian product of a
// stepped iteration range and a stepped topic-count range. At most
// one record per (iterations, num_topics) pair ever exists in the
// ledger; the grid is what the dispatcher walks to find pairs that
// are still missing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One row of the experiment ledger: a single completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    /// Total Gibbs iterations the model was trained for
    pub iterations: u64,

    /// Number of topics (k) the model was built with
    pub num_topics: u64,

    /// Wall-clock duration of the run, formatted as H:MM:SS
    pub execution_time: String,

    /// Perplexity over the training corpus; lower is better
    pub perplexity: f64,

    /// c_v topic coherence; higher is better. This is the score
    /// the sweep optimises for.
    pub coherence: f64,
}

impl ExperimentRecord {
    /// Render the record in the one-line console format shared by
    /// the per-run and best-result output:
    ///   i=10 k=20 t=0:03:07 p=1234.56 cv=0.43
    /// Perplexity and coherence are fixed at two decimal places.
    pub fn summary(&self) -> String {
        format!(
            "i={} k={} t={} p={:.2} cv={:.2}",
            self.iterations, self.num_topics, self.execution_time, self.perplexity, self.coherence,
        )
    }

    /// Returns true if this run's coherence strictly beats the best
    /// coherence seen so far. Strict comparison keeps the earliest
    /// record as the winner on exact ties.
    pub fn is_improvement(&self, best_coherence: f64) -> bool {
        self.coherence > best_coherence
    }
}

// ─── Parameter Grid ──────────────────────────────────────────────────────────

/// The fixed Cartesian set of (iterations, num_topics) pairs swept
/// by the dispatcher. Both axes run from `step` up to their maximum
/// in increments of `step`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamGrid {
    /// Upper bound (inclusive) of the iteration axis
    pub max_iterations: u64,

    /// Upper bound (inclusive) of the topic-count axis
    pub max_topics: u64,

    /// Increment along both axes; also the smallest value of each
    pub step: u64,
}

impl ParamGrid {
    /// Create a new grid.
    ///
    /// # Panics
    /// Panics if `step` is zero, because the axes could never advance.
    pub fn new(max_iterations: u64, max_topics: u64, step: u64) -> Self {
        assert!(step > 0, "grid step must be positive");
        Self {
            max_iterations,
            max_topics,
            step,
        }
    }

    /// Enumerate every (iterations, num_topics) pair in the grid,
    /// iterations-major. This is the order runs are dispatched in.
    pub fn pairs(&self) -> Vec<(u64, u64)> {
        let mut out = Vec::with_capacity(self.len());
        let mut iterations = self.step;
        while iterations <= self.max_iterations {
            let mut num_topics = self.step;
            while num_topics <= self.max_topics {
                out.push((iterations, num_topics));
                num_topics += self.step;
            }
            iterations += self.step;
        }
        out
    }

    /// Number of pairs in the grid.
    pub fn len(&self) -> usize {
        ((self.max_iterations / self.step) * (self.max_topics / self.step)) as usize
    }

    /// True if the grid contains no pairs at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─── Duration Formatting ─────────────────────────────────────────────────────

/// Format a wall-clock duration as H:MM:SS, e.g. "0:03:07".
/// Hours are unpadded and grow without wrapping for very long runs.
pub fn format_execution_time(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}
