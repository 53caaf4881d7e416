// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads the preprocessed corpus from disk. The preprocessing
// pipeline writes one document per line, tokens separated by
// whitespace. This loader is the only place that knows about
// that file format.
//
// Lines with no tokens are dropped here: an empty document carries
// no co-occurrence information and must never reach the model.

use anyhow::{Context, Result};
use std::fs;

use crate::domain::traits::CorpusSource;

/// Loads pre-tokenised documents from a single text file.
/// Implements the CorpusSource trait from Layer 3.
pub struct CorpusFile {
    /// Path to the token file
    path: String,
}

impl CorpusFile {
    /// Create a new CorpusFile pointed at a token file on disk.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusSource for CorpusFile {
    fn load_documents(&self) -> Result<Vec<Vec<String>>> {
        // Unlike the ledger, a missing corpus is not recoverable:
        // without documents there is nothing to train on.
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path))?;

        let mut docs = Vec::new();
        let mut dropped = 0usize;

        for line in text.lines() {
            let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if tokens.is_empty() {
                dropped += 1;
                continue;
            }
            docs.push(tokens);
        }

        tracing::info!(
            "Loaded {} documents from '{}' ({} empty lines dropped)",
            docs.len(),
            self.path,
            dropped,
        );
        Ok(docs)
    }
}
