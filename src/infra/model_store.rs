// ============================================================
// Layer 6 — Model Store
// ============================================================
// Persists the single best-model artifact slot.
//
// What gets stored in the results directory:
//   1. model.bin         — the serialised model with the highest
//                          coherence seen so far; overwritten
//                          whenever a new run wins (last writer
//                          wins, never versioned)
//   2. sweep_config.json — the configuration the sweep ran with,
//                          so a results directory is self-describing
//
// The artifact is bincode: a compact binary encoding of the whole
// model (vocabulary, mapped corpus, count tables), enough to
// reload and inspect the winning topics later.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::application::sweep_use_case::SweepConfig;
use crate::ml::lda::LdaModel;

/// File name of the artifact slot
const MODEL_FILE: &str = "model.bin";

/// File name of the config snapshot
const CONFIG_FILE: &str = "sweep_config.json";

/// Saves and loads the best-model artifact.
/// All files live in the configured results directory.
pub struct ModelStore {
    /// Path to the results directory
    dir: PathBuf,
}

impl ModelStore {
    /// Create a new ModelStore.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Overwrite the artifact slot with this model.
    pub fn save_model(&self, model: &LdaModel) -> Result<()> {
        let path = self.model_path();
        let bytes = bincode::serialize(model).context("Cannot serialise model")?;
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write model artifact '{}'", path.display()))?;
        tracing::debug!("Saved model artifact '{}'", path.display());
        Ok(())
    }

    /// Load the current artifact, if any run has won yet.
    pub fn load_model(&self) -> Result<LdaModel> {
        let path = self.model_path();
        let bytes = fs::read(&path).with_context(|| {
            format!(
                "Cannot read model artifact '{}'. Has a sweep completed any run yet?",
                path.display()
            )
        })?;
        bincode::deserialize(&bytes).context("Cannot deserialise model artifact")
    }

    /// Write the sweep configuration snapshot as pretty JSON.
    pub fn save_sweep_config(&self, config: &SweepConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    /// Full path of the artifact slot.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::lda::LdaConfig;

    fn tiny_trained_model() -> LdaModel {
        let mut model = LdaModel::new(LdaConfig::new(2));
        let docs = [
            vec!["apple".to_string(), "banana".to_string(), "fruit".to_string()],
            vec!["engine".to_string(), "wheel".to_string(), "car".to_string()],
            vec!["apple".to_string(), "fruit".to_string(), "banana".to_string()],
        ];
        for doc in &docs {
            model.add_doc(doc);
        }
        model.train(5, 1).unwrap();
        model
    }

    #[test]
    fn test_model_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        let model = tiny_trained_model();
        store.save_model(&model).unwrap();

        let loaded = store.load_model().unwrap();
        assert_eq!(loaded.num_topics(), model.num_topics());
        assert_eq!(loaded.vocab_len(), model.vocab_len());
        assert_eq!(loaded.trained_iterations(), model.trained_iterations());
        assert_eq!(loaded.top_terms(0, 3), model.top_terms(0, 3));
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        store.save_model(&tiny_trained_model()).unwrap();

        let mut winner = tiny_trained_model();
        winner.train(5, 1).unwrap();
        store.save_model(&winner).unwrap();

        // A single slot: reloading yields the last writer
        let reloaded = store.load_model().unwrap();
        assert_eq!(reloaded.trained_iterations(), 10);
    }

    #[test]
    fn test_load_without_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        assert!(store.load_model().is_err());
    }

    #[test]
    fn test_sweep_config_snapshot_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save_sweep_config(&SweepConfig::default()).unwrap();

        let json = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        let parsed: SweepConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_iterations, SweepConfig::default().max_iterations);
    }
}
