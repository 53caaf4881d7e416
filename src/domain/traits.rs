// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits instead of
// concrete types, so an implementation can be swapped without
// touching the sweep logic.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

/// Any component that can produce the preprocessed corpus.
///
/// A document is a sequence of string tokens; tokenisation happened
/// upstream in the preprocessing pipeline. Implementations must not
/// yield zero-token documents.
///
/// Implementations:
///   - CorpusFile → reads one document per line from a token file
pub trait CorpusSource {
    /// Load every document from this source.
    fn load_documents(&self) -> Result<Vec<Vec<String>>>;
}
