// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the preprocessing pipeline's output file and
// the in-memory corpus the model trains on.
//
// The flow is short because tokenisation already happened upstream:
//
//   token file (one document per line)
//       │
//       ▼
//   CorpusFile      → reads lines, splits tokens, drops empty docs
//       │
//       ▼
//   Vec<Vec<String>> consumed by the ml layer
//
// Reference: Rust Book §12 (I/O and File Handling)

/// Reads the preprocessed corpus file produced upstream
pub mod corpus;
