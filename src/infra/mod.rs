// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns shared by the sweep and the
// worker:
//
//   ledger.rs      — The experiments CSV: one row per completed
//                    run, created with only the header if absent,
//                    appended after every run. Also the read side:
//                    skip-if-already-run checks and the fold that
//                    finds the best coherence seen so far.
//
//   model_store.rs — The single best-model artifact slot (binary,
//                    overwritten in place) and the JSON snapshot
//                    of the sweep configuration.
//
// Both files are only ever touched by one active run at a time,
// so no locking discipline is needed.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Rust Book §12 (I/O and File Handling)

/// The experiments CSV ledger
pub mod ledger;

/// Best-model artifact and config snapshot persistence
pub mod model_store;
