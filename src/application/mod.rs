// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers. Two workflows:
//
//   sweep_use_case.rs      — the dispatcher: walks the parameter
//                            grid, skips pairs already in the
//                            ledger, runs each missing pair in an
//                            isolated worker process, then reports
//                            the best experiment
//
//   experiment_use_case.rs — one training-and-scoring run inside
//                            that worker process
//
// Rules for this layer:
//   - No model math here (that's Layer 5)
//   - No CSV or artifact file formats here (that's Layer 6)
//   - Only workflow coordination
//
// Reference: Rust Book §7 (Module System)

// The grid-sweep dispatcher workflow
pub mod sweep_use_case;

// The single-experiment worker workflow
pub mod experiment_use_case;
