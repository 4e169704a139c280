// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence:
//
//   checkpoint.rs — per-epoch bundles of model parameters,
//                   optimizer state and metrics history, written
//                   with Burn's file recorders
//
//   metrics.rs    — epoch-level metrics appended to a CSV file
//
// Reference: Burn Book §5 (Checkpointing)

/// Per-epoch checkpoint bundles
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
