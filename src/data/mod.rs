// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From files on disk to tensor batches:
//
//   dataset.json + <split>.jsonl
//       │
//       ▼
//   ClipLoader        → reads and validates clips
//       │
//       ▼
//   ChannelMean       → zero-centers with the training mean
//       │
//       ▼
//   ClipDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   ClipBatcher       → stacks clips into 5D tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the trainer / evaluator
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads dataset directories from disk
pub mod loader;

/// Per-channel zero-centering
pub mod normalize;

/// Implements Burn's Dataset trait for clips
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Deterministic toy dataset generator
pub mod synthetic;
