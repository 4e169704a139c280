// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Anything that can hand the training pipeline a set of labelled
// clips implements ClipSource:
//   - ClipLoader     → reads dataset.json + <split>.jsonl from disk
//   - SyntheticClips → generates learnable toy clips in memory
//
// The application layer only sees ClipSource, so training runs
// against either without changes.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::clip::{Clip, ClipShape};

/// Dataset-wide facts shared by every split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub shape:       ClipShape,
    pub num_classes: usize,

    /// Optional human-readable class names, indexed by label
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// The two partitions a dataset is split into on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Dev,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Dev   => "dev",
        }
    }
}

pub trait ClipSource {
    /// Shape and class count of the dataset.
    fn meta(&self) -> Result<DatasetMeta>;

    /// Load every clip of one split, validated against `meta()`.
    /// When `with_flow` is set each clip must carry optical flow.
    fn load_split(&self, split: Split, with_flow: bool) -> Result<Vec<Clip>>;
}
