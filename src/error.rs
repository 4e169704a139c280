// ============================================================
// Error Taxonomy
// ============================================================
// Typed failures that callers (and tests) need to tell apart.
// They travel inside anyhow::Error like every other failure and
// can be recovered with `err.downcast_ref::<TrainError>()`.
//
// Three families:
//   - configuration: bad flags, missing or mismatched checkpoints
//   - resource:      missing dataset files, recorder IO failures
//   - data:          malformed samples
//
// Nothing here is retried or recovered locally.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("checkpoint for epoch {epoch} not found: '{}'", path.display())]
    MissingCheckpoint { epoch: usize, path: PathBuf },

    #[error("checkpoint for epoch {epoch} was written by a different architecture")]
    ArchitectureMismatch { epoch: usize },

    #[error("checkpoint for epoch {epoch} holds {found} history records, expected {expected}")]
    HistoryGap {
        epoch:    usize,
        expected: usize,
        found:    usize,
    },

    #[error("input extent {extent} along {axis} is too small for two conv-pool stages")]
    InputTooSmall { axis: &'static str, extent: usize },

    #[error("dataset file not found: '{}'", path.display())]
    MissingDataset { path: PathBuf },

    #[error("malformed sample at '{}' line {line}: {reason}", path.display())]
    MalformedSample {
        path:   PathBuf,
        line:   usize,
        reason: String,
    },

    #[error("recorder failed on '{}': {reason}", path.display())]
    Recorder { path: PathBuf, reason: String },
}
