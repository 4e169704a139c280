// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches Burn modules, optimizers and backends:
//
//   pool.rs       — volumetric max pooling built from tensor ops
//   blocks.rs     — conv → norm → relu → pool → dropout blocks
//   model.rs      — frame-only BlockFrameConvNet + ActionClassifier
//   flow_model.rs — two-stream BlockFrameFlowConvNet
//   evaluator.rs  — inference-mode loss / accuracy pass
//   trainer.rs    — epoch loop, resume, checkpointing
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

pub mod pool;

pub mod blocks;

/// Frame-only architecture and the classifier trait
pub mod model;

/// Frame + optical flow architecture
pub mod flow_model;

pub mod evaluator;

pub mod trainer;

/// CPU backend (always available, used by tests)
pub type CpuBackend = burn::backend::NdArray<f32>;

/// GPU backend selected with `--cuda 1`
pub type GpuBackend = burn::backend::Wgpu;

/// The two network variants and their on-disk naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    BlockFrame,
    BlockFrameFlow,
}

impl Architecture {
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::BlockFrame     => "cnn_block_frame",
            Architecture::BlockFrameFlow => "cnn_block_frame_flow",
        }
    }

    pub fn uses_flow(&self) -> bool {
        matches!(self, Architecture::BlockFrameFlow)
    }
}
