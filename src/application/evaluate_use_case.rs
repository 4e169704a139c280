// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved checkpoint on one split:
//
//   Step 1: Read the checkpoint state     (Layer 6 - infra)
//   Step 2: Load + zero-center the split  (Layer 4 - data)
//   Step 3: Rebuild the model from config (Layer 5 - ml)
//   Step 4: Restore parameters, evaluate  (Layer 5 - ml)
//
// Runs on a plain (non-autodiff) backend, so dropout and batch
// norm are already in inference mode.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;

use crate::application::train_use_case::checkpoint_store;
use crate::data::{batcher::ClipBatcher, dataset::ClipDataset, loader::ClipLoader};
use crate::domain::{
    clip::ClipShape,
    traits::{ClipSource, Split},
};
use crate::error::TrainError;
use crate::infra::checkpoint::{CheckpointState, CheckpointStore};
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    flow_model::BlockFrameFlowConvNetConfig,
    model::{ActionClassifier, BlockFrameConvNetConfig},
    Architecture, CpuBackend, GpuBackend,
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub architecture: Architecture,
    pub dataset_dir:  PathBuf,
    pub epoch:        usize,
    pub split:        Split,
    pub batch_size:   usize,
    pub cuda:         bool,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Evaluation> {
        let source = ClipLoader::new(&self.config.dataset_dir);
        let result = if self.config.cuda {
            self.execute_with::<GpuBackend, _>(&source, Default::default())?
        } else {
            self.execute_with::<CpuBackend, _>(&source, Default::default())?
        };

        println!(
            "Epoch {} on {}: loss {:.4}, accuracy {:.2}% ({} clips)",
            self.config.epoch,
            self.config.split.name(),
            result.loss,
            result.accuracy * 100.0,
            result.samples,
        );
        Ok(result)
    }

    pub fn execute_with<B, S>(&self, source: &S, device: B::Device) -> Result<Evaluation>
    where
        B: Backend,
        S: ClipSource,
    {
        let cfg = &self.config;
        if cfg.batch_size == 0 {
            return Err(TrainError::Config("batch size must be at least 1".into()).into());
        }
        let with_flow = cfg.architecture.uses_flow();

        // ── Step 1: Checkpoint state ──────────────────────────────────────────
        let store = checkpoint_store(cfg.architecture, &cfg.dataset_dir);
        let state = store.load_state(cfg.epoch)?;

        // ── Step 2: Split ─────────────────────────────────────────────────────
        let meta      = source.meta()?;
        let mut clips = source.load_split(cfg.split, with_flow)?;
        if let Some(mean) = &state.normalization {
            mean.apply(&mut clips);
        }
        tracing::info!("Evaluating {} {} clips", clips.len(), cfg.split.name());

        let dataset = Arc::new(ClipDataset::new(clips));
        let batcher = ClipBatcher::<B>::new(device.clone(), meta.shape, with_flow);

        // ── Step 3 + 4: Model ─────────────────────────────────────────────────
        match cfg.architecture {
            Architecture::BlockFrame => {
                let model_cfg: BlockFrameConvNetConfig = model_config(&state)?;
                ensure_shape(&state, [model_cfg.frames, model_cfg.height, model_cfg.width], meta.shape)?;
                let model = model_cfg.init::<B>(&device)?;
                score(&store, &state, model, dataset, batcher, cfg.batch_size, &device)
            }
            Architecture::BlockFrameFlow => {
                let model_cfg: BlockFrameFlowConvNetConfig = model_config(&state)?;
                ensure_shape(&state, [model_cfg.frames, model_cfg.height, model_cfg.width], meta.shape)?;
                let model = model_cfg.init::<B>(&device)?;
                score(&store, &state, model, dataset, batcher, cfg.batch_size, &device)
            }
        }
    }
}

fn model_config<C: serde::de::DeserializeOwned>(state: &CheckpointState) -> Result<C> {
    serde_json::from_value(state.model.clone())
        .map_err(|_| TrainError::ArchitectureMismatch { epoch: state.epoch })
        .with_context(|| format!("Checkpoint {} holds an unexpected model config", state.epoch))
}

fn ensure_shape(state: &CheckpointState, trained: [usize; 3], shape: ClipShape) -> Result<()> {
    if trained == [shape.frames, shape.height, shape.width] {
        Ok(())
    } else {
        Err(TrainError::ArchitectureMismatch { epoch: state.epoch }.into())
    }
}

fn score<B, M>(
    store:      &CheckpointStore,
    state:      &CheckpointState,
    model:      M,
    dataset:    Arc<ClipDataset>,
    batcher:    ClipBatcher<B>,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Evaluation>
where
    B: Backend,
    M: burn::module::Module<B> + ActionClassifier<B>,
{
    let model = store.load_model::<B, M>(state.epoch, model, device)?;
    Ok(evaluate(&model, dataset, batcher, batch_size))
}
