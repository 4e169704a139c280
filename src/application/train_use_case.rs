// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Read dataset meta + splits   (Layer 4 - data)
//   Step 2: Check the resume checkpoint  (Layer 6 - infra)
//   Step 3: Zero-center the splits       (Layer 4 - data)
//   Step 4: Build the model + Adam       (Layer 5 - ml)
//   Step 5: Run the epoch loop           (Layer 5 - ml)
//
// A missing or mismatched resume checkpoint fails in Step 2,
// before any file is written.

use std::{path::{Path, PathBuf}, sync::Arc};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use burn::{
    backend::Autodiff,
    module::AutodiffModule,
    optim::AdamConfig,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    dataset::ClipDataset,
    loader::ClipLoader,
    normalize::ChannelMean,
};
use crate::domain::{
    history::History,
    traits::{ClipSource, Split},
};
use crate::error::TrainError;
use crate::infra::{checkpoint::CheckpointStore, metrics::MetricsLogger};
use crate::ml::{
    flow_model::BlockFrameFlowConvNetConfig,
    model::{ActionClassifier, BlockFrameConvNetConfig},
    trainer::{Trainer, TrainerConfig, TrainingData},
    Architecture, CpuBackend, GpuBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub architecture: Architecture,
    pub dataset_dir:  PathBuf,
    pub batch_size:   usize,
    pub num_epochs:   usize,
    pub start_epoch:  usize,
    pub lr:           f64,
    pub log_interval: usize,
    /// Evaluate the dev split after every epoch
    pub validate:     bool,
    /// Subtract the training-set channel mean from both splits
    pub zero_center:  bool,
    /// Run on the GPU backend instead of the CPU one
    pub cuda:         bool,
    pub seed:         u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::BlockFrame,
            dataset_dir:  PathBuf::from("data"),
            batch_size:   64,
            num_epochs:   3,
            start_epoch:  1,
            lr:           0.001,
            log_interval: 10,
            validate:     false,
            zero_center:  false,
            cuda:         false,
            seed:         42,
        }
    }
}

impl TrainConfig {
    /// Reject flag combinations the epoch loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.trainer_config().check()
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            batch_size:   self.batch_size,
            num_epochs:   self.num_epochs,
            start_epoch:  self.start_epoch,
            lr:           self.lr,
            log_interval: self.log_interval,
            validation:   self.validate,
            seed:         self.seed,
        }
    }

    pub fn checkpoint_store(&self) -> CheckpointStore {
        checkpoint_store(self.architecture, &self.dataset_dir)
    }
}

/// Where an architecture keeps its checkpoints:
///   frame-only: <dataset_dir>/cnn_block_frame_epoch<N>-*
///   two-stream: <dataset_dir>/cnn_block_frame_flow/cnn_block_frame_flow_epoch<N>-*
pub fn checkpoint_store(architecture: Architecture, dataset_dir: &Path) -> CheckpointStore {
    let prefix = format!("{}_", architecture.name());
    match architecture {
        Architecture::BlockFrame     => CheckpointStore::new(dataset_dir, prefix),
        Architecture::BlockFrameFlow => CheckpointStore::new(dataset_dir.join(architecture.name()), prefix),
    }
}

#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub history:        History,
    pub checkpoint_dir: PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the dataset directory with the backend chosen by `cuda`.
    pub fn execute(&self) -> Result<TrainSummary> {
        let source = ClipLoader::new(&self.config.dataset_dir);
        if self.config.cuda {
            self.execute_with::<Autodiff<GpuBackend>, _>(&source, Default::default())
        } else {
            self.execute_with::<Autodiff<CpuBackend>, _>(&source, Default::default())
        }
    }

    pub fn execute_with<B, S>(&self, source: &S, device: B::Device) -> Result<TrainSummary>
    where
        B: AutodiffBackend,
        S: ClipSource,
    {
        let cfg = &self.config;
        cfg.validate()?;
        let with_flow = cfg.architecture.uses_flow();

        // ── Step 1: Dataset ───────────────────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.dataset_dir.display());
        let meta      = source.meta()?;
        let mut train = source.load_split(Split::Train, with_flow)?;
        if train.is_empty() {
            return Err(TrainError::Config("training split is empty".into()).into());
        }
        let mut dev = if cfg.validate {
            let dev = source.load_split(Split::Dev, with_flow)?;
            if dev.is_empty() {
                return Err(TrainError::Config("dev split is empty".into()).into());
            }
            Some(dev)
        } else {
            None
        };
        tracing::info!(
            "Loaded {} training clips, {} dev clips",
            train.len(),
            dev.as_ref().map_or(0, Vec::len),
        );

        // ── Step 2: Resume prerequisite ───────────────────────────────────────
        let store   = cfg.checkpoint_store();
        let resumed = match cfg.start_epoch {
            0 | 1 => None,
            start => Some(store.load_state(start - 1)?),
        };

        // ── Step 3: Zero-centering ────────────────────────────────────────────
        // A resumed run reuses the mean stored with its checkpoint.
        let normalization = match &resumed {
            Some(state) => {
                if state.normalization.is_some() != cfg.zero_center {
                    tracing::warn!(
                        "Checkpoint {} was trained with zero-centering {}; keeping it",
                        state.epoch,
                        if state.normalization.is_some() { "on" } else { "off" },
                    );
                }
                state.normalization
            }
            None => cfg.zero_center.then(|| ChannelMean::compute(&train)),
        };
        if let Some(mean) = &normalization {
            tracing::info!("Zero-centering with mean {:?}", mean);
            mean.apply(&mut train);
            if let Some(dev) = dev.as_mut() {
                mean.apply(dev);
            }
        }

        let data = TrainingData {
            train: Arc::new(ClipDataset::new(train)),
            dev:   dev.map(|d| Arc::new(ClipDataset::new(d))),
            shape: meta.shape,
            with_flow,
        };

        // ── Step 4 + 5: Model and epoch loop ──────────────────────────────────
        B::seed(cfg.seed);
        let shape = meta.shape;
        match cfg.architecture {
            Architecture::BlockFrame => {
                let model_cfg = BlockFrameConvNetConfig::new(meta.num_classes)
                    .with_frames(shape.frames)
                    .with_height(shape.height)
                    .with_width(shape.width);
                let model = model_cfg.init::<B>(&device)?;
                self.fit(model, serde_json::to_value(&model_cfg)?, normalization, store, &data, device)
            }
            Architecture::BlockFrameFlow => {
                let model_cfg = BlockFrameFlowConvNetConfig::new(meta.num_classes)
                    .with_frames(shape.frames)
                    .with_height(shape.height)
                    .with_width(shape.width);
                let model = model_cfg.init::<B>(&device)?;
                self.fit(model, serde_json::to_value(&model_cfg)?, normalization, store, &data, device)
            }
        }
    }

    fn fit<B, M>(
        &self,
        model:         M,
        model_config:  serde_json::Value,
        normalization: Option<ChannelMean>,
        store:         CheckpointStore,
        data:          &TrainingData,
        device:        B::Device,
    ) -> Result<TrainSummary>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + ActionClassifier<B>,
        M::InnerModule: ActionClassifier<B::InnerBackend>,
    {
        let checkpoint_dir = store.dir().to_path_buf();
        let config_store   = store.clone();

        // torch-style Adam epsilon
        let optim = AdamConfig::new().with_epsilon(1e-8).init::<B, M>();

        let mut trainer = Trainer::<B>::new(
            self.config.trainer_config(),
            store,
            model_config,
            normalization,
            device,
        );
        let (model, optim) = trainer.initialize(model, optim)?;

        // Nothing is written until the resume checks above have passed
        config_store.save_run_config(&self.config)?;
        let metrics = MetricsLogger::new(&checkpoint_dir, trainer.history())?;
        let trainer = trainer.with_metrics(metrics);

        let run = trainer.run(model, optim, data)?;
        Ok(TrainSummary { history: run.history, checkpoint_dir })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_locations() {
        let dir  = Path::new("data");
        let flat = checkpoint_store(Architecture::BlockFrame, dir);
        assert_eq!(flat.state_path(2), Path::new("data/cnn_block_frame_epoch2-state.json"));

        let nested = checkpoint_store(Architecture::BlockFrameFlow, dir);
        assert_eq!(
            nested.state_path(2),
            Path::new("data/cnn_block_frame_flow/cnn_block_frame_flow_epoch2-state.json")
        );
    }

    #[test]
    fn test_trainer_config_mirrors_flags() {
        let cfg = TrainConfig { start_epoch: 4, validate: true, log_interval: 3, ..Default::default() };
        let t   = cfg.trainer_config();
        assert_eq!(t.start_epoch, 4);
        assert!(t.validation);
        assert_eq!(t.log_interval, 3);
        assert_eq!(t.last_epoch(), 6);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let cfg = TrainConfig { batch_size: 0, ..Default::default() };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<TrainError>(), Some(TrainError::Config(_))));
    }
}
