// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over Burn's DataLoader and Adam, driven as a small
// state machine:
//
//   Initializing ─► TrainingEpoch ─► Evaluating ─► Checkpointing ─┐
//                        ▲                                        │
//                        └──────────── next epoch ◄───────────────┘
//                                          │ last epoch
//                                          ▼
//                                        Done
//
// Key Burn insights:
//   - Training uses the autodiff backend B (dropout active,
//     batch norm updates its running statistics)
//   - model.valid() returns the model on B::InnerBackend, which
//     is inference mode for evaluation
//   - Gradients are produced fresh by every loss.backward(), so
//     there is nothing to zero between steps
//
// Shuffle order and dropout masks of epoch e are derived from
// `seed + e`, so stopping after epoch k and resuming at k + 1
// replays exactly what an uninterrupted run would have done.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::{fmt, sync::Arc};

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::transform::ShuffledDataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ClipBatch, ClipBatcher},
    dataset::ClipDataset,
    normalize::ChannelMean,
};
use crate::domain::{
    clip::{Clip, ClipShape},
    history::{EpochRecord, History},
};
use crate::error::TrainError;
use crate::infra::{
    checkpoint::{CheckpointState, CheckpointStore},
    metrics::MetricsLogger,
};
use crate::ml::{
    evaluator::{evaluate, Evaluation},
    model::ActionClassifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerPhase {
    Initializing,
    TrainingEpoch,
    Evaluating,
    Checkpointing,
    Done,
}

impl fmt::Display for TrainerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainerPhase::Initializing  => "initializing",
            TrainerPhase::TrainingEpoch => "training",
            TrainerPhase::Evaluating    => "evaluating",
            TrainerPhase::Checkpointing => "checkpointing",
            TrainerPhase::Done          => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub batch_size:   usize,
    pub num_epochs:   usize,
    /// 1-based; > 1 resumes from the checkpoint of `start_epoch - 1`
    pub start_epoch:  usize,
    pub lr:           f64,
    /// Batches between progress lines
    pub log_interval: usize,
    /// Also evaluate the dev split after every epoch
    pub validation:   bool,
    pub seed:         u64,
}

impl TrainerConfig {
    pub fn last_epoch(&self) -> usize {
        (self.start_epoch + self.num_epochs).saturating_sub(1)
    }

    pub fn check(&self) -> Result<()> {
        let problem = if self.batch_size == 0 {
            Some("batch size must be at least 1")
        } else if self.start_epoch == 0 {
            Some("epochs are numbered from 1")
        } else if self.log_interval == 0 {
            Some("log interval must be at least 1")
        } else if !(self.lr.is_finite() && self.lr > 0.0) {
            Some("learning rate must be a positive number")
        } else {
            None
        };
        match problem {
            Some(msg) => Err(TrainError::Config(msg.to_string()).into()),
            None      => Ok(()),
        }
    }

    fn epoch_seed(&self, epoch: usize) -> u64 {
        self.seed.wrapping_add(epoch as u64)
    }
}

/// Datasets plus what the batcher needs to collate them.
pub struct TrainingData {
    pub train:     Arc<ClipDataset>,
    pub dev:       Option<Arc<ClipDataset>>,
    pub shape:     ClipShape,
    pub with_flow: bool,
}

pub struct TrainingRun<M> {
    pub model:   M,
    pub history: History,
}

pub struct Trainer<B: AutodiffBackend> {
    config:        TrainerConfig,
    store:         CheckpointStore,
    /// Serialised architecture config written into every checkpoint
    model_config:  serde_json::Value,
    normalization: Option<ChannelMean>,
    device:        B::Device,
    history:       History,
    metrics:       Option<MetricsLogger>,
    phase:         TrainerPhase,
}

impl<B: AutodiffBackend> Trainer<B> {
    pub fn new(
        config:        TrainerConfig,
        store:         CheckpointStore,
        model_config:  serde_json::Value,
        normalization: Option<ChannelMean>,
        device:        B::Device,
    ) -> Self {
        Self {
            config,
            store,
            model_config,
            normalization,
            device,
            history: History::new(),
            metrics: None,
            phase:   TrainerPhase::Initializing,
        }
    }

    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn phase(&self) -> TrainerPhase {
        self.phase
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn enter(&mut self, phase: TrainerPhase, epoch: usize) {
        tracing::debug!(%phase, epoch, "trainer phase");
        self.phase = phase;
    }

    /// Restore model, optimizer and history when resuming; pass them
    /// through untouched for a fresh run.
    pub fn initialize<M, O>(&mut self, model: M, optim: O) -> Result<(M, O)>
    where
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        self.enter(TrainerPhase::Initializing, self.config.start_epoch);
        self.config.check()?;

        if self.config.start_epoch <= 1 {
            self.history = History::new();
            return Ok((model, optim));
        }

        let epoch = self.config.start_epoch - 1;
        tracing::info!("Loading checkpoint {}", epoch);

        let state = self.store.load_state(epoch)?;
        if state.model != self.model_config {
            return Err(TrainError::ArchitectureMismatch { epoch }.into());
        }
        if state.hist.len() != epoch || !state.hist.is_contiguous() {
            return Err(TrainError::HistoryGap {
                epoch,
                expected: epoch,
                found:    state.hist.len(),
            }
            .into());
        }

        let model = self.store.load_model::<B, M>(epoch, model, &self.device)?;
        let optim = self.store.load_optimizer::<B, M, O>(epoch, optim, &self.device)?;
        self.history = state.hist;

        Ok((model, optim))
    }

    /// Run epochs `start_epoch ..= last_epoch`, checkpointing after each.
    pub fn run<M, O>(mut self, mut model: M, mut optim: O, data: &TrainingData) -> Result<TrainingRun<M>>
    where
        M: AutodiffModule<B> + ActionClassifier<B>,
        M::InnerModule: ActionClassifier<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        self.config.check()?;
        if self.config.validation && data.dev.is_none() {
            return Err(TrainError::Config("validation requested without a dev split".into()).into());
        }

        tracing::info!(
            "Start training: epochs {}..={}, {} training clips",
            self.config.start_epoch,
            self.config.last_epoch(),
            data.train.clip_count(),
        );

        for epoch in self.config.start_epoch..=self.config.last_epoch() {
            model = self.train_epoch(epoch, model, &mut optim, data);

            let record = self.evaluate_epoch(epoch, &model, data);
            if let Some(logger) = &self.metrics {
                logger.log(&record)?;
            }
            self.history.push(record);

            self.checkpoint(epoch, &model, &optim)?;
        }

        self.enter(TrainerPhase::Done, self.config.last_epoch());
        Ok(TrainingRun { model, history: self.history })
    }

    fn train_epoch<M, O>(&mut self, epoch: usize, mut model: M, optim: &mut O, data: &TrainingData) -> M
    where
        M: AutodiffModule<B> + ActionClassifier<B>,
        O: Optimizer<M, B>,
    {
        self.enter(TrainerPhase::TrainingEpoch, epoch);

        let seed = self.config.epoch_seed(epoch);
        B::seed(seed);

        let batch_size = self.config.batch_size;
        let iterations = data.train.clip_count().div_ceil(batch_size);
        let last_epoch = self.config.last_epoch();

        let batcher = ClipBatcher::<B>::new(self.device.clone(), data.shape, data.with_flow);
        let loader  = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .build(ShuffledDataset::<_, Clip>::with_seed(data.train.clone(), seed));

        let ce = CrossEntropyLossConfig::new().init::<B>(&self.device);

        for (i, batch) in loader.iter().enumerate() {
            let ClipBatch { frames, flow, labels } = batch;

            let logits = model.classify(frames, flow);
            let loss   = ce.forward(logits, labels);

            if (i + 1) % self.config.log_interval == 0 {
                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                tracing::info!(
                    "epoch {}/{}, iteration {}/{}, loss: {:.6}",
                    epoch, last_epoch, i + 1, iterations, loss_val,
                );
            }

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.config.lr, model, grads);
        }

        model
    }

    fn evaluate_epoch<M>(&mut self, epoch: usize, model: &M, data: &TrainingData) -> EpochRecord
    where
        M: AutodiffModule<B>,
        M::InnerModule: ActionClassifier<B::InnerBackend>,
    {
        self.enter(TrainerPhase::Evaluating, epoch);

        let valid   = model.valid();
        let batcher = ClipBatcher::<B::InnerBackend>::new(self.device.clone(), data.shape, data.with_flow);
        let bs      = self.config.batch_size;

        let train = evaluate(&valid, data.train.clone(), batcher.clone(), bs);
        let dev: Option<Evaluation> = match (&data.dev, self.config.validation) {
            (Some(dev), true) => Some(evaluate(&valid, dev.clone(), batcher, bs)),
            _                 => None,
        };

        let last = self.config.last_epoch();
        match dev {
            Some(d) => println!(
                "epoch {}/{}, train_loss = {:.6}, train_acc = {:.4}, dev_loss = {:.6}, dev_acc = {:.4}",
                epoch, last, train.loss, train.accuracy, d.loss, d.accuracy,
            ),
            None => println!(
                "epoch {}/{}, train_loss = {:.6}, train_acc = {:.4}",
                epoch, last, train.loss, train.accuracy,
            ),
        }

        EpochRecord {
            epoch,
            train_loss: train.loss,
            train_acc:  train.accuracy,
            dev_loss:   dev.map(|d| d.loss),
            dev_acc:    dev.map(|d| d.accuracy),
        }
    }

    fn checkpoint<M, O>(&mut self, epoch: usize, model: &M, optim: &O) -> Result<()>
    where
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        self.enter(TrainerPhase::Checkpointing, epoch);

        let state = CheckpointState {
            epoch,
            model:         self.model_config.clone(),
            normalization: self.normalization,
            hist:          self.history.clone(),
        };
        self.store.save::<B, M, O>(model, optim, &state)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrainerConfig {
        TrainerConfig {
            batch_size:   4,
            num_epochs:   3,
            start_epoch:  2,
            lr:           1e-3,
            log_interval: 1,
            validation:   false,
            seed:         0,
        }
    }

    #[test]
    fn test_last_epoch() {
        assert_eq!(config().last_epoch(), 4);
        let none = TrainerConfig { num_epochs: 0, start_epoch: 1, ..config() };
        assert_eq!(none.last_epoch(), 0);
    }

    #[test]
    fn test_check_rejects_bad_values() {
        assert!(config().check().is_ok());
        for bad in [
            TrainerConfig { batch_size: 0, ..config() },
            TrainerConfig { start_epoch: 0, ..config() },
            TrainerConfig { log_interval: 0, ..config() },
            TrainerConfig { lr: 0.0, ..config() },
            TrainerConfig { lr: f64::NAN, ..config() },
        ] {
            let err = bad.check().unwrap_err();
            assert!(matches!(err.downcast_ref::<TrainError>(), Some(TrainError::Config(_))));
        }
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(TrainerPhase::TrainingEpoch.to_string(), "training");
        assert_eq!(TrainerPhase::Done.to_string(), "done");
    }

    #[test]
    fn test_one_step_moves_every_layer() {
        use crate::ml::model::{BlockFrameConvNet, BlockFrameConvNetConfig};
        use burn::{
            backend::{Autodiff, NdArray},
            optim::AdamConfig,
            tensor::Distribution,
        };

        type TrainBackend = Autodiff<NdArray<f32>>;

        let device = Default::default();
        let model: BlockFrameConvNet<TrainBackend> = BlockFrameConvNetConfig::new(3)
            .with_frames(10)
            .with_height(10)
            .with_width(10)
            .with_conv1_channels(2)
            .with_conv2_channels(3)
            .with_hidden(4)
            .init(&device)
            .unwrap();
        let mut optim = AdamConfig::new().init::<TrainBackend, BlockFrameConvNet<TrainBackend>>();

        let frames = Tensor::<TrainBackend, 5>::random([4, 1, 10, 10, 10], Distribution::Default, &device);
        let labels = Tensor::<TrainBackend, 1, Int>::from_ints([0, 1, 2, 1], &device);

        let conv_before: Vec<f32> = model.tower.block1.conv.weight.val().into_data().to_vec().unwrap();
        let fc_before:   Vec<f32> = model.fc2.weight.val().into_data().to_vec().unwrap();

        let logits = model.classify(frames, None);
        let loss   = CrossEntropyLossConfig::new().init::<TrainBackend>(&device).forward(logits, labels);
        let grads  = GradientsParams::from_grads(loss.backward(), &model);
        let model  = optim.step(1e-2, model, grads);

        let conv_after: Vec<f32> = model.tower.block1.conv.weight.val().into_data().to_vec().unwrap();
        let fc_after:   Vec<f32> = model.fc2.weight.val().into_data().to_vec().unwrap();
        assert_ne!(conv_before, conv_after);
        assert_ne!(fc_before, fc_after);
    }
}
