// ============================================================
// Layer 6 — Checkpoint Store
// ============================================================
// One bundle per epoch. Burn keeps model and optimizer records in
// their own files, so a bundle is three files sharing a stem:
//
//   <dir>/<prefix>epoch<N>-model.mpk.gz   ← model parameters
//   <dir>/<prefix>epoch<N>-optim.mpk.gz   ← Adam moments + step count
//   <dir>/<prefix>epoch<N>-state.json     ← architecture, normalization,
//                                            full metrics history
//
// Next to the bundles, <prefix>train_config.json holds the flags of
// the latest run.
//
// Records are written with NamedMpkGzFileRecorder at full precision
// (not CompactRecorder's half precision) so a resumed run continues
// from bit-identical parameters.
//
// Each bundle is written once at the end of its epoch and read at
// most once, when a later run resumes from it. Writes are not
// atomic: a crash mid-write can leave a broken bundle.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::normalize::ChannelMean;
use crate::domain::history::History;
use crate::error::TrainError;

pub type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const RECORD_EXT: &str = "mpk.gz";

/// The JSON part of a checkpoint bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub epoch: usize,

    /// Serialised model config; must equal the current run's config to resume
    pub model: serde_json::Value,

    /// Zero-centering mean the run was trained with
    #[serde(default)]
    pub normalization: Option<ChannelMean>,

    pub hist: History,
}

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir:    PathBuf,
    prefix: String,
}

impl CheckpointStore {
    /// `prefix` is prepended to `epoch<N>`; it must not contain '.'
    /// because the recorder replaces everything after the last dot.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stem(&self, epoch: usize, part: &str) -> PathBuf {
        self.dir.join(format!("{}epoch{}-{}", self.prefix, epoch, part))
    }

    pub fn model_path(&self, epoch: usize) -> PathBuf {
        self.stem(epoch, "model").with_extension(RECORD_EXT)
    }

    pub fn optimizer_path(&self, epoch: usize) -> PathBuf {
        self.stem(epoch, "optim").with_extension(RECORD_EXT)
    }

    pub fn state_path(&self, epoch: usize) -> PathBuf {
        self.stem(epoch, "state").with_extension("json")
    }

    /// All three files of the bundle
    pub fn paths(&self, epoch: usize) -> [PathBuf; 3] {
        [self.model_path(epoch), self.optimizer_path(epoch), self.state_path(epoch)]
    }

    /// Fail with MissingCheckpoint naming the first absent file.
    pub fn require(&self, epoch: usize) -> Result<()> {
        match self.paths(epoch).into_iter().find(|p| !p.exists()) {
            Some(path) => Err(TrainError::MissingCheckpoint { epoch, path }.into()),
            None       => Ok(()),
        }
    }

    // ─── Writing ──────────────────────────────────────────────────────────────

    /// Write the full bundle for `state.epoch`.
    pub fn save<B, M, O>(&self, model: &M, optim: &O, state: &CheckpointState) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))?;

        let epoch    = state.epoch;
        let recorder = CheckpointRecorder::new();

        let path = self.stem(epoch, "model");
        Recorder::<B>::record(&recorder, model.clone().into_record(), path.clone())
            .map_err(|e| recorder_error(&path, e))?;

        let path = self.stem(epoch, "optim");
        Recorder::<B>::record(&recorder, optim.to_record(), path.clone())
            .map_err(|e| recorder_error(&path, e))?;

        self.save_state(state)?;
        tracing::debug!("Saved checkpoint bundle for epoch {} in '{}'", epoch, self.dir.display());
        Ok(())
    }

    fn save_state(&self, state: &CheckpointState) -> Result<()> {
        let path = self.state_path(state.epoch);
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    /// Write the run's flags to `<prefix>train_config.json`, replacing
    /// the file from an earlier run.
    pub fn save_run_config<C: Serialize>(&self, config: &C) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))?;

        let path = self.run_config_path();
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn run_config_path(&self) -> PathBuf {
        self.dir.join(format!("{}train_config.json", self.prefix))
    }

    // ─── Reading ──────────────────────────────────────────────────────────────

    pub fn load_state(&self, epoch: usize) -> Result<CheckpointState> {
        self.require(epoch)?;
        self.load_state_file(epoch)
    }

    fn load_state_file(&self, epoch: usize) -> Result<CheckpointState> {
        let path = self.state_path(epoch);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let state: CheckpointState = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse '{}'", path.display()))?;
        Ok(state)
    }

    /// Restore model parameters saved for `epoch` into `model`.
    pub fn load_model<B, M>(&self, epoch: usize, model: M, device: &B::Device) -> Result<M>
    where
        B: Backend,
        M: Module<B>,
    {
        self.require(epoch)?;
        let path   = self.stem(epoch, "model");
        let record = Recorder::<B>::load(&CheckpointRecorder::new(), path.clone(), device)
            .map_err(|e| recorder_error(&path, e))?;
        Ok(model.load_record(record))
    }

    /// Restore optimizer state saved for `epoch` into `optim`.
    pub fn load_optimizer<B, M, O>(&self, epoch: usize, optim: O, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        self.require(epoch)?;
        let path   = self.stem(epoch, "optim");
        let record = Recorder::<B>::load(&CheckpointRecorder::new(), path.clone(), device)
            .map_err(|e| recorder_error(&path, e))?;
        Ok(optim.load_record(record))
    }
}

fn recorder_error(path: &Path, err: burn::record::RecorderError) -> anyhow::Error {
    TrainError::Recorder {
        path:   path.to_path_buf(),
        reason: format!("{err:?}"),
    }
    .into()
}
