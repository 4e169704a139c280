// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags:
//
//   block-frame      — train the frame-only network
//   block-frame-flow — train the frame + optical-flow network
//   evaluate         — score a saved checkpoint on one split
//   synth            — write a small toy dataset
//
// Flags keep their underscore spelling (--dataset_dir, --start_epoch)
// and on/off switches take 0 or 1.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{evaluate_use_case::EvaluateConfig, train_use_case::TrainConfig};
use crate::domain::traits::Split;
use crate::ml::Architecture;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the frame-only 3D convnet
    #[command(name = "block-frame")]
    BlockFrame(BlockFrameArgs),

    /// Train the two-stream frame + optical-flow 3D convnet
    #[command(name = "block-frame-flow")]
    BlockFrameFlow(BlockFrameFlowArgs),

    /// Evaluate a saved checkpoint
    Evaluate(EvaluateArgs),

    /// Write a synthetic dataset for smoke runs
    Synth(SynthArgs),
}

/// Arguments for `block-frame`.
#[derive(Args, Debug)]
pub struct BlockFrameArgs {
    /// Directory holding dataset.json, train.jsonl and dev.jsonl;
    /// checkpoints are written here too
    #[arg(long = "dataset_dir", default_value = "data")]
    pub dataset_dir: PathBuf,

    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    /// Number of epochs to run from start_epoch
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Resume after the checkpoint of start_epoch - 1
    #[arg(long = "start_epoch", default_value_t = 1)]
    pub start_epoch: usize,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    /// Print the training loss every this many batches
    #[arg(long = "log", default_value_t = 10)]
    pub log_interval: usize,

    /// 1 evaluates the dev split after every epoch
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub val: u8,

    /// 1 runs on the GPU backend
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub cuda: u8,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// 1 subtracts the training-set mean from every clip
    #[arg(long = "zero_center", default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub zero_center: u8,
}

impl From<BlockFrameArgs> for TrainConfig {
    fn from(a: BlockFrameArgs) -> Self {
        TrainConfig {
            architecture: Architecture::BlockFrame,
            dataset_dir:  a.dataset_dir,
            batch_size:   a.batch_size,
            num_epochs:   a.epochs,
            start_epoch:  a.start_epoch,
            lr:           a.lr,
            log_interval: a.log_interval,
            validate:     a.val != 0,
            zero_center:  a.zero_center != 0,
            cuda:         a.cuda != 0,
            seed:         a.seed,
        }
    }
}

/// Arguments for `block-frame-flow`. This variant always validates
/// and zero-centers.
#[derive(Args, Debug)]
pub struct BlockFrameFlowArgs {
    #[arg(long = "dataset_dir", default_value = "data")]
    pub dataset_dir: PathBuf,

    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long = "num_epochs", default_value_t = 3)]
    pub num_epochs: usize,

    #[arg(long = "start_epoch", default_value_t = 1)]
    pub start_epoch: usize,

    #[arg(long, default_value_t = 0.001)]
    pub lr: f64,

    #[arg(long = "log", default_value_t = 10)]
    pub log_interval: usize,

    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub cuda: u8,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<BlockFrameFlowArgs> for TrainConfig {
    fn from(a: BlockFrameFlowArgs) -> Self {
        TrainConfig {
            architecture: Architecture::BlockFrameFlow,
            dataset_dir:  a.dataset_dir,
            batch_size:   a.batch_size,
            num_epochs:   a.num_epochs,
            start_epoch:  a.start_epoch,
            lr:           a.lr,
            log_interval: a.log_interval,
            validate:     true,
            zero_center:  true,
            cuda:         a.cuda != 0,
            seed:         a.seed,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModelKind {
    BlockFrame,
    BlockFrameFlow,
}

impl From<ModelKind> for Architecture {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::BlockFrame     => Architecture::BlockFrame,
            ModelKind::BlockFrameFlow => Architecture::BlockFrameFlow,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SplitArg {
    Train,
    Dev,
}

impl From<SplitArg> for Split {
    fn from(split: SplitArg) -> Self {
        match split {
            SplitArg::Train => Split::Train,
            SplitArg::Dev   => Split::Dev,
        }
    }
}

/// Arguments for `evaluate`.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long = "dataset_dir", default_value = "data")]
    pub dataset_dir: PathBuf,

    /// Which network the checkpoint belongs to
    #[arg(long, value_enum, default_value_t = ModelKind::BlockFrame)]
    pub model: ModelKind,

    /// Epoch whose checkpoint to load
    #[arg(long)]
    pub epoch: usize,

    #[arg(long, value_enum, default_value_t = SplitArg::Dev)]
    pub split: SplitArg,

    #[arg(long = "batch_size", default_value_t = 64)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub cuda: u8,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            architecture: a.model.into(),
            dataset_dir:  a.dataset_dir,
            epoch:        a.epoch,
            split:        a.split.into(),
            batch_size:   a.batch_size,
            cuda:         a.cuda != 0,
        }
    }
}

/// Arguments for `synth`.
#[derive(Args, Debug)]
pub struct SynthArgs {
    #[arg(long = "dataset_dir", default_value = "data")]
    pub dataset_dir: PathBuf,

    #[arg(long, default_value_t = 15)]
    pub frames: usize,

    #[arg(long, default_value_t = 60)]
    pub height: usize,

    #[arg(long, default_value_t = 80)]
    pub width: usize,

    #[arg(long = "num_classes", default_value_t = 6)]
    pub num_classes: usize,

    #[arg(long, default_value_t = 120)]
    pub train: usize,

    #[arg(long, default_value_t = 30)]
    pub dev: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("clip-convnet").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_block_frame_defaults() {
        let Commands::BlockFrame(args) = parse(&["block-frame"]) else { panic!("wrong subcommand") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.architecture, Architecture::BlockFrame);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.num_epochs, 3);
        assert_eq!(cfg.start_epoch, 1);
        assert_eq!(cfg.log_interval, 10);
        assert!(!cfg.validate);
        assert!(!cfg.zero_center);
        assert!(cfg.cuda);
    }

    #[test]
    fn test_underscore_flags() {
        let Commands::BlockFrame(args) = parse(&[
            "block-frame", "--dataset_dir", "clips", "--batch_size", "8",
            "--start_epoch", "3", "--val", "1", "--cuda", "0", "--log", "2",
        ]) else {
            panic!("wrong subcommand")
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.dataset_dir, PathBuf::from("clips"));
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.start_epoch, 3);
        assert_eq!(cfg.log_interval, 2);
        assert!(cfg.validate);
        assert!(!cfg.cuda);
    }

    #[test]
    fn test_flow_always_validates_and_centers() {
        let Commands::BlockFrameFlow(args) = parse(&["block-frame-flow", "--num_epochs", "5"]) else {
            panic!("wrong subcommand")
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.architecture, Architecture::BlockFrameFlow);
        assert_eq!(cfg.num_epochs, 5);
        assert!(cfg.validate && cfg.zero_center);
        assert!(!cfg.cuda);
    }

    #[test]
    fn test_switch_out_of_range_is_rejected() {
        let parsed = Cli::try_parse_from(["clip-convnet", "block-frame", "--val", "2"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_evaluate_args() {
        let Commands::Evaluate(args) = parse(&[
            "evaluate", "--model", "block-frame-flow", "--epoch", "2", "--split", "train",
        ]) else {
            panic!("wrong subcommand")
        };
        let cfg: EvaluateConfig = args.into();
        assert_eq!(cfg.architecture, Architecture::BlockFrameFlow);
        assert_eq!(cfg.epoch, 2);
        assert_eq!(cfg.split, Split::Train);
    }
}
