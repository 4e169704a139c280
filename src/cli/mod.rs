// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, SynthArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::data::synthetic::SyntheticClips;
use crate::domain::clip::ClipShape;

#[derive(Parser, Debug)]
#[command(
    name = "clip-convnet",
    version = "0.1.0",
    about = "Train 3D convnets that classify short video clips into actions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::BlockFrame(args)     => run_train(args.into()),
            Commands::BlockFrameFlow(args) => run_train(args.into()),
            Commands::Evaluate(args)       => run_evaluate(args),
            Commands::Synth(args)          => run_synth(args),
        }
    }
}

fn run_train(config: TrainConfig) -> Result<()> {
    tracing::info!(
        "Training {} on '{}' (epochs {}..={})",
        config.architecture.name(),
        config.dataset_dir.display(),
        config.start_epoch,
        config.trainer_config().last_epoch(),
    );

    let summary = TrainUseCase::new(config).execute()?;
    println!(
        "Training complete. {} epochs recorded, checkpoints in '{}'.",
        summary.history.len(),
        summary.checkpoint_dir.display()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    EvaluateUseCase::new(args.into()).execute()?;
    Ok(())
}

fn run_synth(args: SynthArgs) -> Result<()> {
    let shape = ClipShape::new(args.frames, args.height, args.width);
    let synth = SyntheticClips::new(shape, args.num_classes, args.train, args.dev, args.seed);
    synth.write_to(&args.dataset_dir)?;
    println!(
        "Wrote {} training and {} dev clips to '{}'.",
        args.train,
        args.dev,
        args.dataset_dir.display()
    );
    Ok(())
}
