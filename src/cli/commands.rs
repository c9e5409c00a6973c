// ============================================================
// Layer 1 - Command Dispatch
// ============================================================
// Turns parsed flags into a use-case config and runs it on the
// backend the user picked. The application layer never sees
// clap types.

use std::path::PathBuf;

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::{
    evaluate_use_case::{EvaluateConfig, EvaluateUseCase},
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::ml::backend::{CpuBackend, DeviceSpec, GpuBackend};

use super::Cli;

/// What a run does, decided from the flags alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Train,
    Evaluate { checkpoint: PathBuf },
}

pub fn dispatch(cli: &Cli, mode: Mode) -> Result<()> {
    let target = DeviceSpec::from_index(cli.gpu);
    tracing::info!("Device: {target}");

    match target {
        DeviceSpec::Cpu => run_on::<CpuBackend>(cli, mode, &DeviceSpec::cpu_device()),
        DeviceSpec::Gpu(index) => run_on::<GpuBackend>(cli, mode, &DeviceSpec::gpu_device(index)),
    }
}

fn run_on<B: AutodiffBackend>(cli: &Cli, mode: Mode, device: &B::Device) -> Result<()> {
    match mode {
        Mode::Train => {
            let epochs = TrainUseCase::new(cli.into()).execute::<B>(device)?;
            println!("Training complete ({epochs} epochs).");
        }
        Mode::Evaluate { checkpoint } => {
            let config = EvaluateConfig {
                config_path:   cli.config.clone(),
                input:         cli.input.clone(),
                topic_feature: cli.topic_feature.clone(),
                checkpoint,
                batch_size:    cli.batch_size as usize,
            };
            let report = EvaluateUseCase::new(config).execute::<B>(device)?;
            println!("{report}");
        }
    }
    Ok(())
}

/// Convert CLI flags into the application-layer TrainConfig
impl From<&Cli> for TrainConfig {
    fn from(cli: &Cli) -> Self {
        TrainConfig {
            config_path:   cli.config.clone(),
            input:         cli.input.clone(),
            topic_feature: cli.topic_feature.clone(),
            logdir:        cli.logdir.clone(),
            resume:        cli.resume.clone(),
            learning_rate: cli.learning_rate,
            batch_size:    cli.batch_size as usize,
            epochs:        cli.epoch,
        }
    }
}
