// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. One flat set of flags;
// `--test <checkpoint>` switches from training to evaluation.
// All business logic is delegated to Layer 2 (application).
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::domain::error::DetectError;
use commands::Mode;

/// The main CLI struct. clap generates the argument parsing code
/// from the field attributes via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "fakenews-detect",
    version = "0.1.0",
    about = "Train and evaluate a topic-aware recurrent fake-news classifier."
)]
pub struct Cli {
    /// JSON config file with the model dimensions
    #[arg(long)]
    pub config: PathBuf,

    /// Run on this discrete GPU (WGPU backend); CPU when omitted
    #[arg(long, visible_alias = "cuda", value_name = "INDEX")]
    pub gpu: Option<usize>,

    /// Directory for checkpoints and metrics
    #[arg(long)]
    pub logdir: Option<PathBuf>,

    /// Evaluate this checkpoint file (name under --logdir) instead of training
    #[arg(long, value_name = "CHECKPOINT")]
    pub test: Option<String>,

    /// Continue training from this checkpoint file
    #[arg(long, value_name = "CHECKPOINT", conflicts_with = "test")]
    pub resume: Option<PathBuf>,

    /// JSON-lines file with the labelled records
    #[arg(long)]
    pub input: PathBuf,

    /// Directory holding the pretrained topic feature
    #[arg(long)]
    pub topic_feature: PathBuf,

    #[arg(long, default_value_t = 0.2)]
    pub learning_rate: f64,

    /// Records per batch; partial batches are dropped
    #[arg(long, default_value_t = 32, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Number of full passes over the training data
    #[arg(long, default_value_t = 10)]
    pub epoch: usize,
}

impl Cli {
    /// Work out what to run. Checks flag combinations only and
    /// never touches the filesystem.
    pub fn mode(&self) -> Result<Mode, DetectError> {
        match (&self.test, &self.logdir) {
            (Some(_), None) => Err(DetectError::Usage(
                "--test needs --logdir to locate the checkpoint".to_string(),
            )),
            (Some(name), Some(dir)) => Ok(Mode::Evaluate { checkpoint: dir.join(name) }),
            (None, _) => Ok(Mode::Train),
        }
    }

    /// Validate the flags, then dispatch to the right use case on the
    /// selected device.
    pub fn run(self) -> Result<()> {
        let mode = self.mode()?;
        commands::dispatch(&self, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [&str; 7] = [
        "fakenews-detect",
        "--config", "config.json",
        "--input", "records.jsonl",
        "--topic-feature", "topic",
    ];

    fn parse(extra: &[&str]) -> Cli {
        let args: Vec<&str> = BASE.iter().chain(extra).copied().collect();
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.learning_rate, 0.2);
        assert_eq!(cli.batch_size, 32);
        assert_eq!(cli.epoch, 10);
        assert_eq!(cli.gpu, None);
        assert!(matches!(cli.mode(), Ok(Mode::Train)));
    }

    #[test]
    fn test_cuda_alias_selects_gpu() {
        assert_eq!(parse(&["--cuda", "1"]).gpu, Some(1));
        assert_eq!(parse(&["--gpu", "0"]).gpu, Some(0));
    }

    #[test]
    fn test_checkpoint_resolved_under_logdir() {
        let cli = parse(&["--logdir", "runs", "--test", "3.ckpt"]);
        match cli.mode().unwrap() {
            Mode::Evaluate { checkpoint } => assert_eq!(checkpoint, PathBuf::from("runs/3.ckpt")),
            Mode::Train => panic!("expected evaluation mode"),
        }
    }

    #[test]
    fn test_evaluation_without_logdir_is_usage_error() {
        let cli = parse(&["--test", "3.ckpt"]);
        assert!(matches!(cli.mode(), Err(DetectError::Usage(_))));
    }

    #[test]
    fn test_usage_error_raised_before_any_file_is_read() {
        // None of the BASE paths exist; the usage error must win.
        let err = parse(&["--test", "3.ckpt"]).run().unwrap_err();
        assert!(matches!(err.downcast_ref::<DetectError>(), Some(DetectError::Usage(_))));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let args: Vec<&str> = BASE.iter().copied().chain(["--batch-size", "0"]).collect();
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_required_flags() {
        assert!(Cli::try_parse_from(["fakenews-detect", "--config", "c.json"]).is_err());
    }
}
