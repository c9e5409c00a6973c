// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Config, topic feature, dataset   (prepare.rs)
//   Step 2: Shuffled drop-last batch loader  (Layer 4 - data)
//   Step 3: Fresh model + Adam optimiser     (Layer 5 - ml)
//   Step 4: Optionally resume a checkpoint   (Layer 6 - infra)
//   Step 5: Run the training loop            (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{optim::AdamConfig, tensor::backend::AutodiffBackend};

use crate::application::prepare::prepare;
use crate::data::{batcher::NewsBatcher, dataloader::BatchLoader};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::{
    model::DetectModel,
    trainer::{TrainSettings, Trainer},
};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub config_path:   PathBuf,
    pub input:         PathBuf,
    pub topic_feature: PathBuf,
    /// Checkpoints and metrics go here; `None` keeps everything in memory
    pub logdir:        Option<PathBuf>,
    /// Checkpoint to continue from
    pub resume:        Option<PathBuf>,
    pub learning_rate: f64,
    pub batch_size:    usize,
    pub epochs:        usize,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on `device`. Returns the number of epochs run in this call.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<usize> {
        let cfg = &self.config;

        // ── Step 1: Config, topic feature and dataset ────────────────────────
        let prepared = prepare(&cfg.config_path, &cfg.input, &cfg.topic_feature)?;
        let model_cfg = prepared.model_cfg;

        // ── Step 2: Batch loader ──────────────────────────────────────────────
        // A fixed seed in the config makes the shuffle order reproducible.
        let seed = prepared.app.data.shuffle_seed.unwrap_or_else(rand::random);
        tracing::info!("Shuffle seed: {seed}");
        let batcher = NewsBatcher::new(
            model_cfg.input_size,
            model_cfg.topic_size,
            model_cfg.height,
            prepared.app.data.max_length,
        );
        let loader = BatchLoader::<B>::new(batcher, prepared.dataset, cfg.batch_size, Some(seed), device);
        if loader.num_batches() == 0 {
            tracing::warn!(
                "{} records never fill a batch of {}; every epoch will be empty",
                loader.num_items(),
                cfg.batch_size,
            );
        }

        // ── Step 3: Model and optimiser ───────────────────────────────────────
        let mut model: DetectModel<B> = model_cfg.init(device)?;
        let mut optim = AdamConfig::new().init::<B, DetectModel<B>>();

        // ── Step 4: Resume ────────────────────────────────────────────────────
        let mut start_epoch = 0;
        if let Some(path) = &cfg.resume {
            let ckpt = CheckpointStore::load(path)
                .with_context(|| format!("Cannot resume from '{}'", path.display()))?;
            model = ckpt.restore_model::<B>(&model_cfg, device)?;
            optim = ckpt.restore_optimizer::<B, _>(optim, device)?;
            start_epoch = ckpt.epoch + 1;
            tracing::info!("Resumed from '{}' at epoch {}", path.display(), start_epoch + 1);
        }

        // ── Step 5: Training loop ─────────────────────────────────────────────
        let settings = TrainSettings {
            learning_rate: cfg.learning_rate,
            epochs:        cfg.epochs,
            batch_size:    cfg.batch_size,
        };
        let mut trainer = Trainer::new(&model_cfg, settings, cfg.logdir.as_deref(), device);
        trainer.fit(model, optim, &loader, start_epoch)?;

        Ok(cfg.epochs.saturating_sub(start_epoch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::application::prepare::tests::fixture;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn train_config(dir: &std::path::Path, epochs: usize, resume: Option<PathBuf>) -> TrainConfig {
        let (config_path, input, topic_feature) = fixture(dir, 12);
        TrainConfig {
            config_path,
            input,
            topic_feature,
            logdir: Some(dir.join("logs")),
            resume,
            learning_rate: 0.05,
            batch_size: 4,
            epochs,
        }
    }

    #[test]
    fn test_train_writes_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = TrainUseCase::new(train_config(dir.path(), 2, None));
        let ran = use_case.execute::<TestBackend>(&Default::default()).unwrap();

        assert_eq!(ran, 2);
        assert!(dir.path().join("logs/1.ckpt").exists());
        assert!(dir.path().join("logs/2.ckpt").exists());
        assert!(dir.path().join("logs/metrics.csv").exists());
    }

    #[test]
    fn test_resume_continues_after_stored_epoch() {
        let dir = tempfile::tempdir().unwrap();
        TrainUseCase::new(train_config(dir.path(), 1, None))
            .execute::<TestBackend>(&Default::default())
            .unwrap();

        let resume = Some(dir.path().join("logs/1.ckpt"));
        let ran = TrainUseCase::new(train_config(dir.path(), 3, resume))
            .execute::<TestBackend>(&Default::default())
            .unwrap();

        assert_eq!(ran, 2);
        assert!(dir.path().join("logs/3.ckpt").exists());
        assert!(!dir.path().join("logs/4.ckpt").exists());
    }

    #[test]
    fn test_resume_from_missing_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        let resume = Some(dir.path().join("logs/9.ckpt"));
        let err = TrainUseCase::new(train_config(dir.path(), 1, resume))
            .execute::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("Cannot resume"));
    }
}
