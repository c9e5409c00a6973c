// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Orchestrates one evaluation run:
//
//   Step 1: Config, topic feature, dataset   (prepare.rs)
//   Step 2: Restore the checkpointed model   (Layer 6 - infra)
//   Step 3: Drop to the inference backend    (Layer 5 - ml)
//   Step 4: In-order drop-last batches       (Layer 4 - data)
//   Step 5: Evaluate and report              (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};

use crate::application::prepare::prepare;
use crate::data::{batcher::NewsBatcher, dataloader::BatchLoader};
use crate::infra::checkpoint::CheckpointStore;
use crate::ml::evaluator::{AccuracyReport, Evaluator};

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateConfig {
    pub config_path:   PathBuf,
    pub input:         PathBuf,
    pub topic_feature: PathBuf,
    pub checkpoint:    PathBuf,
    pub batch_size:    usize,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    /// Evaluate the checkpoint on `device`. Missing classes are
    /// logged as warnings; the report is returned either way.
    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<AccuracyReport> {
        let cfg = &self.config;

        // ── Step 1: Config, topic feature and dataset ────────────────────────
        let prepared = prepare(&cfg.config_path, &cfg.input, &cfg.topic_feature)?;
        let model_cfg = prepared.model_cfg;

        // ── Step 2: Restore the trained parameters ────────────────────────────
        let ckpt = CheckpointStore::load(&cfg.checkpoint)
            .with_context(|| format!("Cannot evaluate '{}'", cfg.checkpoint.display()))?;
        let model = ckpt.restore_model::<B>(&model_cfg, device)?;
        tracing::info!("Loaded checkpoint '{}' (epoch {})", cfg.checkpoint.display(), ckpt.epoch + 1);

        // ── Step 3: No gradient tracking from here on ─────────────────────────
        let model = model.valid();

        // ── Step 4: Batches in file order ─────────────────────────────────────
        let batcher = NewsBatcher::new(
            model_cfg.input_size,
            model_cfg.topic_size,
            model_cfg.height,
            prepared.app.data.max_length,
        );
        let loader = BatchLoader::<B::InnerBackend>::new(batcher, prepared.dataset, cfg.batch_size, None, device);

        // ── Step 5: Evaluate ──────────────────────────────────────────────────
        let mut evaluator = Evaluator::new(model_cfg.rnn_layers, cfg.batch_size, model_cfg.hidden_size, device);
        let report = evaluator.evaluate(&model, &loader)?;

        for diagnostic in report.missing_classes() {
            tracing::warn!("{diagnostic}");
        }
        Ok(report)
    }
}
