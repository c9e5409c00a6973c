// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Per batch:
//   1. zero the shared hidden state h0
//   2. forward → logits [batch, classes]
//   3. cross-entropy against the integer labels
//   4. backward; Burn returns a fresh gradient set per
//      backward pass, so nothing accumulates across steps
//   5. clip the global gradient norm to 5.0
//   6. one Adam step
//
// Every 30th step logs loss and gradient norm. At the end of
// every epoch a checkpoint is written when a log directory is
// configured; a failed write is logged and training goes on.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::path::Path;

use burn::{
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::dataloader::BatchLoader;
use crate::domain::error::DetectResult;
use crate::infra::{
    checkpoint::CheckpointStore,
    metrics::{EpochAccumulator, EpochMetrics, MetricsLogger},
};
use crate::ml::{
    grad::{clip_grad_norm, GradNorm, MAX_GRAD_NORM},
    hidden::HiddenState,
    model::{DetectModel, DetectModelConfig},
};

/// Steps between two progress lines
pub const LOG_EVERY: usize = 30;

/// Progress line for one step. Reports the norm the optimizer saw.
fn step_line(step: usize, loss: f64, norm: &GradNorm) -> String {
    format!("Step: {} Loss: {:.5} L2 gradient norm: {:.5}", step, loss, norm.clipped)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSettings {
    pub learning_rate: f64,
    pub epochs:        usize,
    pub batch_size:    usize,
}

pub struct Trainer<B: AutodiffBackend> {
    model_cfg: DetectModelConfig,
    settings:  TrainSettings,
    hidden:    HiddenState<B>,
    criterion: CrossEntropyLoss<B>,
    store:     Option<CheckpointStore>,
    metrics:   Option<MetricsLogger>,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// `logdir`: where checkpoints and metrics go; `None` trains in
    /// memory only.
    pub fn new(
        model_cfg: &DetectModelConfig,
        settings:  TrainSettings,
        logdir:    Option<&Path>,
        device:    &B::Device,
    ) -> Self {
        let metrics = logdir.and_then(|dir| match MetricsLogger::new(dir) {
            Ok(logger) => Some(logger),
            Err(e) => {
                tracing::warn!("Metrics disabled: {e}");
                None
            }
        });

        Self {
            model_cfg: model_cfg.clone(),
            settings,
            hidden: HiddenState::new(model_cfg.rnn_layers, settings.batch_size, model_cfg.hidden_size, device),
            criterion: CrossEntropyLossConfig::new().init(device),
            store: logdir.map(CheckpointStore::new),
            metrics,
        }
    }

    /// Train from `start_epoch` (0-based) up to the configured epoch
    /// count. Returns the trained model and optimizer.
    pub fn fit<O>(
        &mut self,
        mut model:   DetectModel<B>,
        mut optim:   O,
        loader:      &BatchLoader<B>,
        start_epoch: usize,
    ) -> DetectResult<(DetectModel<B>, O)>
    where
        O: Optimizer<DetectModel<B>, B>,
    {
        let epochs = self.settings.epochs;
        tracing::info!(
            "Training epochs {}..{} over {} batches of {}",
            start_epoch + 1,
            epochs,
            loader.num_batches(),
            loader.batch_size(),
        );

        for epoch in start_epoch..epochs {
            let (trained, metrics) = self.train_epoch(model, &mut optim, loader, epoch)?;
            model = trained;

            println!(
                "Epoch {:>3}/{} | loss={:.5} | grad_norm={:.5} | batches={}",
                metrics.epoch, epochs, metrics.mean_loss, metrics.mean_grad_norm, metrics.batches,
            );
            self.persist(epoch, &model, &optim, &metrics);
        }

        tracing::info!("Training complete!");
        Ok((model, optim))
    }

    fn train_epoch<O>(
        &mut self,
        mut model: DetectModel<B>,
        optim:     &mut O,
        loader:    &BatchLoader<B>,
        epoch:     usize,
    ) -> DetectResult<(DetectModel<B>, EpochMetrics)>
    where
        O: Optimizer<DetectModel<B>, B>,
    {
        let mut acc = EpochAccumulator::default();

        for (step, batch) in loader.iter().enumerate() {
            let h0 = self.hidden.reset_for(batch.len())?;

            let logits = model.forward(batch.sequences, batch.topics, h0)?;
            let loss = self.criterion.forward(logits, batch.labels);
            let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

            let mut grads = GradientsParams::from_grads(loss.backward(), &model);
            let norm = clip_grad_norm::<B, _>(&model, &mut grads, MAX_GRAD_NORM);
            model = optim.step(self.settings.learning_rate, model, grads);

            if step % LOG_EVERY == 0 {
                tracing::info!("{}", step_line(step, loss_value, &norm));
            }
            tracing::debug!("Step {} gradient norm before clipping: {:.5}", step, norm.total);
            acc.push(loss_value, norm.clipped);
        }

        Ok((model, acc.finish(epoch + 1)))
    }

    // Checkpoint + metrics for a finished epoch. Failures here cost
    // the epoch's persistence only.
    fn persist<O>(&self, epoch: usize, model: &DetectModel<B>, optim: &O, metrics: &EpochMetrics)
    where
        O: Optimizer<DetectModel<B>, B>,
    {
        if let Some(store) = &self.store {
            match store.save(epoch, &self.model_cfg, model, optim) {
                Ok(path) => tracing::info!("[+] {} saved", path.display()),
                Err(e) => tracing::error!("Checkpoint for epoch {} not saved: {e}", epoch + 1),
            }
        }
        if let Some(logger) = &self.metrics {
            if let Err(e) = logger.log(metrics) {
                tracing::error!("Metrics for epoch {} not written: {e}", epoch + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::AdamConfig;

    use crate::data::{
        batcher::NewsBatcher,
        dataset::{tests::{records, FixedTopics}, SequenceDataset},
    };
    use crate::infra::checkpoint::CheckpointStore;
    use crate::ml::model::tests::small_config;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn setup(n: usize, batch_size: usize) -> (DetectModelConfig, BatchLoader<TestBackend>) {
        let cfg = small_config();
        let topics = FixedTopics { topic_size: cfg.topic_size, height: cfg.height };
        let dataset = SequenceDataset::new(records(n, cfg.input_size), &topics, cfg.input_size, cfg.topic_size, cfg.height).unwrap();
        let batcher = NewsBatcher::new(cfg.input_size, cfg.topic_size, cfg.height, None);
        let loader = BatchLoader::new(batcher, dataset, batch_size, Some(42), &Default::default());
        (cfg, loader)
    }

    fn settings(epochs: usize, batch_size: usize) -> TrainSettings {
        TrainSettings { learning_rate: 0.01, epochs, batch_size }
    }

    #[test]
    fn test_step_line_reports_clipped_norm() {
        let line = step_line(30, 0.69315, &GradNorm { total: 12.5, clipped: MAX_GRAD_NORM });
        assert_eq!(line, "Step: 30 Loss: 0.69315 L2 gradient norm: 5.00000");
        assert!(!line.contains("12.5"));
    }

    #[test]
    fn test_writes_one_checkpoint_per_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, loader) = setup(10, 4);
        let device = Default::default();
        let model: DetectModel<TestBackend> = cfg.init(&device).unwrap();
        let optim = AdamConfig::new().init::<TestBackend, DetectModel<TestBackend>>();

        let mut trainer = Trainer::new(&cfg, settings(2, 4), Some(dir.path()), &device);
        trainer.fit(model, optim, &loader, 0).unwrap();

        assert!(dir.path().join("1.ckpt").exists());
        assert!(dir.path().join("2.ckpt").exists());
        assert!(!dir.path().join("3.ckpt").exists());
        assert_eq!(CheckpointStore::load(dir.path().join("2.ckpt")).unwrap().epoch, 1);

        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_trains_without_logdir() {
        let (cfg, loader) = setup(8, 4);
        let device = Default::default();
        let model: DetectModel<TestBackend> = cfg.init(&device).unwrap();
        let optim = AdamConfig::new().init::<TestBackend, DetectModel<TestBackend>>();

        let mut trainer = Trainer::new(&cfg, settings(1, 4), None, &device);
        assert!(trainer.fit(model, optim, &loader, 0).is_ok());
    }

    #[test]
    fn test_parameters_change_after_training() {
        let (cfg, loader) = setup(8, 4);
        let device = Default::default();
        let model: DetectModel<TestBackend> = cfg.init(&device).unwrap();
        let before = model.head[0].weight.val().into_data().to_vec::<f32>().unwrap();
        let optim = AdamConfig::new().init::<TestBackend, DetectModel<TestBackend>>();

        let mut trainer = Trainer::new(&cfg, settings(1, 4), None, &device);
        let (model, _) = trainer.fit(model, optim, &loader, 0).unwrap();
        let after = model.head[0].weight.val().into_data().to_vec::<f32>().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_resume_past_last_epoch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, loader) = setup(8, 4);
        let device = Default::default();
        let model: DetectModel<TestBackend> = cfg.init(&device).unwrap();
        let optim = AdamConfig::new().init::<TestBackend, DetectModel<TestBackend>>();

        let mut trainer = Trainer::new(&cfg, settings(2, 4), Some(dir.path()), &device);
        trainer.fit(model, optim, &loader, 2).unwrap();
        assert!(!dir.path().join("1.ckpt").exists());
    }
}
