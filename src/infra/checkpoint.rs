// ============================================================
// Layer 6 - Checkpoint Store
// ============================================================
// One file per finished epoch, holding everything needed to
// evaluate or resume:
//
//   logdir/
//     1.ckpt   ← after epoch index 0
//     2.ckpt   ← after epoch index 1
//     ...
//
// File contents (bincode envelope):
//   format_version  u32
//   epoch           usize  (0-based epoch index)
//   model_config    the DetectModelConfig as JSON
//   model           full-precision Burn record bytes
//   optimizer       full-precision Burn record bytes
//
// The stored config is compared with the current one before any
// record is decoded: Burn asserts on layer counts while loading a
// record, so an architecture mismatch has to be caught first.
//
// Full precision matters: a half-precision recorder would not
// reproduce bit-identical outputs after a reload.

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    optim::Optimizer,
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::{DetectError, DetectResult};
use crate::ml::model::{DetectModel, DetectModelConfig};

/// Extension of every checkpoint file
pub const CHECKPOINT_EXT: &str = "ckpt";

const FORMAT_VERSION: u32 = 2;

type BytesRecorder = BinBytesRecorder<FullPrecisionSettings>;

#[derive(Serialize, Deserialize)]
struct Envelope {
    format_version: u32,
    epoch:          usize,
    model_config:   String,
    model:          Vec<u8>,
    optimizer:      Vec<u8>,
}

/// Writes checkpoints into one directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Nothing touches the filesystem until the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File written for a 0-based epoch index (named 1-based)
    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{}.{CHECKPOINT_EXT}", epoch + 1))
    }

    /// Persist model and optimizer state after `epoch`.
    /// Creates the directory on first use.
    pub fn save<B, O>(
        &self,
        epoch:  usize,
        config: &DetectModelConfig,
        model:  &DetectModel<B>,
        optim:  &O,
    ) -> DetectResult<PathBuf>
    where
        B: AutodiffBackend,
        O: Optimizer<DetectModel<B>, B>,
    {
        fs::create_dir_all(&self.dir).map_err(|e| DetectError::io(&self.dir, e))?;
        let path = self.path_for(epoch);

        let model_config = serde_json::to_string(config)
            .map_err(|e| DetectError::format(&path, format!("cannot encode model config: {e}")))?;
        let recorder = BytesRecorder::default();
        let model_bytes = recorder
            .record(model.clone().into_record(), ())
            .map_err(|e| DetectError::format(&path, format!("cannot encode model: {e:?}")))?;
        let optim_bytes = recorder
            .record(optim.to_record(), ())
            .map_err(|e| DetectError::format(&path, format!("cannot encode optimizer: {e:?}")))?;

        let envelope = Envelope {
            format_version: FORMAT_VERSION,
            epoch,
            model_config,
            model: model_bytes,
            optimizer: optim_bytes,
        };
        let bytes = bincode::serialize(&envelope)
            .map_err(|e| DetectError::format(&path, e.to_string()))?;
        fs::write(&path, bytes).map_err(|e| DetectError::io(&path, e))?;

        tracing::debug!("Saved checkpoint: epoch {} → '{}'", epoch, path.display());
        Ok(path)
    }

    /// Read a checkpoint file. Model and optimizer state are decoded
    /// later against a concrete model config.
    pub fn load(path: impl AsRef<Path>) -> DetectResult<Checkpoint> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DetectError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).map_err(|e| DetectError::io(path, e))?;
        let envelope: Envelope = bincode::deserialize(&bytes)
            .map_err(|e| DetectError::format(path, format!("not a checkpoint file: {e}")))?;
        if envelope.format_version != FORMAT_VERSION {
            return Err(DetectError::format(
                path,
                format!("unsupported format version {}", envelope.format_version),
            ));
        }
        Ok(Checkpoint {
            path: path.to_path_buf(),
            epoch: envelope.epoch,
            model_config: envelope.model_config,
            model: envelope.model,
            optimizer: envelope.optimizer,
        })
    }
}

/// A checkpoint read from disk
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path:         PathBuf,
    /// 0-based index of the epoch that produced this checkpoint
    pub epoch:    usize,
    model_config: String,
    model:        Vec<u8>,
    optimizer:    Vec<u8>,
}

impl Checkpoint {
    /// Every model dimension whose stored value differs from `config`.
    /// Fails if the stored config cannot be read back.
    fn config_mismatches(&self, config: &DetectModelConfig) -> DetectResult<Vec<String>> {
        let stored: Value = serde_json::from_str(&self.model_config)
            .map_err(|e| DetectError::format(&self.path, format!("cannot decode model config: {e}")))?;
        let current = serde_json::to_value(config)
            .map_err(|e| DetectError::format(&self.path, format!("cannot encode model config: {e}")))?;

        let (Value::Object(stored), Value::Object(current)) = (stored, current) else {
            return Err(DetectError::format(&self.path, "model config is not an object"));
        };
        Ok(current
            .iter()
            .filter(|(key, value)| stored.get(*key) != Some(*value))
            .map(|(key, value)| {
                let was = stored.get(key).map_or("missing".to_string(), Value::to_string);
                format!("{key}: checkpoint {was}, configured {value}")
            })
            .collect())
    }

    /// Build a model from `config` and load the stored parameters.
    ///
    /// The checkpoint must have been written by a model with exactly
    /// this config.
    pub fn restore_model<B: Backend>(
        &self,
        config: &DetectModelConfig,
        device: &B::Device,
    ) -> DetectResult<DetectModel<B>> {
        let mismatches = self.config_mismatches(config)?;
        if !mismatches.is_empty() {
            return Err(DetectError::format(
                &self.path,
                format!("architecture differs from the configured model ({})", mismatches.join(", ")),
            ));
        }

        let record = BytesRecorder::default()
            .load(self.model.clone(), device)
            .map_err(|e| DetectError::format(&self.path, format!("cannot decode model state: {e:?}")))?;
        Ok(config.init::<B>(device)?.load_record(record))
    }

    /// Restore optimizer state (Adam moments) for continued training
    pub fn restore_optimizer<B, O>(&self, optim: O, device: &B::Device) -> DetectResult<O>
    where
        B: AutodiffBackend,
        O: Optimizer<DetectModel<B>, B>,
    {
        let record = BytesRecorder::default()
            .load(self.optimizer.clone(), device)
            .map_err(|e| DetectError::format(&self.path, format!("cannot decode optimizer state: {e:?}")))?;
        Ok(optim.load_record(record))
    }
}
