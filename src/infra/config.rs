// ============================================================
// Layer 6 - Application Config File
// ============================================================
// The config file is JSON with a required `model` section and
// an optional `data` section:
//
//   {
//     "model": {
//       "input_size": 300, "hidden_size": 128, "rnn_layers": 2,
//       "out_channels": 16, "height": 2, "cnn_layers": 2,
//       "topic_size": 20, "linear_hidden_size": 64,
//       "linear_layers": 2, "output_size": 2
//     },
//     "data": { "sequence_key": "sequence", "max_length": 64 }
//   }
//
// Unknown keys and missing model keys are rejected at load
// time; the model section is then validated once and frozen
// into the Burn `DetectModelConfig`.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::error::{DetectError, DetectResult};
use crate::ml::model::DetectModelConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    pub input_size:         usize,
    pub hidden_size:        usize,
    pub rnn_layers:         usize,
    pub out_channels:       usize,
    pub height:             usize,
    pub cnn_layers:         usize,
    pub topic_size:         usize,
    pub linear_hidden_size: usize,
    pub linear_layers:      usize,
    pub output_size:        usize,
}

impl From<&ModelSection> for DetectModelConfig {
    fn from(m: &ModelSection) -> Self {
        DetectModelConfig::new(
            m.input_size, m.hidden_size, m.rnn_layers,
            m.out_channels, m.height, m.cnn_layers,
            m.topic_size, m.linear_hidden_size, m.linear_layers,
            m.output_size,
        )
    }
}

/// Where to find each field in an input record, and how to batch it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DataConfig {
    pub sequence_key: String,
    pub text_key:     String,
    pub label_key:    String,
    /// Longest sequence kept after padding; longer ones are truncated
    pub max_length:   Option<usize>,
    /// Fixed shuffle seed for reproducible training runs
    pub shuffle_seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sequence_key: "sequence".to_string(),
            text_key:     "text".to_string(),
            label_key:    "label".to_string(),
            max_length:   None,
            shuffle_seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub model: ModelSection,
    #[serde(default)]
    pub data:  DataConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> DetectResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DetectError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path).map_err(|e| DetectError::io(path, e))?;
        let cfg = Self::from_json(&json)?;
        tracing::debug!("Loaded config from '{}'", path.display());
        Ok(cfg)
    }

    pub fn from_json(json: &str) -> DetectResult<Self> {
        let cfg: AppConfig = serde_json::from_str(json)
            .map_err(|e| DetectError::InvalidConfig(e.to_string()))?;
        cfg.model_config().validate()?;
        if cfg.data.max_length == Some(0) {
            return Err(DetectError::InvalidConfig("data.max_length must be positive".to_string()));
        }
        Ok(cfg)
    }

    pub fn model_config(&self) -> DetectModelConfig {
        (&self.model).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#""model": {
        "input_size": 4, "hidden_size": 8, "rnn_layers": 2,
        "out_channels": 3, "height": 2, "cnn_layers": 2,
        "topic_size": 5, "linear_hidden_size": 6,
        "linear_layers": 2, "output_size": 2
    }"#;

    #[test]
    fn test_model_only_uses_data_defaults() {
        let cfg = AppConfig::from_json(&format!("{{{MODEL}}}")).unwrap();
        assert_eq!(cfg.data, DataConfig::default());
        assert_eq!(cfg.model_config().fused_size(), 8 + 3 * 2);
    }

    #[test]
    fn test_data_section_overrides() {
        let json = format!(r#"{{{MODEL}, "data": {{"text_key": "tweet", "max_length": 40}}}}"#);
        let cfg = AppConfig::from_json(&json).unwrap();
        assert_eq!(cfg.data.text_key, "tweet");
        assert_eq!(cfg.data.sequence_key, "sequence");
        assert_eq!(cfg.data.max_length, Some(40));
    }

    #[test]
    fn test_unknown_model_key_rejected() {
        let json = MODEL.replace("\"output_size\": 2", "\"output_size\": 2, \"dropout\": 1");
        let err = AppConfig::from_json(&format!("{{{json}}}")).unwrap_err();
        assert!(matches!(err, DetectError::InvalidConfig(msg) if msg.contains("dropout")));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let json = format!(r#"{{{MODEL}, "optimizer": {{}}}}"#);
        assert!(AppConfig::from_json(&json).is_err());
    }

    #[test]
    fn test_missing_model_key_rejected() {
        let json = MODEL.replace("\"height\": 2,", "");
        let err = AppConfig::from_json(&format!("{{{json}}}")).unwrap_err();
        assert!(matches!(err, DetectError::InvalidConfig(msg) if msg.contains("height")));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let json = MODEL.replace("\"rnn_layers\": 2", "\"rnn_layers\": 0");
        assert!(AppConfig::from_json(&format!("{{{json}}}")).is_err());
    }
}
