// ============================================================
// Layer 2 - Shared Run Preparation
// ============================================================
// Both workflows start the same way:
//
//   Step 1: Parse and validate the config file   (Layer 6 - infra)
//   Step 2: Load the pretrained topic feature    (Layer 6 - infra)
//   Step 3: Read the JSON-lines records           (Layer 4 - data)
//   Step 4: Build the dataset                     (Layer 4 - data)

use std::path::Path;

use anyhow::{Context, Result};

use crate::data::{dataset::SequenceDataset, loader::JsonLinesLoader};
use crate::domain::traits::RecordSource;
use crate::infra::{config::AppConfig, topic_feature::TopicFeature};
use crate::ml::model::DetectModelConfig;

#[derive(Debug)]
pub struct Prepared {
    pub app:       AppConfig,
    pub model_cfg: DetectModelConfig,
    pub dataset:   SequenceDataset,
}

pub fn prepare(config: &Path, input: &Path, topic_feature: &Path) -> Result<Prepared> {
    let app = AppConfig::load(config)
        .with_context(|| format!("Failed to load config '{}'", config.display()))?;
    let model_cfg = app.model_config();

    let topics = TopicFeature::load(topic_feature)
        .with_context(|| format!("Failed to load topic feature from '{}'", topic_feature.display()))?;

    let records = JsonLinesLoader::new(input, app.data.clone()).load_all()?;

    let dataset = SequenceDataset::new(
        records,
        &topics,
        model_cfg.input_size,
        model_cfg.topic_size,
        model_cfg.height,
    )
    .context("Records do not fit the configured model")?;

    let [false_count, true_count] = dataset.label_counts();
    tracing::info!("Label balance: {true_count} true, {false_count} false");

    Ok(Prepared { app, model_cfg, dataset })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    use crate::domain::error::DetectError;

    pub(crate) const CONFIG: &str = r#"{
        "model": {
            "input_size": 3, "hidden_size": 6, "rnn_layers": 1,
            "out_channels": 2, "height": 2, "cnn_layers": 1,
            "topic_size": 3, "linear_hidden_size": 5,
            "linear_layers": 2, "output_size": 2
        },
        "data": { "shuffle_seed": 7 }
    }"#;

    const TOPIC_FEATURE: &str = r#"{
        "labels": [1, 0],
        "vocabulary": ["vaccine", "election", "hoax"],
        "topic_word": [
            [[1.0, 0.0, 0.5], [0.0, 2.0, 0.0], [0.5, 0.5, 3.0]],
            [[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0]]
        ]
    }"#;

    /// Lay out a config, a topic feature dir and `n` input records
    /// under `dir`. Returns (config, input, topic_feature) paths.
    pub(crate) fn fixture(dir: &Path, n: usize) -> (std::path::PathBuf, std::path::PathBuf, std::path::PathBuf) {
        let config = dir.join("config.json");
        fs::write(&config, CONFIG).unwrap();

        let topic_dir = dir.join("topic");
        fs::create_dir_all(&topic_dir).unwrap();
        fs::write(topic_dir.join("topic_feature.json"), TOPIC_FEATURE).unwrap();

        let lines: Vec<String> = (0..n)
            .map(|i| {
                let len = 1 + i % 3;
                let seq: Vec<String> = (0..len)
                    .map(|t| format!("[{:.2}, {:.2}, {:.2}]", i as f32 * 0.1, t as f32 * 0.2, 0.5))
                    .collect();
                let text = if i % 2 == 0 { "Vaccine hoax!" } else { "election news" };
                format!(r#"{{"sequence": [{}], "text": "{text}", "label": {}}}"#, seq.join(", "), i % 2)
            })
            .collect();
        let input = dir.join("records.jsonl");
        fs::write(&input, lines.join("\n")).unwrap();

        (config, input, topic_dir)
    }

    #[test]
    fn test_prepare_builds_dataset() {
        use burn::data::dataset::Dataset;

        let dir = tempfile::tempdir().unwrap();
        let (config, input, topic) = fixture(dir.path(), 9);
        let prepared = prepare(&config, &input, &topic).unwrap();
        assert_eq!(prepared.dataset.len(), 9);
        assert_eq!(prepared.dataset.label_counts(), [5, 4]);
        assert_eq!(prepared.app.data.shuffle_seed, Some(7));
    }

    #[test]
    fn test_topic_shape_must_match_model() {
        let dir = tempfile::tempdir().unwrap();
        let (config, input, topic) = fixture(dir.path(), 4);
        fs::write(&config, CONFIG.replace(r#""topic_size": 3"#, r#""topic_size": 4"#)).unwrap();

        let err = prepare(&config, &input, &topic).unwrap_err();
        assert!(matches!(err.downcast_ref::<DetectError>(), Some(DetectError::Shape { .. })));
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _, topic) = fixture(dir.path(), 4);
        let err = prepare(&config, &dir.path().join("nope.jsonl"), &topic).unwrap_err();
        assert!(matches!(err.downcast_ref::<DetectError>(), Some(DetectError::NotFound(_))));
    }
}
