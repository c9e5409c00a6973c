// ============================================================
// Layer 6 - Pretrained Topic Feature
// ============================================================
// Loads the frozen topic model from `<dir>/topic_feature.json`
// and turns raw text into a [topic_size, height] matrix, one
// column per label the topic model was fitted on:
//
//   {
//     "labels":     [1, 0],
//     "vocabulary": ["vaccine", "election", ...],
//     "topic_word": [ [[w, w, ...], ...],     ← label 1: topics × words
//                     [[w, w, ...], ...] ]    ← label 0
//   }
//
// For a text, every in-vocabulary word adds its weight to each
// (topic, label) cell; each label column is then normalised to
// a distribution (uniform when no word matched).
//
// Words are normalised the same way the vocabulary was built:
// lowercased, with punctuation stripped from the edges.

use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;

use crate::domain::error::{DetectError, DetectResult};
use crate::domain::traits::TopicExtractor;

pub const ARTIFACT_FILE: &str = "topic_feature.json";

#[derive(Debug, Deserialize)]
struct Artifact {
    labels:     Vec<i64>,
    vocabulary: Vec<String>,
    topic_word: Vec<Vec<Vec<f32>>>,
}

#[derive(Debug)]
pub struct TopicFeature {
    labels:     Vec<i64>,
    vocabulary: HashMap<String, usize>,
    /// [label][topic][word]
    topic_word: Vec<Vec<Vec<f32>>>,
    num_topics: usize,
}

impl TopicFeature {
    /// Load the artifact stored in `dir`
    pub fn load(dir: impl AsRef<Path>) -> DetectResult<Self> {
        let path = dir.as_ref().join(ARTIFACT_FILE);
        if !path.exists() {
            return Err(DetectError::NotFound(path));
        }
        let json = fs::read_to_string(&path).map_err(|e| DetectError::io(&path, e))?;
        let feature = Self::from_json(&json).map_err(|reason| DetectError::Data {
            source_name: path.display().to_string(),
            line: 1,
            reason,
        })?;
        tracing::info!(
            "Loaded topic feature: {} topics × {} labels, {} words",
            feature.num_topics,
            feature.labels.len(),
            feature.vocabulary.len(),
        );
        Ok(feature)
    }

    fn from_json(json: &str) -> Result<Self, String> {
        let artifact: Artifact = serde_json::from_str(json).map_err(|e| e.to_string())?;

        if artifact.labels.is_empty() {
            return Err("artifact lists no labels".to_string());
        }
        if artifact.topic_word.len() != artifact.labels.len() {
            return Err(format!(
                "topic_word has {} label blocks, expected {}",
                artifact.topic_word.len(),
                artifact.labels.len()
            ));
        }
        let num_topics = artifact.topic_word[0].len();
        if num_topics == 0 {
            return Err("artifact has no topics".to_string());
        }
        let words = artifact.vocabulary.len();
        for (l, block) in artifact.topic_word.iter().enumerate() {
            if block.len() != num_topics {
                return Err(format!("label block {l} has {} topics, expected {num_topics}", block.len()));
            }
            if let Some(t) = block.iter().position(|row| row.len() != words) {
                return Err(format!("label block {l}, topic {t}: row width differs from vocabulary size {words}"));
            }
        }

        let vocabulary = artifact
            .vocabulary
            .into_iter()
            .enumerate()
            .map(|(i, w)| (w, i))
            .collect();

        Ok(Self {
            labels: artifact.labels,
            vocabulary,
            topic_word: artifact.topic_word,
            num_topics,
        })
    }
}

fn normalise(word: &str) -> String {
    word.to_lowercase()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

impl TopicExtractor for TopicFeature {
    fn topic_size(&self) -> usize {
        self.num_topics
    }

    fn height(&self) -> usize {
        self.labels.len()
    }

    fn extract(&self, text: &str) -> Vec<f32> {
        let height = self.labels.len();
        let mut matrix = vec![0.0f32; self.num_topics * height];

        let word_ids = text
            .split_whitespace()
            .filter_map(|w| self.vocabulary.get(&normalise(w)).copied());
        for id in word_ids {
            for (l, block) in self.topic_word.iter().enumerate() {
                for (t, row) in block.iter().enumerate() {
                    matrix[t * height + l] += row[id];
                }
            }
        }

        for l in 0..height {
            let total: f32 = (0..self.num_topics).map(|t| matrix[t * height + l]).sum();
            for t in 0..self.num_topics {
                let cell = &mut matrix[t * height + l];
                *cell = if total > 0.0 { *cell / total } else { 1.0 / self.num_topics as f32 };
            }
        }
        matrix
    }
}
