// ============================================================
// Layer 4 - JSON-Lines Record Loader
// ============================================================
// Reads one JSON object per line. The three fields we need
// are looked up under configurable key names:
//
//   {"sequence": [[0.1, 0.2], [0.3, 0.4]], "text": "...", "label": 1}
//
// Accepted shapes:
//   sequence: array of arrays of numbers (one row per token),
//             or a flat array of numbers (one scalar per token)
//   label:    0 / 1 or false / true
//
// Blank lines are skipped. Anything else malformed is a hard
// error naming the line, so a bad record never silently drops
// out of the training set.

use std::{fs, path::PathBuf};

use serde_json::Value;

use crate::domain::error::{DetectError, DetectResult};
use crate::domain::record::{Label, NewsRecord};
use crate::domain::traits::RecordSource;
use crate::infra::config::DataConfig;

/// Loads labelled records from a JSON-lines file.
pub struct JsonLinesLoader {
    path: PathBuf,
    keys: DataConfig,
}

impl JsonLinesLoader {
    pub fn new(path: impl Into<PathBuf>, keys: DataConfig) -> Self {
        Self { path: path.into(), keys }
    }

    /// Parse every non-blank line of `content`
    pub fn parse(&self, content: &str) -> DetectResult<Vec<NewsRecord>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| self.parse_line(line).map_err(|reason| self.data_error(i + 1, reason)))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Result<NewsRecord, String> {
        let value: Value = serde_json::from_str(line).map_err(|e| format!("invalid JSON: {e}"))?;
        let obj = value.as_object().ok_or("expected a JSON object")?;

        let field = |key: &str| obj.get(key).ok_or_else(|| format!("missing field '{key}'"));

        let sequence = parse_sequence(field(self.keys.sequence_key.as_str())?)
            .map_err(|e| format!("field '{}': {e}", self.keys.sequence_key))?;

        let text = field(self.keys.text_key.as_str())?
            .as_str()
            .ok_or_else(|| format!("field '{}' must be a string", self.keys.text_key))?;

        let label = parse_label(field(self.keys.label_key.as_str())?)
            .ok_or_else(|| format!("field '{}' must be 0, 1, false or true", self.keys.label_key))?;

        Ok(NewsRecord::new(sequence, text, label))
    }

    fn data_error(&self, line: usize, reason: String) -> DetectError {
        DetectError::Data {
            source_name: self.path.display().to_string(),
            line,
            reason,
        }
    }
}

impl RecordSource for JsonLinesLoader {
    fn load_all(&self) -> DetectResult<Vec<NewsRecord>> {
        if !self.path.exists() {
            return Err(DetectError::NotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path).map_err(|e| DetectError::io(&self.path, e))?;
        let records = self.parse(&content)?;
        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

fn parse_sequence(value: &Value) -> Result<Vec<Vec<f32>>, String> {
    let tokens = value.as_array().ok_or("expected an array")?;
    tokens
        .iter()
        .map(|token| match token {
            Value::Number(n) => n.as_f64().map(|v| vec![v as f32]).ok_or_else(|| "bad number".to_string()),
            Value::Array(row) => row
                .iter()
                .map(|x| x.as_f64().map(|v| v as f32).ok_or_else(|| "non-numeric embedding value".to_string()))
                .collect(),
            _ => Err("tokens must be numbers or arrays of numbers".to_string()),
        })
        .collect()
}

fn parse_label(value: &Value) -> Option<Label> {
    match value {
        Value::Bool(b) => Some(if *b { Label::True } else { Label::False }),
        Value::Number(n) => n.as_i64().and_then(Label::from_index),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> JsonLinesLoader {
        JsonLinesLoader::new("records.jsonl", DataConfig::default())
    }

    #[test]
    fn test_parses_embedding_rows() {
        let recs = loader()
            .parse(r#"{"sequence": [[0.5, 1.0], [2.0, -1.0]], "text": "hello", "label": 1}"#)
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].sequence, vec![vec![0.5, 1.0], vec![2.0, -1.0]]);
        assert_eq!(recs[0].text, "hello");
        assert_eq!(recs[0].label, Label::True);
    }

    #[test]
    fn test_scalar_tokens_and_bool_label() {
        let recs = loader()
            .parse(r#"{"sequence": [3, 7, 1], "text": "x", "label": false}"#)
            .unwrap();
        assert_eq!(recs[0].sequence, vec![vec![3.0], vec![7.0], vec![1.0]]);
        assert_eq!(recs[0].label, Label::False);
    }

    #[test]
    fn test_skips_blank_lines() {
        let input = "\n{\"sequence\": [], \"text\": \"a\", \"label\": 0}\n   \n";
        assert_eq!(loader().parse(input).unwrap().len(), 1);
    }

    #[test]
    fn test_custom_keys() {
        let keys = DataConfig {
            sequence_key: "emb".into(),
            text_key: "tweet".into(),
            label_key: "is_true".into(),
            ..DataConfig::default()
        };
        let recs = JsonLinesLoader::new("r.jsonl", keys)
            .parse(r#"{"emb": [[1.0]], "tweet": "t", "is_true": 1}"#)
            .unwrap();
        assert_eq!(recs[0].text, "t");
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let input = "{\"sequence\": [], \"text\": \"a\", \"label\": 0}\n{\"sequence\": [], \"text\": \"b\", \"label\": 2}";
        match loader().parse(input).unwrap_err() {
            DetectError::Data { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("label"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_field() {
        let err = loader().parse(r#"{"sequence": [], "label": 0}"#).unwrap_err();
        assert!(err.to_string().contains("missing field 'text'"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let l = JsonLinesLoader::new("/definitely/not/here.jsonl", DataConfig::default());
        assert!(matches!(l.load_all(), Err(DetectError::NotFound(_))));
    }
}
