// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure the data, ML and infra layers can produce.
// The application and CLI layers wrap these in anyhow with
// extra context; `main` downcasts to pick the exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// Invalid combination of command-line options
    #[error("usage error: {0}")]
    Usage(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tensor or record dimensions disagree with the model configuration
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    Shape {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// Checkpoint cannot be decoded or does not fit the current model
    #[error("incompatible checkpoint '{}': {reason}", .path.display())]
    Format { path: PathBuf, reason: String },

    /// Malformed input record or artifact
    #[error("{source_name}:{line}: {reason}")]
    Data {
        source_name: String,
        line: usize,
        reason: String,
    },

    /// An accuracy ratio over an empty bucket
    #[error("no records labelled {bucket} in the evaluation set, accuracy is undefined")]
    DivisionByZero { bucket: &'static str },
}

impl DetectError {
    pub fn shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        DetectError::Shape {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DetectError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DetectError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type DetectResult<T> = Result<T, DetectError>;
