// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The dataset is written against these traits rather than the
// concrete JSON-lines loader and topic artifact, so tests can
// feed synthetic records and a fixed topic matrix.

use crate::domain::error::DetectResult;
use crate::domain::record::NewsRecord;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the full list of labelled records.
///
/// Implementations:
///   - JsonLinesLoader → one JSON object per line
pub trait RecordSource {
    fn load_all(&self) -> DetectResult<Vec<NewsRecord>>;
}

// ─── TopicExtractor ───────────────────────────────────────────────────────────
/// A frozen, pretrained mapping from raw text to a topic matrix.
///
/// The output of `extract` is row-major with shape
/// `[topic_size, height]`, i.e. `topic_size * height` values.
pub trait TopicExtractor {
    fn topic_size(&self) -> usize;

    fn height(&self) -> usize;

    fn extract(&self, text: &str) -> Vec<f32>;
}
