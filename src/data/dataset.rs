use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DetectError, DetectResult};
use crate::domain::record::NewsRecord;
use crate::domain::traits::TopicExtractor;

/// One (sequence, topic matrix, label) triple ready for batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// [len][input_size], not yet padded
    pub sequence: Vec<Vec<f32>>,
    /// Row-major [topic_size][height]
    pub topic:    Vec<f32>,
    pub label:    usize,
}

/// Records paired with their topic matrices.
///
/// Topic extraction runs once per record at construction; every
/// shape is checked then, so batching never sees a malformed item.
#[derive(Debug)]
pub struct SequenceDataset {
    items: Vec<NewsItem>,
}

impl SequenceDataset {
    pub fn new<T: TopicExtractor>(
        records:    Vec<NewsRecord>,
        topics:     &T,
        input_size: usize,
        topic_size: usize,
        height:     usize,
    ) -> DetectResult<Self> {
        if topics.topic_size() != topic_size || topics.height() != height {
            return Err(DetectError::shape(
                "topic feature",
                &[topic_size, height],
                &[topics.topic_size(), topics.height()],
            ));
        }

        let items = records
            .into_iter()
            .map(|record| {
                if let Some(token) = record.sequence.iter().find(|t| t.len() != input_size) {
                    return Err(DetectError::shape("token embedding", &[input_size], &[token.len()]));
                }
                let topic = topics.extract(&record.text);
                if topic.len() != topic_size * height {
                    return Err(DetectError::shape("topic vector", &[topic_size * height], &[topic.len()]));
                }
                Ok(NewsItem {
                    label: record.label.index(),
                    sequence: record.sequence,
                    topic,
                })
            })
            .collect::<DetectResult<Vec<_>>>()?;

        tracing::debug!("Built dataset of {} items", items.len());
        Ok(Self { items })
    }

    /// Records per label index, [false, true]
    pub fn label_counts(&self) -> [usize; 2] {
        self.items.iter().fold([0, 0], |mut acc, item| {
            acc[item.label.min(1)] += 1;
            acc
        })
    }
}

impl Dataset<NewsItem> for SequenceDataset {
    fn get(&self, index: usize) -> Option<NewsItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
