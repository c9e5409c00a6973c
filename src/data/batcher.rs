// ============================================================
// Layer 4 - News Batcher
// ============================================================
// Implements Burn's Batcher trait to stack NewsItems into
// tensors on the device the DataLoader hands us.
//
// Sequences differ in length, so each batch is padded with
// zero vectors up to its longest member (capped at
// `max_length` when configured; longer sequences are cut):
//
//   item 0: t0 t1 t2           → t0 t1 t2 0
//   item 1: t0 t1 t2 t3        → t0 t1 t2 t3
//   item 2: t0                 → t0 0  0  0
//
// Output shapes:
//   sequences [batch, len, input_size]
//   topics    [batch, topic_size, height]
//   labels    [batch]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::NewsItem;

#[derive(Debug, Clone)]
pub struct NewsBatch<B: Backend> {
    pub sequences: Tensor<B, 3>,
    pub topics:    Tensor<B, 3>,
    pub labels:    Tensor<B, 1, Int>,
}

impl<B: Backend> NewsBatch<B> {
    /// Number of records in this batch
    pub fn len(&self) -> usize {
        self.labels.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct NewsBatcher {
    pub input_size: usize,
    pub topic_size: usize,
    pub height:     usize,
    pub max_length: Option<usize>,
}

impl NewsBatcher {
    pub fn new(input_size: usize, topic_size: usize, height: usize, max_length: Option<usize>) -> Self {
        Self { input_size, topic_size, height, max_length }
    }

    /// Common length for a batch: the longest sequence, at least one
    /// step, never beyond `max_length`.
    fn padded_len(&self, items: &[NewsItem]) -> usize {
        let longest = items.iter().map(|i| i.sequence.len()).max().unwrap_or(0).max(1);
        match self.max_length {
            Some(max) => longest.min(max.max(1)),
            None => longest,
        }
    }
}

impl<B: Backend> Batcher<B, NewsItem, NewsBatch<B>> for NewsBatcher {
    fn batch(&self, items: Vec<NewsItem>, device: &B::Device) -> NewsBatch<B> {
        let batch_size = items.len();
        let seq_len = self.padded_len(&items);

        let mut seq_flat: Vec<f32> = Vec::with_capacity(batch_size * seq_len * self.input_size);
        for item in &items {
            let kept = item.sequence.len().min(seq_len);
            for token in &item.sequence[..kept] {
                seq_flat.extend_from_slice(token);
            }
            seq_flat.resize(seq_flat.len() + (seq_len - kept) * self.input_size, 0.0);
        }

        let topic_flat: Vec<f32> = items.iter().flat_map(|i| i.topic.iter().copied()).collect();
        let labels: Vec<i32> = items.iter().map(|i| i.label as i32).collect();

        let sequences = Tensor::<B, 1>::from_floats(seq_flat.as_slice(), device)
            .reshape([batch_size, seq_len, self.input_size]);
        let topics = Tensor::<B, 1>::from_floats(topic_flat.as_slice(), device)
            .reshape([batch_size, self.topic_size, self.height]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), device);

        NewsBatch { sequences, topics, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn item(len: usize, label: usize) -> NewsItem {
        NewsItem {
            sequence: (0..len).map(|t| vec![t as f32 + 1.0, -(t as f32) - 1.0]).collect(),
            topic:    vec![0.25; 6],
            label,
        }
    }

    #[test]
    fn test_pads_to_longest() {
        let batcher = NewsBatcher::new(2, 3, 2, None);
        let batch: NewsBatch<TestBackend> = batcher.batch(vec![item(3, 1), item(1, 0)], &Default::default());

        assert_eq!(batch.sequences.dims(), [2, 3, 2]);
        assert_eq!(batch.topics.dims(), [2, 3, 2]);
        assert_eq!(batch.len(), 2);

        let values = batch.sequences.into_data().to_vec::<f32>().unwrap();
        // second record: one real token then two zero tokens
        assert_eq!(&values[6..12], &[1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_truncates_to_max_length() {
        let batcher = NewsBatcher::new(2, 3, 2, Some(2));
        let batch: NewsBatch<TestBackend> = batcher.batch(vec![item(5, 1), item(4, 0)], &Default::default());
        assert_eq!(batch.sequences.dims(), [2, 2, 2]);
    }

    #[test]
    fn test_empty_sequences_get_one_step() {
        let batcher = NewsBatcher::new(2, 3, 2, None);
        let batch: NewsBatch<TestBackend> = batcher.batch(vec![item(0, 0), item(0, 1)], &Default::default());
        assert_eq!(batch.sequences.dims(), [2, 1, 2]);
    }

    #[test]
    fn test_labels_preserved() {
        let batcher = NewsBatcher::new(2, 3, 2, None);
        let batch: NewsBatch<TestBackend> = batcher.batch(vec![item(1, 1), item(1, 0), item(2, 1)], &Default::default());
        let labels: Vec<i64> = batch.labels.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![1, 0, 1]);
    }
}
