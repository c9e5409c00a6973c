// ============================================================
// Layer 4 - Drop-Last Batch Loader
// ============================================================
// Burn's DataLoader yields a trailing partial batch when the
// dataset size is not a multiple of the batch size. The loop
// driver keeps one hidden-state buffer sized to `batch_size`,
// so partial batches are discarded here and never reach it.
//
//   35 records, batch_size 32 → 1 batch (3 records dropped)

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::{
    batcher::{NewsBatch, NewsBatcher},
    dataset::SequenceDataset,
};

pub struct BatchLoader<B: Backend> {
    inner:      Arc<dyn DataLoader<B, NewsBatch<B>>>,
    batch_size: usize,
    num_items:  usize,
}

impl<B: Backend> BatchLoader<B> {
    /// `shuffle`: reshuffle every pass with this seed (training);
    /// `None` keeps dataset order (evaluation). Batches are built
    /// directly on `device`.
    pub fn new(
        batcher:    NewsBatcher,
        dataset:    SequenceDataset,
        batch_size: usize,
        shuffle:    Option<u64>,
        device:     &B::Device,
    ) -> Self {
        use burn::data::dataset::Dataset;

        let num_items = dataset.len();
        let mut builder = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .num_workers(1)
            .set_device(device.clone());
        if let Some(seed) = shuffle {
            builder = builder.shuffle(seed);
        }
        Self {
            inner: builder.build(dataset),
            batch_size,
            num_items,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of records in the underlying dataset (including any that
    /// drop-last will discard)
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Number of full batches one pass yields
    pub fn num_batches(&self) -> usize {
        self.num_items / self.batch_size
    }

    /// One pass over the dataset, full batches only
    pub fn iter(&self) -> impl Iterator<Item = NewsBatch<B>> + '_ {
        let batch_size = self.batch_size;
        self.inner.iter().filter(move |batch| batch.len() == batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::dataset::tests::{records, FixedTopics};

    type TestBackend = NdArray<f32>;

    fn loader(n: usize, batch_size: usize, shuffle: Option<u64>) -> BatchLoader<TestBackend> {
        let topics = FixedTopics { topic_size: 3, height: 2 };
        let dataset = SequenceDataset::new(records(n, 2), &topics, 2, 3, 2).unwrap();
        let batcher = NewsBatcher::new(2, 3, 2, None);
        BatchLoader::new(batcher, dataset, batch_size, shuffle, &Default::default())
    }

    #[test]
    fn test_drop_last_discards_partial_batch() {
        let loader = loader(35, 32, Some(7));
        let batches: Vec<_> = loader.iter().collect();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 32);
        assert_eq!(loader.num_batches(), 1);
    }

    #[test]
    fn test_exact_multiple_keeps_every_batch() {
        let loader = loader(12, 4, None);
        assert_eq!(loader.iter().count(), 3);
        assert!(loader.iter().all(|b| b.len() == 4));
    }

    #[test]
    fn test_smaller_than_one_batch_yields_nothing() {
        let loader = loader(5, 8, None);
        assert_eq!(loader.iter().count(), 0);
        assert_eq!(loader.num_items(), 5);
    }
}
