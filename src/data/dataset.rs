// ============================================================
// Layer 4 — Length-Bucketed Pair Dataset
// ============================================================
// The encoder has no attention mask, so sentences of different
// lengths cannot share a batch. Instead of padding, pairs are
// bucketed by length and each bucket is cut into chunks of at
// most `batch_size`. One chunk is one dataset item, and the
// DataLoader is built with `.batch_size(1)` so a loader batch is
// exactly one equal-length chunk.
//
//   pairs ─► group_by_length ─► [chunk, chunk, ...] ─► Dataset
//
// Shuffling then happens across chunks inside burn's loader.

use std::collections::BTreeMap;

use burn::data::dataset::Dataset;

use crate::domain::sentence_pair::SentencePair;

/// Bucket pairs by sequence length, then cut each bucket into
/// chunks of at most `batch_size`. Order inside a bucket is kept.
pub fn group_by_length(pairs: Vec<SentencePair>, batch_size: usize) -> Vec<Vec<SentencePair>> {
    let batch_size = batch_size.max(1);
    let mut buckets: BTreeMap<usize, Vec<SentencePair>> = BTreeMap::new();
    for pair in pairs {
        buckets.entry(pair.len()).or_default().push(pair);
    }

    buckets
        .into_values()
        .flat_map(|bucket| {
            bucket
                .chunks(batch_size)
                .map(|chunk| chunk.to_vec())
                .collect::<Vec<_>>()
        })
        .collect()
}

pub struct PairDataset {
    chunks: Vec<Vec<SentencePair>>,
}

impl PairDataset {
    pub fn new(pairs: Vec<SentencePair>, batch_size: usize) -> Self {
        Self { chunks: group_by_length(pairs, batch_size) }
    }

    /// Total sentence pairs across every chunk.
    pub fn pair_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

impl Dataset<Vec<SentencePair>> for PairDataset {
    fn get(&self, index: usize) -> Option<Vec<SentencePair>> {
        self.chunks.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const MASK: u32 = 9;

    fn pair(ids: &[u32], position: usize) -> SentencePair {
        SentencePair::mask_at(ids.to_vec(), position, MASK).unwrap()
    }

    fn mixed_pairs() -> Vec<SentencePair> {
        vec![
            pair(&[1, 2, 3], 0),
            pair(&[1, 2], 0),
            pair(&[4, 5, 6], 1),
            pair(&[7, 8, 9], 2),
        ]
    }

    #[test]
    fn test_grouping_by_length() {
        let groups = group_by_length(mixed_pairs(), 2);

        let sizes: Vec<(usize, usize)> = groups.iter().map(|g| (g[0].len(), g.len())).collect();
        assert_eq!(sizes, vec![(2, 1), (3, 2), (3, 1)]);
    }

    #[test]
    fn test_dataset_items_are_equal_length_chunks() {
        let dataset = PairDataset::new(mixed_pairs(), 2);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.pair_count(), 4);
        for index in 0..dataset.len() {
            let chunk = dataset.get(index).unwrap();
            assert!(chunk.iter().all(|p| p.len() == chunk[0].len()));
        }
        assert!(dataset.get(3).is_none());
    }
}
