// ============================================================
// Layer 4 — Sentence Pair Batcher
// ============================================================
// Converts a slice of SentencePairs into backend tensors.
//
//   Input:  N pairs, every sequence of length S
//   Output: SubstitutionBatch { original [N, S], masked [N, S],
//                               mask_positions: N indices }
//
// There is no padding: the encoder has no attention mask, so a
// batch must hold sequences of one length. PairDataset hands the
// DataLoader equal-length chunks; `try_batch()` still refuses
// ragged input instead of silently padding it.
//
// The Batcher output is a Result so a malformed chunk surfaces
// as a SubstitutionError in the training loop, not a panic in
// the loader.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::error::SubstitutionError;
use crate::domain::sentence_pair::SentencePair;

// ─── SubstitutionBatch ───────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct SubstitutionBatch<B: Backend> {
    /// Untouched sentences — shape: [batch_size, seq_len]
    pub original: Tensor<B, 2, Int>,

    /// Same sentences with one mask id each — shape: [batch_size, seq_len]
    pub masked: Tensor<B, 2, Int>,

    /// Index of the mask id in each row of `masked`
    pub mask_positions: Vec<usize>,
}

impl<B: Backend> SubstitutionBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.mask_positions.len()
    }

    pub fn seq_len(&self) -> usize {
        self.original.dims()[1]
    }
}

// ─── PairBatcher ──────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct PairBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> PairBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn try_batch(&self, pairs: &[SentencePair]) -> Result<SubstitutionBatch<B>, SubstitutionError> {
        let first = pairs.first().ok_or(SubstitutionError::EmptyBatch)?;
        let batch_size = pairs.len();
        let seq_len    = first.len();

        if let Some(ragged) = pairs.iter().find(|p| p.len() != seq_len) {
            return Err(SubstitutionError::RaggedBatch { expected: seq_len, found: ragged.len() });
        }

        // ── Flatten ids ───────────────────────────────────────────────────────
        let original_flat = flatten_ids(pairs.iter().map(SentencePair::original))?;
        let masked_flat   = flatten_ids(pairs.iter().map(SentencePair::masked))?;

        let original = Tensor::<B, 1, Int>::from_ints(
            original_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let masked = Tensor::<B, 1, Int>::from_ints(
            masked_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        Ok(SubstitutionBatch {
            original,
            masked,
            mask_positions: pairs.iter().map(SentencePair::mask_position).collect(),
        })
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// The DataLoader is built with batch_size 1 over PairDataset, so
// `items` normally holds one equal-length chunk.
impl<B: Backend> Batcher<Vec<SentencePair>, Result<SubstitutionBatch<B>, SubstitutionError>>
    for PairBatcher<B>
{
    fn batch(&self, items: Vec<Vec<SentencePair>>) -> Result<SubstitutionBatch<B>, SubstitutionError> {
        let pairs: Vec<SentencePair> = items.into_iter().flatten().collect();
        self.try_batch(&pairs)
    }
}

fn flatten_ids<'a>(rows: impl Iterator<Item = &'a [u32]>) -> Result<Vec<i32>, SubstitutionError> {
    rows.flatten()
        .map(|&id| i32::try_from(id).map_err(|_| SubstitutionError::TokenIdOverflow(id)))
        .collect()
}
