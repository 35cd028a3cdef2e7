// ============================================================
// Layer 4 — Pair Masker
// ============================================================
// Turns tokenised sentences into SentencePairs:
//
//   ids:       [<s>, ▁Мама, ▁мы, ла, ▁раму, ., </s>]
//   eligible:   no    yes    yes  yes  yes   no   no
//   pick one eligible position at random (seeded)
//   masked:    [<s>, ▁Мама, <mask>, ла, ▁раму, ., </s>]
//
// Only positions whose original token is itself in the target
// script are masked, so the model is always asked to replace a
// Russian token with a Russian token. Sentences with no eligible
// position, sentences longer than the model limit, and sentences
// that already contain the mask id are skipped.

use anyhow::Result;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::Vocabulary;

pub struct PairMasker {
    mask_id: u32,
    max_len: usize,
    rng:     StdRng,
}

impl PairMasker {
    pub fn new(mask_id: u32, max_len: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Self { mask_id, max_len, rng }
    }

    /// Mask one eligible position of `ids`. `eligible[id]` says
    /// whether token `id` may be masked.
    pub fn mask(&mut self, ids: Vec<u32>, eligible: &[bool]) -> Option<SentencePair> {
        if ids.len() > self.max_len {
            return None;
        }

        let positions: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|&(_, &id)| eligible.get(id as usize).copied().unwrap_or(false))
            .map(|(i, _)| i)
            .collect();

        let &position = positions.choose(&mut self.rng)?;
        SentencePair::mask_at(ids, position, self.mask_id).ok()
    }

    /// Tokenise and mask every sentence, dropping the ones that
    /// cannot be masked.
    pub fn build_pairs(
        &mut self,
        sentences:  &[String],
        vocabulary: &impl Vocabulary,
        eligible:   &[bool],
    ) -> Result<Vec<SentencePair>> {
        let mut pairs = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            let ids = vocabulary.encode_ids(sentence)?;
            match self.mask(ids, eligible) {
                Some(pair) => pairs.push(pair),
                None => tracing::debug!("Skipping unmaskable sentence: {sentence}"),
            }
        }

        tracing::info!(
            "Built {} sentence pairs ({} skipped)",
            pairs.len(),
            sentences.len() - pairs.len()
        );
        Ok(pairs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const MASK: u32 = 9;

    // ids 0..=3; 1 and 3 are eligible
    const ELIGIBLE: [bool; 4] = [false, true, false, true];

    #[test]
    fn test_masks_only_eligible_positions() {
        let mut masker = PairMasker::new(MASK, 16, Some(0));
        for _ in 0..20 {
            let pair = masker.mask(vec![0, 1, 2, 3, 0], &ELIGIBLE).unwrap();
            assert!(matches!(pair.mask_position(), 1 | 3));
            assert_eq!(pair.masked()[pair.mask_position()], MASK);
            assert_eq!(pair.original(), &[0, 1, 2, 3, 0]);
        }
    }

    #[test]
    fn test_skips_sentences_without_target_tokens() {
        let mut masker = PairMasker::new(MASK, 16, Some(0));
        assert!(masker.mask(vec![0, 2, 0], &ELIGIBLE).is_none());
        assert!(masker.mask(Vec::new(), &ELIGIBLE).is_none());
    }

    #[test]
    fn test_skips_overlong_and_premasked_sentences() {
        let mut masker = PairMasker::new(MASK, 3, Some(0));
        assert!(masker.mask(vec![1, 1, 1, 1], &ELIGIBLE).is_none());
        assert!(masker.mask(vec![1, MASK, 0], &ELIGIBLE).is_none());
    }

    #[test]
    fn test_same_seed_same_positions() {
        let ids = vec![1, 3, 1, 3, 1, 3, 1, 3];
        let run = |seed| {
            let mut masker = PairMasker::new(MASK, 16, Some(seed));
            (0..10)
                .map(|_| masker.mask(ids.clone(), &ELIGIBLE).unwrap().mask_position())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(4), run(4));
    }
}
