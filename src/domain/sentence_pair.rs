// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One training example for the substitution objective:
//
//   original: [<s>, при, вет, ▁мир, </s>]
//   masked:   [<s>, при, <mask>, ▁мир, </s>]
//
// Both sequences have the same length and differ only at the
// single position holding the reserved mask id. The MLM fills
// that position, the sentence encoder compares the result with
// the original.

use serde::{Deserialize, Serialize};

use crate::domain::error::SubstitutionError;

/// A validated (original, masked) token-id pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    original:      Vec<u32>,
    masked:        Vec<u32>,
    mask_position: usize,
}

impl SentencePair {
    /// Build a pair, checking equal length, exactly one mask id in
    /// `masked`, and no differences outside the masked position.
    pub fn new(
        original: Vec<u32>,
        masked:   Vec<u32>,
        mask_id:  u32,
    ) -> Result<Self, SubstitutionError> {
        if original.len() != masked.len() {
            return Err(SubstitutionError::LengthMismatch {
                original: original.len(),
                masked:   masked.len(),
            });
        }

        let mask_position = locate_mask_position(&masked, mask_id)?;

        if let Some(position) = original
            .iter()
            .zip(&masked)
            .enumerate()
            .position(|(i, (o, m))| i != mask_position && o != m)
        {
            return Err(SubstitutionError::UnexpectedDifference { position });
        }

        Ok(Self { original, masked, mask_position })
    }

    /// Mask `position` of `original` with `mask_id`.
    pub fn mask_at(
        original: Vec<u32>,
        position: usize,
        mask_id:  u32,
    ) -> Result<Self, SubstitutionError> {
        let mut masked = original.clone();
        match masked.get_mut(position) {
            Some(slot) => *slot = mask_id,
            None => {
                return Err(SubstitutionError::MissingMask { mask_id });
            }
        }
        Self::new(original, masked, mask_id)
    }

    pub fn original(&self) -> &[u32] {
        &self.original
    }

    pub fn masked(&self) -> &[u32] {
        &self.masked
    }

    pub fn mask_position(&self) -> usize {
        self.mask_position
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Find the single position of `mask_id` in `ids`.
pub fn locate_mask_position(ids: &[u32], mask_id: u32) -> Result<usize, SubstitutionError> {
    let mut found = ids
        .iter()
        .enumerate()
        .filter(|&(_, &id)| id == mask_id)
        .map(|(i, _)| i);

    match (found.next(), found.count()) {
        (None, _)        => Err(SubstitutionError::MissingMask { mask_id }),
        (Some(i), 0)     => Ok(i),
        (Some(_), extra) => Err(SubstitutionError::MultipleMasks { count: extra + 1 }),
    }
}
