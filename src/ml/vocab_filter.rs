// ============================================================
// Layer 5 — Vocabulary Filter
// ============================================================
// Decides, once per tokenizer, which token ids the masked LM is
// allowed to propose: exactly those whose decoded text contains
// at least one character of the Cyrillic script.
//
//   id 0   "<s>"      → false
//   id 9   "при"      → true   (decoded; the "▁" marker is gone)
//   id 14  "!"        → false
//   id 31  "ѣ"        → true   (historic letter, still Cyrillic)
//
// The test is the Unicode script property \p{Cyrillic}, not a
// codepoint range, so combining marks (U+0483..U+0489) and the
// Extended-A/B/C blocks are classified correctly.
//
// A decode failure aborts construction: a mask with holes in it
// would silently let non-target tokens into training.

use burn::prelude::*;
use regex::Regex;

use crate::domain::error::SubstitutionError;
use crate::domain::traits::Vocabulary;

/// Script-aware "contains a Cyrillic character" test.
pub struct CyrillicClassifier {
    pattern: Regex,
}

impl CyrillicClassifier {
    pub fn new() -> Result<Self, SubstitutionError> {
        Ok(Self { pattern: Regex::new(r"\p{Cyrillic}")? })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Boolean mask over the whole vocabulary; `true` = target-script token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyMask {
    allowed: Vec<bool>,
}

impl VocabularyMask {
    /// Decode every id of `vocabulary` and classify it.
    pub fn build(vocabulary: &impl Vocabulary) -> Result<Self, SubstitutionError> {
        let classifier = CyrillicClassifier::new()?;
        let vocab_size = vocabulary.vocab_len();

        let allowed = (0..vocab_size as u32)
            .map(|id| vocabulary.decode_id(id).map(|text| classifier.matches(&text)))
            .collect::<Result<Vec<bool>, _>>()?;

        let mask = Self::from_flags(allowed)?;
        tracing::info!(
            "Vocabulary mask: {} of {} tokens are Cyrillic",
            mask.allowed_count(),
            mask.len()
        );
        Ok(mask)
    }

    /// Wrap precomputed flags. At least one flag must be set.
    pub fn from_flags(allowed: Vec<bool>) -> Result<Self, SubstitutionError> {
        if !allowed.iter().any(|&a| a) {
            return Err(SubstitutionError::EmptyTargetVocabulary { vocab_size: allowed.len() });
        }
        Ok(Self { allowed })
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn is_allowed(&self, id: u32) -> bool {
        self.allowed.get(id as usize).copied().unwrap_or(false)
    }

    pub fn allowed_count(&self) -> usize {
        self.allowed.iter().filter(|&&a| a).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.allowed
    }

    /// Ids of the allowed tokens, ascending.
    pub fn allowed_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.allowed
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a)
            .map(|(i, _)| i as u32)
    }

    /// 1.0 for allowed ids, 0.0 otherwise. Shape [vocab_size].
    pub fn to_float_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        let flags: Vec<f32> = self.allowed.iter().map(|&a| if a { 1.0 } else { 0.0 }).collect();
        Tensor::<B, 1>::from_floats(flags.as_slice(), device)
    }

    /// `true` for ids that must never be proposed. Shape [vocab_size].
    pub fn blocked_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1, Bool> {
        self.to_float_tensor::<B>(device).equal_elem(0.0)
    }
}
