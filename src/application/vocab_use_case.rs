// ============================================================
// Layer 2 — VocabUseCase
// ============================================================
// Reports which part of a tokenizer's vocabulary the model is
// allowed to propose: size, Cyrillic count, and a sample.

use anyhow::Result;

use crate::domain::traits::Vocabulary;
use crate::infra::tokenizer_store::{TokenizerStore, DEFAULT_MASK_TOKEN};
use crate::ml::vocab_filter::VocabularyMask;

#[derive(Debug, Clone, PartialEq)]
pub struct VocabReport {
    pub vocab_size: usize,
    pub allowed:    usize,
    pub mask_id:    u32,
    /// Decoded form of the first allowed tokens
    pub sample:     Vec<String>,
}

impl VocabReport {
    pub fn allowed_fraction(&self) -> f64 {
        self.allowed as f64 / self.vocab_size as f64
    }
}

pub struct VocabUseCase {
    tokenizer:  String,
    mask_token: String,
}

impl VocabUseCase {
    pub fn new(tokenizer: impl Into<String>) -> Self {
        Self { tokenizer: tokenizer.into(), mask_token: DEFAULT_MASK_TOKEN.to_string() }
    }

    pub fn with_mask_token(mut self, mask_token: impl Into<String>) -> Self {
        self.mask_token = mask_token.into();
        self
    }

    pub fn report(&self, sample_size: usize) -> Result<VocabReport> {
        let (tokenizer, mask_id) = TokenizerStore::new(&self.tokenizer)
            .load_with_mask(&self.mask_token)?;
        build_report(&tokenizer, mask_id, sample_size)
    }
}

fn build_report(vocabulary: &impl Vocabulary, mask_id: u32, sample_size: usize) -> Result<VocabReport> {
    let mask = VocabularyMask::build(vocabulary)?;
    let sample = mask
        .allowed_ids()
        .take(sample_size)
        .map(|id| vocabulary.decode_id(id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VocabReport {
        vocab_size: mask.len(),
        allowed:    mask.allowed_count(),
        mask_id,
        sample,
    })
}
