// Shared fixtures for the ml unit tests: a CPU autodiff backend,
// tiny model configs and an in-memory vocabulary.

use anyhow::Result;
use burn::backend::{Autodiff, NdArray};

use crate::domain::error::SubstitutionError;
use crate::domain::traits::Vocabulary;
use crate::ml::encoder::TextEncoderConfig;
use crate::ml::gumbel::GumbelConfig;
use crate::ml::masked_lm::MaskedLmConfig;
use crate::ml::sentence_encoder::{Pooling, SentenceEncoderConfig};
use crate::ml::substituter::LexicalSubstituter;
use crate::ml::vocab_filter::VocabularyMask;

pub type TestBackend = Autodiff<NdArray>;

/// d_model 8, 2 heads, 1 layer, no dropout.
pub fn tiny_encoder_config(vocab_size: usize) -> TextEncoderConfig {
    TextEncoderConfig::new(vocab_size, 8, 8, 2, 1, 16).with_dropout(0.0)
}

pub fn tiny_mlm_config(vocab_size: usize) -> MaskedLmConfig {
    MaskedLmConfig::new(tiny_encoder_config(vocab_size))
}

pub fn tiny_sentence_config(vocab_size: usize) -> SentenceEncoderConfig {
    SentenceEncoderConfig::new(tiny_encoder_config(vocab_size)).with_pooling(Pooling::Cls)
}

/// A vocabulary given as a list of surface strings, id = index.
pub struct ListVocabulary {
    pub tokens: Vec<String>,
}

impl ListVocabulary {
    pub fn new(tokens: &[&str]) -> Self {
        Self { tokens: tokens.iter().map(|t| t.to_string()).collect() }
    }

    /// The {"a", "б", "<mask>"} vocabulary used across tests.
    pub fn scenario() -> Self {
        Self::new(&["a", "б", "<mask>"])
    }
}

impl Vocabulary for ListVocabulary {
    fn vocab_len(&self) -> usize {
        self.tokens.len()
    }

    fn decode_id(&self, id: u32) -> Result<String, SubstitutionError> {
        self.tokens
            .get(id as usize)
            .cloned()
            .ok_or_else(|| SubstitutionError::Decode { id, reason: "out of range".into() })
    }

    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        text.split_whitespace()
            .map(|w| {
                self.id_of(w).ok_or_else(|| anyhow::anyhow!("unknown token '{w}'"))
            })
            .collect()
    }

    fn id_of(&self, token: &str) -> Option<u32> {
        self.tokens.iter().position(|t| t == token).map(|i| i as u32)
    }
}

/// Substituter over `vocabulary` with tiny models and a seeded sampler.
pub fn tiny_substituter(vocabulary: &ListVocabulary, seed: u64) -> LexicalSubstituter<TestBackend> {
    let device  = Default::default();
    let mask    = VocabularyMask::build(vocabulary).unwrap();
    let mask_id = vocabulary.id_of("<mask>").unwrap();
    let vocab_size = vocabulary.vocab_len();
    let sampler = GumbelConfig::new().with_seed(Some(seed)).init().unwrap();

    LexicalSubstituter::new(
        &tiny_mlm_config(vocab_size),
        &tiny_sentence_config(vocab_size),
        mask,
        mask_id,
        sampler,
        &device,
    )
    .unwrap()
}

/// Write a word-level tokenizer.json where id = index in `tokens`
/// and `mask` is a special added token. Returns its path.
pub fn write_word_level_tokenizer(dir: &std::path::Path, tokens: &[&str], mask: &str) -> std::path::PathBuf {
    let vocab: serde_json::Map<String, serde_json::Value> = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), serde_json::json!(i)))
        .collect();
    let mask_id = tokens.iter().position(|t| *t == mask).unwrap();

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": mask_id, "content": mask, "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": mask
        }
    });
    let path = dir.join("tokenizer.json");
    std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}
