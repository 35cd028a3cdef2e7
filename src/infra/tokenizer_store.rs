// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the HuggingFace tokenizer that both models were trained
// with and adapts it to the `Vocabulary` seam.
//
// Decoding keeps special tokens: `<mask>` decodes to the literal
// string "<mask>", so the script filter sees it as non-Cyrillic
// and never lets the model propose it.
//
// The XLM-R tokenizer is a SentencePiece model; word-initial
// pieces decode without their "▁" marker, so "▁мир" is tested
// as "мир".

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::domain::error::SubstitutionError;
use crate::domain::traits::Vocabulary;

/// Default mask token of the XLM-R vocabulary.
pub const DEFAULT_MASK_TOKEN: &str = "<mask>";

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load tokenizer.json from disk
    pub fn load(&self) -> Result<Tokenizer> {
        let tokenizer = Tokenizer::from_file(&self.path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", self.path.display(), e
            ))?;
        tracing::info!(
            "Loaded tokenizer from '{}' ({} tokens)",
            self.path.display(),
            tokenizer.get_vocab_size(true)
        );
        Ok(tokenizer)
    }

    /// Load the tokenizer and resolve `mask_token` to its id.
    pub fn load_with_mask(&self, mask_token: &str) -> Result<(Tokenizer, u32)> {
        let tokenizer = self.load()?;
        let mask_id = mask_token_id(&tokenizer, mask_token)
            .with_context(|| format!("Tokenizer '{}'", self.path.display()))?;
        Ok((tokenizer, mask_id))
    }
}

pub fn mask_token_id(vocabulary: &impl Vocabulary, mask_token: &str) -> Result<u32, SubstitutionError> {
    vocabulary
        .id_of(mask_token)
        .ok_or_else(|| SubstitutionError::UnknownMaskToken(mask_token.to_string()))
}

impl Vocabulary for Tokenizer {
    fn vocab_len(&self) -> usize {
        self.get_vocab_size(true)
    }

    fn decode_id(&self, id: u32) -> Result<String, SubstitutionError> {
        self.decode(&[id], false)
            .map_err(|e| SubstitutionError::Decode { id, reason: e.to_string() })
    }

    fn encode_ids(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn id_of(&self, token: &str) -> Option<u32> {
        self.token_to_id(token)
    }
}
