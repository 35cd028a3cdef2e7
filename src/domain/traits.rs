// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The vocabulary filter and the pair builder only need to turn
// ids into text and text into ids. Hiding the HuggingFace
// tokenizer behind `Vocabulary` lets the ml and data layers be
// tested against a three-token vocabulary built in memory.
//
// Method names deliberately avoid `encode`/`decode`: those are
// inherent methods on tokenizers::Tokenizer and would shadow
// the trait methods at call sites.

use anyhow::Result;

use crate::domain::error::SubstitutionError;

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// A fixed, ordered token vocabulary of `vocab_len()` ids.
///
/// Implementations:
///   - tokenizers::Tokenizer → see infra::tokenizer_store
///   - test vocabularies built from a list of strings
pub trait Vocabulary {
    /// Number of ids, including added/special tokens.
    fn vocab_len(&self) -> usize;

    /// Decode a single id to its surface string, special tokens kept.
    fn decode_id(&self, id: u32) -> Result<String, SubstitutionError>;

    /// Tokenise a sentence, adding the model's special tokens.
    fn encode_ids(&self, text: &str) -> Result<Vec<u32>>;

    /// Look up the id of an exact token string.
    fn id_of(&self, token: &str) -> Option<u32>;
}

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Any component that can supply raw training sentences.
pub trait SentenceSource {
    fn load_all(&self) -> Result<Vec<String>>;
}
