// ============================================================
// Layer 3 — Substitution Errors
// ============================================================
// Failures that belong to the problem itself rather than to
// disk or network: malformed sentence pairs, vocabularies that
// cannot be classified, hyperparameters that make the
// differentiable selection meaningless.
//
// The application layer converts these into anyhow::Error
// with `?`, so callers there only ever see anyhow::Result.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubstitutionError {
    // Sentence pair preconditions
    #[error("masked sentence contains no mask token (id {mask_id})")]
    MissingMask { mask_id: u32 },

    #[error("masked sentence contains {count} mask tokens, expected exactly one")]
    MultipleMasks { count: usize },

    #[error("sentence has {original} tokens but masked sentence has {masked}")]
    LengthMismatch { original: usize, masked: usize },

    #[error("sentences differ at position {position}, outside the masked position")]
    UnexpectedDifference { position: usize },

    #[error("sentence of {len} tokens exceeds the model limit of {max}")]
    SequenceTooLong { len: usize, max: usize },

    #[error("token id {id} is outside a vocabulary of {vocab_size} tokens")]
    UnknownTokenId { id: u32, vocab_size: usize },

    // Batching
    #[error("cannot build a batch from zero sentence pairs")]
    EmptyBatch,

    #[error("token id {0} does not fit an Int tensor element")]
    TokenIdOverflow(u32),

    #[error("batch mixes sequence lengths: expected {expected}, found {found}")]
    RaggedBatch { expected: usize, found: usize },

    // Vocabulary
    #[error("failed to decode token id {id}: {reason}")]
    Decode { id: u32, reason: String },

    #[error("vocabulary of {vocab_size} tokens contains no target-script token")]
    EmptyTargetVocabulary { vocab_size: usize },

    #[error(
        "vocabulary sizes disagree: tokenizer {tokenizer}, masked LM {mlm}, sentence encoder {encoder}"
    )]
    VocabularyMismatch {
        tokenizer: usize,
        mlm:       usize,
        encoder:   usize,
    },

    #[error("mask token '{0}' is not in the tokenizer vocabulary")]
    UnknownMaskToken(String),

    #[error("script pattern failed to compile: {0}")]
    Pattern(String),

    // Selection
    #[error("Gumbel-softmax temperature must be positive, got {0}")]
    InvalidTemperature(f64),
}

impl From<regex::Error> for SubstitutionError {
    fn from(value: regex::Error) -> Self {
        SubstitutionError::Pattern(value.to_string())
    }
}
