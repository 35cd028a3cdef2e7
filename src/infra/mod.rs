// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Disk-facing concerns shared by the use cases:
//
//   checkpoint.rs      — Model configs and weights
//                        Loads {name}, saves {name}_, full
//                        precision burn records plus burn
//                        Config JSON for both models.
//
//   tokenizer_store.rs — The HuggingFace tokenizer
//                        Loads tokenizer.json, resolves the mask
//                        token, implements `Vocabulary`.
//
//   metrics.rs         — Training metrics logging
//                        One CSV row per epoch.

/// Model config and checkpoint loading / saving
pub mod checkpoint;

/// Tokenizer loading and the Vocabulary impl
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
