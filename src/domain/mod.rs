// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that describe what a training example IS,
// with no Burn tensors and no file I/O:
//
//   sentence_pair.rs — (original ids, masked ids) with exactly
//                      one reserved mask id, validated on build
//   traits.rs        — seams other layers implement (token
//                      vocabulary, sentence sources)
//   error.rs         — typed precondition and decode failures
//
// Everything in here can be unit tested without a backend.

/// Original / masked token sequences and mask-position lookup
pub mod sentence_pair;

/// Core abstractions (traits) that other layers implement
pub mod traits;

/// Typed errors for preconditions and vocabulary decoding
pub mod error;
