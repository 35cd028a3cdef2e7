// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here.
//
// What's in this layer:
//
//   encoder.rs          — Transformer encoder backbone shared by both
//                         models (token + position embeddings, post-norm
//                         self-attention blocks, GELU feed-forward)
//
//   masked_lm.rs        — The trainable masked LM: backbone + LM head
//
//   sentence_encoder.rs — The frozen sentence-embedding model:
//                         backbone + CLS or mean pooling
//
//   vocab_filter.rs     — Which vocabulary ids are Cyrillic
//
//   restriction.rs      — Zeroing the decoder outside the target
//                         script, and masking its gradients
//
//   gumbel.rs           — Hard Gumbel-softmax token selection
//
//   comparator.rs       — Embedding substitution and the cosine loss
//
//   substituter.rs      — The composed forward pass
//
//   trainer.rs          — The training loop
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Conneau et al. (2020) XLM-R
//            Jang et al. (2017) Gumbel-Softmax

/// Transformer encoder backbone
pub mod encoder;

/// Masked language model with prediction head
pub mod masked_lm;

/// Frozen sentence embedding model
pub mod sentence_encoder;

/// Cyrillic vocabulary mask
pub mod vocab_filter;

/// Forward and gradient restriction of the prediction head
pub mod restriction;

/// Differentiable hard token selection
pub mod gumbel;

/// Sentence-embedding comparison loss
pub mod comparator;

/// Coupled MLM → selection → encoder → loss
pub mod substituter;

/// Adam training loop
pub mod trainer;

#[cfg(test)]
pub mod testing;
