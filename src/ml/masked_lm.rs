// ============================================================
// Layer 5 — Masked Language Model
// ============================================================
// Encoder backbone + RoBERTa-style prediction head:
//
//   hidden [B, S, H] ─► dense ─► GELU ─► LayerNorm ─► decoder ─► logits [B, S, V]
//
// This is the ONLY trainable model in the system. The decoder is
// the projection the vocabulary restriction acts on; in Burn's
// Linear layout its weight is [H, V], so "output row i" of the
// V×H view is column i here.

use burn::{
    nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::encoder::{TextEncoder, TextEncoderConfig};
use crate::ml::restriction::restrict_head;
use crate::ml::vocab_filter::VocabularyMask;

#[derive(Config, Debug)]
pub struct MaskedLmConfig {
    pub encoder: TextEncoderConfig,
}

impl MaskedLmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MaskedLm<B> {
        let d_model = self.encoder.d_model;
        MaskedLm {
            encoder: self.encoder.init(device),
            head: LmHead {
                dense:   LinearConfig::new(d_model, d_model).init(device),
                norm:    LayerNormConfig::new(d_model)
                    .with_epsilon(self.encoder.layer_norm_eps)
                    .init(device),
                decoder: LinearConfig::new(d_model, self.encoder.vocab_size).init(device),
            },
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab_size
    }
}

#[derive(Module, Debug)]
pub struct LmHead<B: Backend> {
    pub dense:   Linear<B>,
    pub norm:    LayerNorm<B>,
    pub decoder: Linear<B>,
}

impl<B: Backend> LmHead<B> {
    pub fn forward(&self, hidden: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = burn::tensor::activation::gelu(self.dense.forward(hidden));
        self.decoder.forward(self.norm.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct MaskedLm<B: Backend> {
    pub encoder: TextEncoder<B>,
    pub head:    LmHead<B>,
}

impl<B: Backend> MaskedLm<B> {
    /// input_ids: [batch, seq_len] → logits [batch, seq_len, vocab_size]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.head.forward(self.encoder.forward(input_ids))
    }

    /// The output projection the vocabulary restriction applies to.
    pub fn decoder(&self) -> &Linear<B> {
        &self.head.decoder
    }

    /// Same model with every non-target column of the decoder zeroed.
    pub fn restricted(mut self, mask: &VocabularyMask) -> Self {
        self.head.decoder = restrict_head(self.head.decoder, mask);
        self
    }

    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab_size()
    }

    pub fn max_seq_len(&self) -> usize {
        self.encoder.max_seq_len
    }
}
