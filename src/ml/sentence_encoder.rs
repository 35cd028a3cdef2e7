// ============================================================
// Layer 5 — Sentence Encoder (frozen)
// ============================================================
// Encoder backbone + pooling to one vector per sentence:
//
//   Pooling::Cls  — tanh(dense(h[:, 0]))   (the RoBERTa pooler output)
//   Pooling::Mean — mean over token states
//
// The sentence encoder is a judge, never a student. It is only
// ever held through `FrozenEncoder`, whose constructor turns off
// gradient tracking for every parameter and builds the module with
// dropout disabled, so there is no runtime flag to flip back.
// Gradients still flow THROUGH it into whatever produced its input
// embeddings; they just never accumulate on its own weights.

use burn::{
    module::Ignored,
    nn::{Linear, LinearConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::ml::encoder::{TextEncoder, TextEncoderConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pooling {
    Cls,
    Mean,
}

#[derive(Config, Debug)]
pub struct SentenceEncoderConfig {
    pub encoder: TextEncoderConfig,
    #[config(default = "Pooling::Cls")]
    pub pooling: Pooling,
}

impl SentenceEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SentenceEncoder<B> {
        let d_model = self.encoder.d_model;
        SentenceEncoder {
            encoder: self.encoder.init(device),
            pooler:  LinearConfig::new(d_model, d_model).init(device),
            pooling: Ignored(self.pooling),
        }
    }

    /// Inference-mode build: identical architecture, dropout off.
    pub fn init_frozen<B: Backend>(&self, device: &B::Device) -> FrozenEncoder<B> {
        let config = SentenceEncoderConfig {
            encoder: self.encoder.clone().with_dropout(0.0),
            pooling: self.pooling,
        };
        FrozenEncoder::new(config.init(device))
    }

    pub fn vocab_size(&self) -> usize {
        self.encoder.vocab_size
    }
}

#[derive(Module, Debug)]
pub struct SentenceEncoder<B: Backend> {
    pub encoder: TextEncoder<B>,
    pub pooler:  Linear<B>,
    pub pooling: Ignored<Pooling>,
}

impl<B: Backend> SentenceEncoder<B> {
    /// input_ids: [batch, seq_len] → pooled [batch, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        self.pool(self.encoder.forward(input_ids))
    }

    /// tok_emb: [batch, seq_len, d_model] → pooled [batch, d_model]
    pub fn forward_embeds(&self, tok_emb: Tensor<B, 3>) -> Tensor<B, 2> {
        self.pool(self.encoder.forward_embeds(tok_emb))
    }

    pub fn embed_tokens(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.encoder.embed_tokens(input_ids)
    }

    pub fn embedding_table(&self) -> Tensor<B, 2> {
        self.encoder.embedding_table()
    }

    fn pool(&self, hidden: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, seq_len, d_model] = hidden.dims();
        match *self.pooling {
            Pooling::Cls => {
                let first = hidden
                    .slice([0..batch_size, 0..1, 0..d_model])
                    .reshape([batch_size, d_model]);
                self.pooler.forward(first).tanh()
            }
            Pooling::Mean => {
                debug_assert!(seq_len > 0);
                hidden.mean_dim(1).reshape([batch_size, d_model])
            }
        }
    }
}

/// A sentence encoder whose parameters never receive gradients.
#[derive(Debug, Clone)]
pub struct FrozenEncoder<B: Backend> {
    inner: SentenceEncoder<B>,
}

impl<B: Backend> FrozenEncoder<B> {
    pub fn new(encoder: SentenceEncoder<B>) -> Self {
        Self { inner: encoder.no_grad() }
    }

    pub fn get(&self) -> &SentenceEncoder<B> {
        &self.inner
    }

    /// Replace the weights with a loaded record; the result stays frozen.
    pub fn load_record(self, record: <SentenceEncoder<B> as Module<B>>::Record) -> Self {
        Self::new(self.inner.load_record(record))
    }

    pub fn into_record(self) -> <SentenceEncoder<B> as Module<B>>::Record {
        self.inner.into_record()
    }

    pub fn to_device(self, device: &B::Device) -> Self {
        Self::new(self.inner.to_device(device))
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.encoder.vocab_size()
    }

    pub fn max_seq_len(&self) -> usize {
        self.inner.encoder.max_seq_len
    }
}
