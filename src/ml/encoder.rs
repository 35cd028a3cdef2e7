// ============================================================
// Layer 5 — Transformer Text Encoder (shared backbone)
// ============================================================
// The bidirectional encoder both sub-models are built on:
//
//   token ids ──► token embedding ─┐
//                                  ├─► + ─► LayerNorm ─► dropout ─► N × EncoderBlock
//   positions ──► position embedding┘
//
// The masked LM puts a vocabulary head on top of it, the
// sentence encoder a pooler. Two entry points matter:
//
//   forward(ids)             — the usual path
//   forward_embeds(embeds)   — skips the token lookup so a
//                              caller can splice in a synthetic
//                              embedding at one position
//
// Reference: Vaswani et al. (2017), Devlin et al. (2019),
//            Liu et al. (2019) RoBERTa

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TextEncoderConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
    #[config(default = 1e-5)]
    pub layer_norm_eps: f64,
}

impl TextEncoderConfig {
    /// XLM-RoBERTa base dimensions.
    pub fn xlm_roberta_base() -> Self {
        Self::new(250_002, 514, 768, 12, 12, 3072)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let embedding_norm = LayerNormConfig::new(self.d_model)
            .with_epsilon(self.layer_norm_eps)
            .init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        TextEncoder {
            token_embedding, position_embedding, embedding_norm, layers, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).with_epsilon(self.layer_norm_eps).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).with_epsilon(self.layer_norm_eps).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// Post-norm block: x = LN(x + Attn(x)); x = LN(x + FFN(x))
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let attn_output = self.self_attn.forward(MhaInput::self_attn(x.clone())).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub embedding_norm:     LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids: [batch, seq_len] → hidden states [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.forward_embeds(self.embed_tokens(input_ids))
    }

    /// Token-table lookup only: [batch, seq_len] → [batch, seq_len, d_model]
    pub fn embed_tokens(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        self.token_embedding.forward(input_ids)
    }

    /// Runs everything after the token lookup on caller-supplied embeddings.
    pub fn forward_embeds(&self, tok_emb: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, _] = tok_emb.dims();

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(self.embedding_norm.forward(tok_emb + pos_emb));
        for layer in &self.layers {
            x = layer.forward(x);
        }
        x
    }

    /// The [vocab_size, d_model] input embedding table.
    pub fn embedding_table(&self) -> Tensor<B, 2> {
        self.token_embedding.weight.val()
    }

    pub fn vocab_size(&self) -> usize {
        self.token_embedding.weight.dims()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{tiny_encoder_config, TestBackend};

    #[test]
    fn test_hidden_state_shape() {
        let device  = Default::default();
        let encoder = tiny_encoder_config(5).init::<TestBackend>(&device);
        let ids = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 4], &device).reshape([1, 3]);

        let hidden = encoder.forward(ids);
        assert_eq!(hidden.dims(), [1, 3, 8]);
        assert_eq!(encoder.vocab_size(), 5);
    }

    #[test]
    fn test_embeds_path_matches_id_path() {
        let device  = Default::default();
        let encoder = tiny_encoder_config(5).init::<TestBackend>(&device);
        let ids = Tensor::<TestBackend, 1, Int>::from_ints([3, 1], &device).reshape([1, 2]);

        let via_ids    = encoder.forward(ids.clone());
        let via_embeds = encoder.forward_embeds(encoder.embed_tokens(ids));
        via_ids.into_data().assert_approx_eq(&via_embeds.into_data(), 5);
    }
}
