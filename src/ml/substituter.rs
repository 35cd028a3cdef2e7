// ============================================================
// Layer 5 — Lexical Substituter (composed forward / loss)
// ============================================================
// Couples the two models into one scalar loss:
//
//   masked ids ─► MaskedLm ─► logits at the masked position
//              ─► block non-Cyrillic ids ─► hard Gumbel-softmax
//              ─► selection [batch, vocab]
//              ─► comparator (frozen SentenceEncoder) ─► loss
//
// Only the MaskedLm is trainable. The optimiser is handed
// `mlm()` and nothing else; the sentence encoder is held as a
// FrozenEncoder and has no trainable parameters to offer.
//
// Non-target ids get a logit of MASKED_LOGIT before selection, so
// their probability (and their share of the softmax gradient) is
// exactly zero. Zeroing the decoder columns alone would only give
// them a logit of 0, which still carries probability mass.

use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::data::batcher::{PairBatcher, SubstitutionBatch};
use crate::domain::error::SubstitutionError;
use crate::domain::sentence_pair::SentencePair;
use crate::ml::comparator::{alignment_loss, substitute_embeddings};
use crate::ml::gumbel::GumbelSoftmax;
use crate::ml::masked_lm::{MaskedLm, MaskedLmConfig};
use crate::ml::sentence_encoder::{FrozenEncoder, SentenceEncoderConfig};
use crate::ml::vocab_filter::VocabularyMask;

/// Logit given to disallowed ids; exp() underflows to exactly 0 in f32.
pub const MASKED_LOGIT: f64 = -1.0e9;

pub struct LexicalSubstituter<B: AutodiffBackend> {
    mlm:           MaskedLm<B>,
    encoder:       FrozenEncoder<B>,
    vocabulary:    VocabularyMask,
    blocked:       Tensor<B, 1, Bool>,
    mask_token_id: u32,
    sampler:       GumbelSoftmax,
    device:        B::Device,
}

impl<B: AutodiffBackend> LexicalSubstituter<B> {
    /// Build both models from their configs on `device`.
    pub fn new(
        mlm_config:     &MaskedLmConfig,
        encoder_config: &SentenceEncoderConfig,
        vocabulary:     VocabularyMask,
        mask_token_id:  u32,
        sampler:        GumbelSoftmax,
        device:         &B::Device,
    ) -> Result<Self, SubstitutionError> {
        Self::from_parts(
            mlm_config.init(device),
            encoder_config.init_frozen(device),
            vocabulary,
            mask_token_id,
            sampler,
            device,
        )
    }

    /// Assemble from already-built (e.g. checkpoint-loaded) models.
    pub fn from_parts(
        mlm:           MaskedLm<B>,
        encoder:       FrozenEncoder<B>,
        vocabulary:    VocabularyMask,
        mask_token_id: u32,
        sampler:       GumbelSoftmax,
        device:        &B::Device,
    ) -> Result<Self, SubstitutionError> {
        let tokenizer = vocabulary.len();
        if mlm.vocab_size() != tokenizer || encoder.vocab_size() != tokenizer {
            return Err(SubstitutionError::VocabularyMismatch {
                tokenizer,
                mlm:     mlm.vocab_size(),
                encoder: encoder.vocab_size(),
            });
        }

        Ok(Self {
            blocked: vocabulary.blocked_tensor::<B>(device),
            mlm,
            encoder,
            vocabulary,
            mask_token_id,
            sampler,
            device: device.clone(),
        })
    }

    /// Sampled-selection loss for a batch. Shape [1].
    pub fn forward(&mut self, batch: &SubstitutionBatch<B>) -> Result<Tensor<B, 1>, SubstitutionError> {
        let logits    = self.masked_logits(batch)?;
        let selection = self.sampler.sample(logits);
        self.forward_with_selection(batch, selection)
    }

    /// Single-sentence form: validates the pair, then `forward`.
    pub fn forward_ids(&mut self, original: &[u32], masked: &[u32]) -> Result<Tensor<B, 1>, SubstitutionError> {
        let pair  = SentencePair::new(original.to_vec(), masked.to_vec(), self.mask_token_id)?;
        let batch = PairBatcher::<B>::new(self.device.clone()).try_batch(&[pair])?;
        self.forward(&batch)
    }

    /// Comparator loss for a caller-chosen selection [batch, vocab].
    pub fn forward_with_selection(
        &self,
        batch:     &SubstitutionBatch<B>,
        selection: Tensor<B, 2>,
    ) -> Result<Tensor<B, 1>, SubstitutionError> {
        self.check_length(batch)?;
        self.check_token_ids(batch)?;
        let encoder = self.encoder.get();

        let embeds = substitute_embeddings(
            encoder.embed_tokens(batch.masked.clone()),
            encoder.embedding_table(),
            selection,
            &batch.mask_positions,
        );
        let substituted = encoder.forward_embeds(embeds);
        let original    = encoder.forward(batch.original.clone());

        Ok(alignment_loss(substituted, original))
    }

    /// MLM logits at each row's masked position, disallowed ids
    /// pushed to MASKED_LOGIT. Shape [batch, vocab].
    pub fn masked_logits(&self, batch: &SubstitutionBatch<B>) -> Result<Tensor<B, 2>, SubstitutionError> {
        self.check_length(batch)?;
        self.check_token_ids(batch)?;
        let logits = self.mlm.forward(batch.masked.clone());
        let [_, _, vocab_size] = logits.dims();

        let rows: Vec<Tensor<B, 2>> = batch
            .mask_positions
            .iter()
            .enumerate()
            .map(|(row, &position)| {
                logits
                    .clone()
                    .slice([row..row + 1, position..position + 1, 0..vocab_size])
                    .reshape([1, vocab_size])
            })
            .collect();
        let at_mask = Tensor::cat(rows, 0);

        let blocked = self.blocked
            .clone()
            .unsqueeze::<2>()
            .expand([batch.batch_size(), vocab_size]);
        Ok(at_mask.mask_fill(blocked, MASKED_LOGIT))
    }

    /// Softmax of `masked_logits`: the MLM's proposal distribution.
    pub fn probabilities(&self, batch: &SubstitutionBatch<B>) -> Result<Tensor<B, 2>, SubstitutionError> {
        Ok(burn::tensor::activation::softmax(self.masked_logits(batch)?, 1))
    }

    /// Zero the decoder outside the target script. Explicit, never
    /// called by `forward`.
    pub fn restrict_vocabulary(&mut self) {
        self.mlm = self.mlm.clone().restricted(&self.vocabulary);
        tracing::info!(
            "Restricted MLM decoder to {} target tokens",
            self.vocabulary.allowed_count()
        );
    }

    /// Move both models (and the cached vocabulary mask) to `device`.
    pub fn to_device(&mut self, device: &B::Device) {
        self.mlm     = self.mlm.clone().to_device(device);
        self.encoder = self.encoder.clone().to_device(device);
        self.blocked = self.vocabulary.blocked_tensor::<B>(device);
        self.device  = device.clone();
    }

    pub fn mlm(&self) -> &MaskedLm<B> {
        &self.mlm
    }

    /// Install an updated MLM (e.g. after an optimiser step).
    pub fn set_mlm(&mut self, mlm: MaskedLm<B>) {
        self.mlm = mlm;
    }

    pub fn encoder(&self) -> &FrozenEncoder<B> {
        &self.encoder
    }

    pub fn vocabulary(&self) -> &VocabularyMask {
        &self.vocabulary
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    fn check_length(&self, batch: &SubstitutionBatch<B>) -> Result<(), SubstitutionError> {
        let max = self.mlm.max_seq_len().min(self.encoder.max_seq_len());
        let len = batch.seq_len();
        if len > max {
            return Err(SubstitutionError::SequenceTooLong { len, max });
        }
        Ok(())
    }

    /// Embedding lookups past the table would panic inside the backend.
    fn check_token_ids(&self, batch: &SubstitutionBatch<B>) -> Result<(), SubstitutionError> {
        let vocab_size = self.vocabulary.len();
        let largest = Tensor::cat(vec![batch.original.clone(), batch.masked.clone()], 0)
            .max()
            .into_scalar()
            .elem::<i64>();
        if largest >= vocab_size as i64 {
            let id = u32::try_from(largest).unwrap_or(u32::MAX);
            return Err(SubstitutionError::UnknownTokenId { id, vocab_size });
        }
        Ok(())
    }
}
