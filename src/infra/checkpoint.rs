// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Loads and saves the two models of a substitution run.
//
// What lives in the models directory, per model name:
//   1. {name}.json     — architecture config (burn Config JSON)
//   2. {name}.mpk.gz   — weights (burn record, full precision)
//
// Loading reads {name}; saving writes {name}_ with a trailing
// underscore, so the checkpoint a run started from is never
// overwritten by the run itself.
//
//   models/
//     xlm-roberta-base.json              ← masked LM config
//     xlm-roberta-base.mpk.gz            ← masked LM weights
//     xlm-roberta-base-mean-tokens.json  ← sentence encoder config
//     xlm-roberta-base-mean-tokens.mpk.gz
//     xlm-roberta-base_.json             ← written after training
//     xlm-roberta-base_.mpk.gz
//     ...
//
// Records are stored at full precision: a saved model reloads
// bit-for-bit and reproduces the same loss for the same seed.
//
// A checkpoint that does not match the configured architecture
// (table and decoder shapes, layer count, parameter count) is
// rejected instead of being silently truncated.

use anyhow::{bail, Context, Result};
use burn::{
    config::Config,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::masked_lm::{MaskedLm, MaskedLmConfig};
use crate::ml::sentence_encoder::{FrozenEncoder, SentenceEncoder, SentenceEncoderConfig};

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Default masked LM checkpoint name.
pub const DEFAULT_MLM_NAME: &str = "xlm-roberta-base";

/// Default sentence encoder checkpoint name.
pub const DEFAULT_ENCODER_NAME: &str = "xlm-roberta-base-mean-tokens";

/// The pair of checkpoint names a run loads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelNames {
    pub mlm:     String,
    pub encoder: String,
}

impl ModelNames {
    pub fn new(mlm: impl Into<String>, encoder: impl Into<String>) -> Self {
        Self { mlm: mlm.into(), encoder: encoder.into() }
    }

    /// The names a run saves under.
    pub fn saved(&self) -> Self {
        Self::new(format!("{}_", self.mlm), format!("{}_", self.encoder))
    }
}

impl Default for ModelNames {
    fn default() -> Self {
        Self::new(DEFAULT_MLM_NAME, DEFAULT_ENCODER_NAME)
    }
}

pub struct CheckpointManager {
    dir:   PathBuf,
    names: ModelNames,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<String>, names: ModelNames) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir, names }
    }

    // ── Configs ───────────────────────────────────────────────────────────────

    pub fn load_configs(&self) -> Result<(MaskedLmConfig, SentenceEncoderConfig)> {
        let mlm_path = self.config_path(&self.names.mlm);
        let mlm = MaskedLmConfig::load(&mlm_path).map_err(|e| {
            anyhow::anyhow!("Cannot load model config '{}': {e}", mlm_path.display())
        })?;

        let enc_path = self.config_path(&self.names.encoder);
        let encoder = SentenceEncoderConfig::load(&enc_path).map_err(|e| {
            anyhow::anyhow!("Cannot load model config '{}': {e}", enc_path.display())
        })?;

        Ok((mlm, encoder))
    }

    /// Write both configs under the loading names.
    pub fn save_configs(&self, mlm: &MaskedLmConfig, encoder: &SentenceEncoderConfig) -> Result<()> {
        self.write_configs(&self.names, mlm, encoder)
    }

    // ── Weights ───────────────────────────────────────────────────────────────

    pub fn load_mlm<B: Backend>(&self, config: &MaskedLmConfig, device: &B::Device) -> Result<MaskedLm<B>> {
        let path = self.dir.join(&self.names.mlm);
        tracing::info!("Loading masked LM from '{}'", path.display());

        let record: <MaskedLm<B> as Module<B>>::Record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        // ── Structure check before the weights are swapped in ─────────────────
        let table   = record.encoder.token_embedding.weight.val().dims();
        let decoder = record.head.decoder.weight.val().dims();
        let layers  = record.encoder.layers.len();
        let enc     = &config.encoder;
        if table != [enc.vocab_size, enc.d_model]
            || decoder != [enc.d_model, enc.vocab_size]
            || layers != enc.num_layers
        {
            bail!(
                "Checkpoint '{}' does not match its config: table {:?}, decoder {:?}, {} layers",
                path.display(), table, decoder, layers
            );
        }

        let fresh    = config.init::<B>(device);
        let expected = fresh.num_params();
        let model    = fresh.load_record(record);
        if model.num_params() != expected {
            bail!(
                "Checkpoint '{}' holds {} parameters, config expects {}",
                path.display(), model.num_params(), expected
            );
        }
        Ok(model)
    }

    pub fn load_encoder<B: Backend>(
        &self,
        config: &SentenceEncoderConfig,
        device: &B::Device,
    ) -> Result<FrozenEncoder<B>> {
        let path = self.dir.join(&self.names.encoder);
        tracing::info!("Loading sentence encoder from '{}'", path.display());

        let record: <SentenceEncoder<B> as Module<B>>::Record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        let table  = record.encoder.token_embedding.weight.val().dims();
        let layers = record.encoder.layers.len();
        let enc    = &config.encoder;
        if table != [enc.vocab_size, enc.d_model] || layers != enc.num_layers {
            bail!(
                "Checkpoint '{}' does not match its config: table {:?}, {} layers",
                path.display(), table, layers
            );
        }

        let fresh    = config.init_frozen::<B>(device);
        let expected = fresh.get().num_params();
        let encoder  = fresh.load_record(record);
        if encoder.get().num_params() != expected {
            bail!(
                "Checkpoint '{}' holds {} parameters, config expects {}",
                path.display(), encoder.get().num_params(), expected
            );
        }
        Ok(encoder)
    }

    /// Save both models, and their configs, under the `_` names.
    pub fn save_models<B: Backend>(
        &self,
        mlm:            &MaskedLm<B>,
        mlm_config:     &MaskedLmConfig,
        encoder:        &FrozenEncoder<B>,
        encoder_config: &SentenceEncoderConfig,
    ) -> Result<()> {
        let saved = self.names.saved();

        let mlm_path = self.dir.join(&saved.mlm);
        CheckpointRecorder::new()
            .record(mlm.clone().into_record(), mlm_path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", mlm_path.display()))?;

        let enc_path = self.dir.join(&saved.encoder);
        CheckpointRecorder::new()
            .record(encoder.clone().into_record(), enc_path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", enc_path.display()))?;

        self.write_configs(&saved, mlm_config, encoder_config)?;
        tracing::info!(
            "Saved checkpoints '{}' and '{}'",
            mlm_path.display(),
            enc_path.display()
        );
        Ok(())
    }

    // ── Run config ────────────────────────────────────────────────────────────

    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    fn write_configs(
        &self,
        names:   &ModelNames,
        mlm:     &MaskedLmConfig,
        encoder: &SentenceEncoderConfig,
    ) -> Result<()> {
        let mlm_path = self.config_path(&names.mlm);
        mlm.save(&mlm_path)
            .with_context(|| format!("Cannot write config to '{}'", mlm_path.display()))?;

        let enc_path = self.config_path(&names.encoder);
        encoder.save(&enc_path)
            .with_context(|| format!("Cannot write config to '{}'", enc_path.display()))?;
        Ok(())
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::PairBatcher;
    use crate::domain::sentence_pair::SentencePair;
    use crate::ml::gumbel::GumbelConfig;
    use crate::ml::substituter::LexicalSubstituter;
    use crate::ml::testing::{tiny_mlm_config, tiny_sentence_config, tiny_substituter, ListVocabulary, TestBackend};
    use crate::ml::vocab_filter::VocabularyMask;

    fn manager(dir: &tempfile::TempDir, names: ModelNames) -> CheckpointManager {
        CheckpointManager::new(dir.path().to_string_lossy(), names)
    }

    #[test]
    fn test_saved_names_get_a_trailing_underscore() {
        let saved = ModelNames::default().saved();
        assert_eq!(saved.mlm, "xlm-roberta-base_");
        assert_eq!(saved.encoder, "xlm-roberta-base-mean-tokens_");
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = manager(&dir, ModelNames::new("mlm", "enc"));
        ckpt.save_configs(&tiny_mlm_config(3), &tiny_sentence_config(3)).unwrap();

        let (mlm, encoder) = ckpt.load_configs().unwrap();
        assert_eq!(mlm.vocab_size(), 3);
        assert_eq!(encoder.encoder.d_model, 8);
        assert!(dir.path().join("mlm.json").exists());
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = manager(&dir, ModelNames::new("absent", "absent-enc"));
        let result = ckpt.load_mlm::<TestBackend>(&tiny_mlm_config(3), &Default::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_save_then_load_reproduces_the_loss() {
        let dir   = tempfile::tempdir().unwrap();
        let names = ModelNames::new("mlm", "enc");
        let vocab = ListVocabulary::new(&["a", "б", "в", "<mask>"]);
        let device: <TestBackend as Backend>::Device = Default::default();

        let pair  = SentencePair::mask_at(vec![0, 1, 2], 1, 3).unwrap();
        let batch = PairBatcher::<TestBackend>::new(device.clone()).try_batch(&[pair]).unwrap();

        let mut original = tiny_substituter(&vocab, 99);
        let expected: f32 = original.forward(&batch).unwrap().into_scalar();

        manager(&dir, names.clone())
            .save_models(original.mlm(), &tiny_mlm_config(4), original.encoder(), &tiny_sentence_config(4))
            .unwrap();

        let reload = manager(&dir, names.saved());
        let (mlm_cfg, enc_cfg) = reload.load_configs().unwrap();
        let mut restored = LexicalSubstituter::from_parts(
            reload.load_mlm::<TestBackend>(&mlm_cfg, &device).unwrap(),
            reload.load_encoder::<TestBackend>(&enc_cfg, &device).unwrap(),
            VocabularyMask::build(&vocab).unwrap(),
            3,
            GumbelConfig::new().with_seed(Some(99)).init().unwrap(),
            &device,
        )
        .unwrap();

        let actual: f32 = restored.forward(&batch).unwrap().into_scalar();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_structural_mismatch_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let names = ModelNames::new("mlm", "enc");
        let vocab = ListVocabulary::new(&["a", "б", "в", "<mask>"]);
        let model = tiny_substituter(&vocab, 1);

        manager(&dir, names.clone())
            .save_models(model.mlm(), &tiny_mlm_config(4), model.encoder(), &tiny_sentence_config(4))
            .unwrap();

        let reload = manager(&dir, names.saved());
        let wider  = tiny_mlm_config(7);
        assert!(reload.load_mlm::<TestBackend>(&wider, &Default::default()).is_err());
    }
}
