// ============================================================
// Layer 2 — InitConfigsUseCase
// ============================================================
// Writes the two architecture configs a run loads, with the
// XLM-RoBERTa base dimensions, so weights converted elsewhere can
// be dropped next to them.
//
//   models/xlm-roberta-base.json
//   models/xlm-roberta-base-mean-tokens.json

use anyhow::{bail, Result};
use std::path::Path;

use crate::infra::checkpoint::{CheckpointManager, ModelNames};
use crate::ml::{
    encoder::TextEncoderConfig,
    masked_lm::MaskedLmConfig,
    sentence_encoder::{Pooling, SentenceEncoderConfig},
};

pub struct InitConfigsUseCase {
    models_dir: String,
    names:      ModelNames,
    pooling:    Pooling,
    overwrite:  bool,
}

impl InitConfigsUseCase {
    pub fn new(models_dir: impl Into<String>, names: ModelNames) -> Self {
        Self { models_dir: models_dir.into(), names, pooling: Pooling::Cls, overwrite: false }
    }

    pub fn with_pooling(mut self, pooling: Pooling) -> Self {
        self.pooling = pooling;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn execute(&self) -> Result<()> {
        let dir = Path::new(&self.models_dir);
        for name in [&self.names.mlm, &self.names.encoder] {
            let path = dir.join(format!("{name}.json"));
            if path.exists() && !self.overwrite {
                bail!("'{}' already exists (pass --overwrite to replace it)", path.display());
            }
        }

        let mlm     = MaskedLmConfig::new(TextEncoderConfig::xlm_roberta_base());
        let encoder = SentenceEncoderConfig::new(TextEncoderConfig::xlm_roberta_base())
            .with_pooling(self.pooling);

        CheckpointManager::new(&self.models_dir, self.names.clone()).save_configs(&mlm, &encoder)?;
        tracing::info!(
            "Wrote model configs '{}' and '{}' to '{}'",
            self.names.mlm, self.names.encoder, self.models_dir
        );
        Ok(())
    }
}
