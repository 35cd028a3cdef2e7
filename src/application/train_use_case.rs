// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a substitution training run in order:
//
//   Step 1: Load tokenizer + mask id     (Layer 6 - infra)
//   Step 2: Build the Cyrillic mask      (Layer 5 - ml)
//   Step 3: Load model configs           (Layer 6 - infra)
//   Step 4: Load (or init) both models   (Layer 6 - infra)
//   Step 5: Assemble the substituter     (Layer 5 - ml)
//   Step 6: Load sentences               (Layer 4 - data)
//   Step 7: Build sentence pairs         (Layer 4 - data)
//   Step 8: Save run config              (Layer 6 - infra)
//   Step 9: Run training loop            (Layer 5 - ml)
//   Step 10: Save both models as {name}_ (Layer 6 - infra)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{loader::SentenceLoader, masker::PairMasker};
use crate::domain::traits::SentenceSource;
use crate::infra::{
    checkpoint::{CheckpointManager, ModelNames, DEFAULT_ENCODER_NAME, DEFAULT_MLM_NAME},
    metrics::{EpochMetrics, MetricsLogger},
    tokenizer_store::{TokenizerStore, DEFAULT_MASK_TOKEN},
};
use crate::ml::{
    gumbel::GumbelConfig,
    substituter::LexicalSubstituter,
    trainer::run_training,
    vocab_filter::VocabularyMask,
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Serialisable so it is stored next to the
// checkpoints it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub sentences:     String,
    pub models_dir:    String,
    pub tokenizer:     String,
    pub mlm_name:      String,
    pub encoder_name:  String,
    pub mask_token:    String,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub lr:            f64,
    pub temperature:   f64,
    pub seed:          Option<u64>,
    pub restrict_head: bool,
    pub from_scratch:  bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            sentences:     "data/sentences.txt".to_string(),
            models_dir:    "models".to_string(),
            tokenizer:     "models/tokenizer.json".to_string(),
            mlm_name:      DEFAULT_MLM_NAME.to_string(),
            encoder_name:  DEFAULT_ENCODER_NAME.to_string(),
            mask_token:    DEFAULT_MASK_TOKEN.to_string(),
            epochs:        1,
            batch_size:    8,
            lr:            1e-5,
            temperature:   1.0,
            seed:          None,
            restrict_head: true,
            from_scratch:  false,
        }
    }
}

impl TrainConfig {
    pub fn model_names(&self) -> ModelNames {
        ModelNames::new(&self.mlm_name, &self.encoder_name)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run on the default WGPU device.
    pub fn execute(&self) -> Result<Vec<EpochMetrics>> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<MyBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<Vec<EpochMetrics>> {
        let cfg = &self.config;

        // ── Step 1: Tokenizer ─────────────────────────────────────────────────
        let (tokenizer, mask_id) = TokenizerStore::new(&cfg.tokenizer)
            .load_with_mask(&cfg.mask_token)?;

        // ── Step 2: Target-script mask ────────────────────────────────────────
        let vocabulary = VocabularyMask::build(&tokenizer)?;

        // ── Step 3: Model configs ─────────────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.models_dir, cfg.model_names());
        let (mlm_cfg, enc_cfg) = ckpt.load_configs()?;

        // ── Step 4: Models ────────────────────────────────────────────────────
        let (mlm, encoder) = if cfg.from_scratch {
            tracing::warn!("Starting from randomly initialised weights");
            (mlm_cfg.init::<B>(device), enc_cfg.init_frozen::<B>(device))
        } else {
            (ckpt.load_mlm::<B>(&mlm_cfg, device)?, ckpt.load_encoder::<B>(&enc_cfg, device)?)
        };

        // ── Step 5: Substituter ───────────────────────────────────────────────
        let sampler = GumbelConfig::new()
            .with_temperature(cfg.temperature)
            .with_seed(cfg.seed)
            .init()?;
        let mut substituter =
            LexicalSubstituter::from_parts(mlm, encoder, vocabulary, mask_id, sampler, device)?;
        if cfg.restrict_head {
            substituter.restrict_vocabulary();
        }

        // ── Step 6: Sentences ─────────────────────────────────────────────────
        let sentences = SentenceLoader::new(&cfg.sentences).load_all()?;

        // ── Step 7: Sentence pairs ────────────────────────────────────────────
        let max_len = mlm_cfg.encoder.max_seq_len.min(enc_cfg.encoder.max_seq_len);
        let pairs = PairMasker::new(mask_id, max_len, cfg.seed).build_pairs(
            &sentences,
            &tokenizer,
            substituter.vocabulary().as_slice(),
        )?;

        // ── Step 8: Save run config ───────────────────────────────────────────
        ckpt.save_train_config(cfg)?;

        // ── Step 9: Training loop (Layer 5) ───────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.models_dir)?;
        let history = run_training(cfg, &mut substituter, pairs, &metrics)?;

        // ── Step 10: Save ─────────────────────────────────────────────────────
        ckpt.save_models(substituter.mlm(), &mlm_cfg, substituter.encoder(), &enc_cfg)?;

        Ok(history)
    }
}
