// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `vocab` and `init-configs`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::{DEFAULT_ENCODER_NAME, DEFAULT_MLM_NAME};
use crate::infra::tokenizer_store::DEFAULT_MASK_TOKEN;
use crate::ml::sentence_encoder::Pooling;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the masked LM to make meaning-preserving Russian substitutions
    Train(TrainArgs),

    /// Show which tokens of a tokenizer are eligible substitutes
    Vocab(VocabArgs),

    /// Write default XLM-RoBERTa base model configs
    InitConfigs(InitConfigsArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Text file with one sentence per line
    #[arg(long)]
    pub sentences: String,

    /// Directory holding model configs and checkpoints
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    /// HuggingFace tokenizer.json shared by both models
    #[arg(long, default_value = "models/tokenizer.json")]
    pub tokenizer: String,

    /// Masked LM checkpoint name (loaded from {models_dir}/{name})
    #[arg(long, default_value = DEFAULT_MLM_NAME)]
    pub mlm_name: String,

    /// Sentence encoder checkpoint name
    #[arg(long, default_value = DEFAULT_ENCODER_NAME)]
    pub encoder_name: String,

    /// Token string reserved for the masked position
    #[arg(long, default_value = DEFAULT_MASK_TOKEN)]
    pub mask_token: String,

    /// Number of full passes over the sentence pairs
    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// Sentence pairs per optimiser step
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-5)]
    pub lr: f64,

    /// Gumbel-softmax temperature; must be positive
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    /// Seed for masking, shuffling and Gumbel noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Leave non-Cyrillic decoder outputs as loaded instead of zeroing them
    #[arg(long)]
    pub no_restrict_head: bool,

    /// Initialise both models randomly instead of loading checkpoints
    #[arg(long)]
    pub from_scratch: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            sentences:     a.sentences,
            models_dir:    a.models_dir,
            tokenizer:     a.tokenizer,
            mlm_name:      a.mlm_name,
            encoder_name:  a.encoder_name,
            mask_token:    a.mask_token,
            epochs:        a.epochs,
            batch_size:    a.batch_size,
            lr:            a.lr,
            temperature:   a.temperature,
            seed:          a.seed,
            restrict_head: !a.no_restrict_head,
            from_scratch:  a.from_scratch,
        }
    }
}

/// All arguments for the `vocab` command
#[derive(Args, Debug)]
pub struct VocabArgs {
    /// HuggingFace tokenizer.json to inspect
    #[arg(long, default_value = "models/tokenizer.json")]
    pub tokenizer: String,

    #[arg(long, default_value = DEFAULT_MASK_TOKEN)]
    pub mask_token: String,

    /// How many eligible tokens to print
    #[arg(long, default_value_t = 20)]
    pub sample: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PoolingArg {
    Cls,
    Mean,
}

impl From<PoolingArg> for Pooling {
    fn from(p: PoolingArg) -> Self {
        match p {
            PoolingArg::Cls  => Pooling::Cls,
            PoolingArg::Mean => Pooling::Mean,
        }
    }
}

/// All arguments for the `init-configs` command
#[derive(Args, Debug)]
pub struct InitConfigsArgs {
    #[arg(long, default_value = "models")]
    pub models_dir: String,

    #[arg(long, default_value = DEFAULT_MLM_NAME)]
    pub mlm_name: String,

    #[arg(long, default_value = DEFAULT_ENCODER_NAME)]
    pub encoder_name: String,

    /// Sentence embedding pooling of the encoder
    #[arg(long, value_enum, default_value_t = PoolingArg::Cls)]
    pub pooling: PoolingArg,

    /// Replace existing config files
    #[arg(long)]
    pub overwrite: bool,
}
