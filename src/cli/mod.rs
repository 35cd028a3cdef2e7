// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates every command to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`        — trains the masked LM on a sentence file
//   2. `vocab`        — prints target-vocabulary statistics
//   3. `init-configs` — writes default model configs
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InitConfigsArgs, TrainArgs, VocabArgs};

use crate::infra::checkpoint::ModelNames;

#[derive(Parser, Debug)]
#[command(
    name = "ru-substitute",
    version = "0.1.0",
    about = "Train a masked LM to substitute Russian tokens without changing sentence meaning."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)       => run_train(args),
            Commands::Vocab(args)       => run_vocab(args),
            Commands::InitConfigs(args) => run_init_configs(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on sentences in: {}", args.sentences);

    let use_case = TrainUseCase::new(args.into());
    let history  = use_case.execute()?;

    if let Some(last) = history.last() {
        println!(
            "Training complete. Final loss {:.4} over {} pairs.",
            last.train_loss, last.pairs
        );
    }
    Ok(())
}

fn run_vocab(args: VocabArgs) -> Result<()> {
    use crate::application::vocab_use_case::VocabUseCase;

    let report = VocabUseCase::new(args.tokenizer)
        .with_mask_token(args.mask_token)
        .report(args.sample)?;

    println!("Vocabulary size: {}", report.vocab_size);
    println!(
        "Cyrillic tokens: {} ({:.1}%)",
        report.allowed,
        report.allowed_fraction() * 100.0
    );
    println!("Mask token id:   {}", report.mask_id);
    println!("Sample:          {}", report.sample.join(" | "));
    Ok(())
}

fn run_init_configs(args: InitConfigsArgs) -> Result<()> {
    use crate::application::init_configs_use_case::InitConfigsUseCase;

    InitConfigsUseCase::new(&args.models_dir, ModelNames::new(args.mlm_name, args.encoder_name))
        .with_pooling(args.pooling.into())
        .with_overwrite(args.overwrite)
        .execute()?;

    println!("Model configs written to '{}'.", args.models_dir);
    Ok(())
}
