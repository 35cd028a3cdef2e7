// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over equal-length batches of SentencePairs, with Adam
// updating the masked LM only. Batches come from Burn's DataLoader
// over a PairDataset; the loader reshuffles chunks every epoch.
//
// One step:
//   forward (Gumbel selection + comparator loss)
//     → loss.backward()
//     → GradientsParams over the MLM (the frozen encoder has none)
//     → GradientMask::apply on the decoder
//     → optim.step
//
// The gradient mask runs on every step, so disallowed decoder
// columns never move. If the head was restricted beforehand they
// stay exactly zero: Adam's moments for those entries never leave 0.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::{PairBatcher, SubstitutionBatch};
use crate::data::dataset::PairDataset;
use crate::domain::error::SubstitutionError;
use crate::domain::sentence_pair::SentencePair;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::masked_lm::MaskedLm;
use crate::ml::restriction::GradientMask;
use crate::ml::substituter::LexicalSubstituter;

/// One optimisation step. Returns the batch loss.
pub fn masked_step<B, O>(
    substituter: &mut LexicalSubstituter<B>,
    optim:       &mut O,
    grad_mask:   &GradientMask<B>,
    batch:       &SubstitutionBatch<B>,
    lr:          f64,
) -> Result<f64, SubstitutionError>
where
    B: AutodiffBackend,
    O: Optimizer<MaskedLm<B>, B>,
{
    let loss = substituter.forward(batch)?;
    let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

    let grads = loss.backward();
    let mut grads = GradientsParams::from_grads(grads, substituter.mlm());
    grad_mask.apply(&mut grads, substituter.mlm().decoder());

    let mlm = optim.step(lr, substituter.mlm().clone(), grads);
    substituter.set_mlm(mlm);

    Ok(loss_val)
}

/// Train for `cfg.epochs` epochs. Returns one metrics row per epoch.
pub fn run_training<B: AutodiffBackend>(
    cfg:         &TrainConfig,
    substituter: &mut LexicalSubstituter<B>,
    pairs:       Vec<SentencePair>,
    metrics:     &MetricsLogger,
) -> Result<Vec<EpochMetrics>> {
    if pairs.is_empty() {
        return Err(SubstitutionError::EmptyBatch.into());
    }

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new()
        .with_epsilon(1e-8)
        .init::<B, MaskedLm<B>>();

    let grad_mask = GradientMask::<B>::new(substituter.vocabulary(), substituter.device());

    // ── Training data loader ──────────────────────────────────────────────────
    // One dataset item is one equal-length chunk, so batch_size is 1 here.
    let dataset = PairDataset::new(pairs, cfg.batch_size);
    tracing::info!("{} pairs in {} equal-length batches", dataset.pair_count(), dataset.len());

    let batcher = PairBatcher::<B>::new(substituter.device().clone());
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(1)
        .shuffle(cfg.seed.unwrap_or_else(rand::random))
        .build(dataset);

    let mut history = Vec::with_capacity(cfg.epochs);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut seen     = 0usize;

        for (step, batch) in loader.iter().enumerate() {
            let batch = batch?;
            let loss  = masked_step(substituter, &mut optim, &grad_mask, &batch, cfg.lr)?;

            tracing::debug!(
                "epoch {} step {} | batch={} seq_len={} loss={:.6}",
                epoch, step + 1, batch.batch_size(), batch.seq_len(), loss
            );
            loss_sum += loss;
            seen     += batch.batch_size();
        }

        // The batch loss is a sum over sentences, so this is a per-pair mean.
        let row = EpochMetrics::new(epoch, loss_sum / seen as f64, seen);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | pairs={}",
            epoch, cfg.epochs, row.train_loss, row.pairs
        );
        metrics.log(&row)?;
        history.push(row);
    }

    tracing::info!("Training complete!");
    Ok(history)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::Vocabulary;
    use crate::ml::testing::{tiny_substituter, ListVocabulary, TestBackend};

    fn pairs(vocab: &ListVocabulary) -> Vec<SentencePair> {
        let mask = vocab.id_of("<mask>").unwrap();
        vec![
            SentencePair::mask_at(vec![0, 1, 2], 1, mask).unwrap(),
            SentencePair::mask_at(vec![2, 1, 0], 1, mask).unwrap(),
            SentencePair::mask_at(vec![1, 1], 0, mask).unwrap(),
        ]
    }

    fn vocab() -> ListVocabulary {
        ListVocabulary::new(&["б", "в", "x", "<mask>"])
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size: 2,
            lr:         1e-2,
            seed:       Some(17),
            ..TrainConfig::default()
        }
    }

    fn decoder_columns(substituter: &LexicalSubstituter<TestBackend>) -> Vec<Vec<f32>> {
        let weight: Vec<f32> = substituter.mlm().decoder().weight.val().into_data().to_vec().unwrap();
        let vocab_size = substituter.vocabulary().len();
        (0..vocab_size)
            .map(|col| weight.iter().skip(col).step_by(vocab_size).copied().collect())
            .collect()
    }

    #[test]
    fn test_step_moves_only_allowed_columns() {
        let vocab = vocab();
        let mut substituter = tiny_substituter(&vocab, 21);
        let before = decoder_columns(&substituter);

        let mut optim = AdamConfig::new().init::<TestBackend, MaskedLm<TestBackend>>();
        let grad_mask = GradientMask::<TestBackend>::new(substituter.vocabulary(), &Default::default());
        let batch = PairBatcher::<TestBackend>::new(Default::default())
            .try_batch(&pairs(&vocab)[..2])
            .unwrap();

        let loss = masked_step(&mut substituter, &mut optim, &grad_mask, &batch, 1e-2).unwrap();
        assert!(loss.is_finite());

        let after = decoder_columns(&substituter);
        // "x" (2) and "<mask>" (3) are outside the target script.
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]);
        assert_ne!(before[0], after[0]);
    }

    #[test]
    fn test_restricted_head_stays_restricted() {
        let vocab = vocab();
        let mut substituter = tiny_substituter(&vocab, 5);
        substituter.restrict_vocabulary();

        let dir     = tempfile::tempdir().unwrap();
        let metrics = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
        let history = run_training(&config(2), &mut substituter, pairs(&vocab), &metrics).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.train_loss.is_finite() && m.pairs == 3));

        let columns = decoder_columns(&substituter);
        assert!(columns[2].iter().all(|&w| w == 0.0));
        assert!(columns[3].iter().all(|&w| w == 0.0));

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_loader_order_follows_the_seed() {
        use crate::ml::gumbel::GumbelConfig;

        let vocab = vocab();
        let base  = tiny_substituter(&vocab, 9);
        let run = || {
            let mut substituter = LexicalSubstituter::from_parts(
                base.mlm().clone(),
                base.encoder().clone(),
                base.vocabulary().clone(),
                vocab.id_of("<mask>").unwrap(),
                GumbelConfig::new().with_seed(Some(9)).init().unwrap(),
                &Default::default(),
            )
            .unwrap();
            let dir     = tempfile::tempdir().unwrap();
            let metrics = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();
            run_training(&config(2), &mut substituter, pairs(&vocab), &metrics).unwrap()
        };

        let losses = |h: Vec<EpochMetrics>| h.iter().map(|m| m.train_loss).collect::<Vec<_>>();
        assert_eq!(losses(run()), losses(run()));
    }

    #[test]
    fn test_no_pairs_is_an_error() {
        let vocab = vocab();
        let mut substituter = tiny_substituter(&vocab, 1);
        let dir     = tempfile::tempdir().unwrap();
        let metrics = MetricsLogger::new(dir.path().to_string_lossy()).unwrap();

        assert!(run_training(&config(1), &mut substituter, Vec::new(), &metrics).is_err());
    }
}
