// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a raw corpus file to tensor batches.
//
// The pipeline flows in this order:
//
//   sentences.txt
//       │
//       ▼
//   SentenceLoader    → one cleaned sentence per non-empty line
//       │
//       ▼
//   Tokenizer         → sentence to token ids (infra::tokenizer_store)
//       │
//       ▼
//   PairMasker        → hides one target-script token per sentence
//       │
//       ▼
//   PairDataset       → equal-length chunks (no padding)
//       │
//       ▼
//   DataLoader        → shuffled chunks, one per step
//       │
//       ▼
//   PairBatcher       → SubstitutionBatch of Int tensors
//       │
//       ▼
//   training loop (ml::trainer)

/// Corpus file reader
pub mod loader;

/// Line-level text normalisation
pub mod preprocessor;

/// Random masking of one target-script token per sentence
pub mod masker;

/// Length bucketing as a burn Dataset
pub mod dataset;

/// Tensor batching
pub mod batcher;
