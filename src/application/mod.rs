// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// user-facing goal each.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// The substitution training workflow
pub mod train_use_case;

/// Target-vocabulary statistics for a tokenizer
pub mod vocab_use_case;

/// Default model config generation
pub mod init_configs_use_case;
