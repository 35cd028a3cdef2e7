// ============================================================
// Layer 4 — Sentence Loader
// ============================================================
// Reads a UTF-8 corpus file with one sentence per line.
//
//   line ─► Preprocessor::clean ─► skip if empty ─► sentence
//
// Unlike a directory of optional documents, the corpus is the
// whole point of a training run: a missing or unreadable file is
// an error, not an empty result.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::SentenceSource;

pub struct SentenceLoader {
    path:         PathBuf,
    preprocessor: Preprocessor,
}

impl SentenceLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), preprocessor: Preprocessor::new() }
    }
}

impl SentenceSource for SentenceLoader {
    fn load_all(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read sentences from '{}'", self.path.display()))?;

        let sentences: Vec<String> = text
            .lines()
            .map(|line| self.preprocessor.clean(line))
            .filter(|line| !line.is_empty())
            .collect();

        tracing::info!(
            "Loaded {} sentences from '{}'",
            sentences.len(),
            self.path.display()
        );
        Ok(sentences)
    }
}
