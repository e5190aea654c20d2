// ============================================================
// Layer 3 — SentencePair Domain Type
// ============================================================
// One aligned example from a parallel corpus: a sentence in the
// source language and its translation in the target language.
// By the time a SentencePair exists both sides have been cleaned
// and are whitespace-tokenisable.

use serde::{Deserialize, Serialize};

/// An aligned source/target sentence pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    /// Sentence in the source language (e.g. German)
    pub source: String,

    /// Reference translation in the target language (e.g. English)
    pub target: String,
}

impl SentencePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Number of whitespace tokens on the source side
    pub fn source_len(&self) -> usize {
        self.source.split_whitespace().count()
    }

    /// Number of whitespace tokens on the target side
    pub fn target_len(&self) -> usize {
        self.target.split_whitespace().count()
    }
}

/// The three standard partitions of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    /// File stem used on disk, following the Multi30k layout.
    pub fn file_stem(self) -> &'static str {
        match self {
            Split::Train      => "train",
            Split::Validation => "val",
            Split::Test       => "test2016",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}
