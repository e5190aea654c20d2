// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads a line-aligned parallel corpus from plain text files.
//
// Layout (Multi30k style):
//   <dir>/
//     train.de      train.en
//     val.de        val.en
//     test2016.de   test2016.en
//
// Line i of the source file is the translation partner of line i
// of the target file. A split whose two sides differ in line
// count is rejected: the alignment is broken and training on it
// would silently teach garbage.

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence_pair::{SentencePair, Split};
use crate::domain::traits::CorpusSource;

/// Loads sentence pairs from `<dir>/<split>.<ext>` file pairs.
pub struct ParallelCorpusLoader {
    dir:     PathBuf,
    src_ext: String,
    trg_ext: String,
}

impl ParallelCorpusLoader {
    pub fn new(
        dir:     impl Into<PathBuf>,
        src_ext: impl Into<String>,
        trg_ext: impl Into<String>,
    ) -> Self {
        Self {
            dir:     dir.into(),
            src_ext: src_ext.into(),
            trg_ext: trg_ext.into(),
        }
    }

    fn split_path(&self, split: Split, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", split.file_stem(), ext))
    }
}

impl CorpusSource for ParallelCorpusLoader {
    fn load_split(&self, split: Split) -> Result<Vec<SentencePair>> {
        let src_path = self.split_path(split, &self.src_ext);
        let trg_path = self.split_path(split, &self.trg_ext);

        let src_lines = read_lines(&src_path)?;
        let trg_lines = read_lines(&trg_path)?;

        if src_lines.len() != trg_lines.len() {
            bail!(
                "Split '{}' is misaligned: '{}' has {} lines but '{}' has {}",
                split,
                src_path.display(),
                src_lines.len(),
                trg_path.display(),
                trg_lines.len(),
            );
        }

        let prep = Preprocessor::new();
        let mut pairs   = Vec::with_capacity(src_lines.len());
        let mut skipped = 0usize;

        for (src, trg) in src_lines.iter().zip(&trg_lines) {
            let source = prep.clean(src);
            let target = prep.clean(trg);
            if source.is_empty() || target.is_empty() {
                skipped += 1;
                continue;
            }
            pairs.push(SentencePair::new(source, target));
        }

        if skipped > 0 {
            tracing::debug!("Split '{}': skipped {} empty pairs", split, skipped);
        }
        tracing::debug!("Split '{}': loaded {} pairs", split, pairs.len());
        Ok(pairs)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus file '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}
