use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::vocabulary::Vocabulary;
use crate::domain::sentence_pair::SentencePair;

/// One encoded sentence pair, unpadded.
/// Both sides are framed as <sos> .. <eos>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationItem {
    pub src_ids: Vec<u32>,
    pub trg_ids: Vec<u32>,
}

pub struct TranslationDataset {
    items: Vec<TranslationItem>,
}

impl TranslationDataset {
    pub fn new(items: Vec<TranslationItem>) -> Self { Self { items } }

    /// Encode every pair with the source and target vocabularies.
    pub fn encode(
        pairs:     &[SentencePair],
        src_vocab: &Vocabulary,
        trg_vocab: &Vocabulary,
    ) -> Result<Self> {
        let items = pairs
            .iter()
            .map(|p| {
                Ok(TranslationItem {
                    src_ids: src_vocab.encode(&p.source)?,
                    trg_ids: trg_vocab.encode(&p.target)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }

    pub fn sample_count(&self) -> usize { self.items.len() }

    /// Number of batches one pass yields at `batch_size`.
    pub fn batch_count(&self, batch_size: usize) -> usize {
        self.items.len().div_ceil(batch_size.max(1))
    }
}

impl Dataset<TranslationItem> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_count_rounds_up() {
        let item = TranslationItem { src_ids: vec![2, 3], trg_ids: vec![2, 3] };
        let ds   = TranslationDataset::new(vec![item; 5]);
        assert_eq!(ds.batch_count(2), 3);
        assert_eq!(ds.batch_count(5), 1);
        assert_eq!(ds.batch_count(32), 1);
        assert_eq!(TranslationDataset::new(Vec::new()).batch_count(4), 0);
    }
}
