// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait: a Vec<TranslationItem> of
// ragged sentences becomes one padded TranslationBatch.
//
// Layout is time-major, matching the model's output layout:
//   src: [src_len, batch]     trg: [trg_len, batch]
//
// Every sequence is padded with <pad> up to the longest sequence
// on its side of the batch; the true lengths are kept alongside.
//
//   items (trg side):  [2 7 3]  [2 9 8 5 3]
//   trg tensor:        2 2
//                      7 9
//                      3 8
//                      1 5
//                      1 3        (pad = 1)
//   trg_lengths:       [3, 5]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationItem;

// ─── TranslationBatch ─────────────────────────────────────────────────────────
/// A padded batch of sentence pairs. Consumed by exactly one
/// training or evaluation step.
#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// Source token ids — shape: [src_len, batch_size]
    pub src: Tensor<B, 2, Int>,

    /// Unpadded source lengths — shape: [batch_size]
    pub src_lengths: Tensor<B, 1, Int>,

    /// Target token ids — shape: [trg_len, batch_size]
    pub trg: Tensor<B, 2, Int>,

    /// Unpadded target lengths — shape: [batch_size]
    pub trg_lengths: Tensor<B, 1, Int>,
}

// ─── TranslationBatcher ───────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    /// Device every batch tensor is created on
    pub device: B::Device,

    /// Id written into the padded tail of shorter sequences
    pub pad_id: u32,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }

    /// Pad `seqs` into a time-major [max_len, batch] tensor.
    fn pad_time_major(&self, seqs: &[&[u32]]) -> (Tensor<B, 2, Int>, Tensor<B, 1, Int>) {
        let padded = pad_batch_major(seqs, self.pad_id);

        let ids = Tensor::<B, 1, Int>::from_ints(
            padded.ids.as_slice(), &self.device
        )
        .reshape([seqs.len(), padded.max_len])
        .swap_dims(0, 1);

        let lengths = Tensor::<B, 1, Int>::from_ints(
            padded.lengths.as_slice(), &self.device
        );

        (ids, lengths)
    }
}

impl<B: Backend> Batcher<TranslationItem, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationItem>) -> TranslationBatch<B> {
        let src_seqs: Vec<&[u32]> = items.iter().map(|i| i.src_ids.as_slice()).collect();
        let trg_seqs: Vec<&[u32]> = items.iter().map(|i| i.trg_ids.as_slice()).collect();

        let (src, src_lengths) = self.pad_time_major(&src_seqs);
        let (trg, trg_lengths) = self.pad_time_major(&trg_seqs);

        TranslationBatch { src, src_lengths, trg, trg_lengths }
    }
}

/// Row-major padded ids plus true lengths, before tensor creation.
#[derive(Debug, PartialEq)]
struct PaddedIds {
    ids:     Vec<i32>,
    lengths: Vec<i32>,
    max_len: usize,
}

fn pad_batch_major(seqs: &[&[u32]], pad_id: u32) -> PaddedIds {
    let max_len = seqs.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut ids = Vec::with_capacity(seqs.len() * max_len);

    for seq in seqs {
        ids.extend(seq.iter().map(|&id| id as i32));
        ids.extend(std::iter::repeat(pad_id as i32).take(max_len - seq.len()));
    }

    PaddedIds {
        ids,
        lengths: seqs.iter().map(|s| s.len() as i32).collect(),
        max_len,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_pad_batch_major() {
        let a: &[u32] = &[2, 7, 3];
        let b: &[u32] = &[2, 9, 8, 5, 3];
        let padded = pad_batch_major(&[a, b], 1);

        assert_eq!(padded.max_len, 5);
        assert_eq!(padded.lengths, vec![3, 5]);
        assert_eq!(padded.ids, vec![2, 7, 3, 1, 1, 2, 9, 8, 5, 3]);
    }

    #[test]
    fn test_batch_is_time_major() {
        let device  = Default::default();
        let batcher = TranslationBatcher::<NdArray>::new(device, 1);

        let batch = batcher.batch(vec![
            TranslationItem { src_ids: vec![2, 4, 3],    trg_ids: vec![2, 7, 3] },
            TranslationItem { src_ids: vec![2, 5, 6, 3], trg_ids: vec![2, 9, 8, 5, 3] },
        ]);

        assert_eq!(batch.src.dims(), [4, 2]);
        assert_eq!(batch.trg.dims(), [5, 2]);

        let trg: Vec<i64> = batch.trg.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(trg, vec![2, 2, 7, 9, 3, 8, 1, 5, 1, 3]);

        let lengths: Vec<i64> = batch.trg_lengths.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(lengths, vec![3, 5]);
    }
}
