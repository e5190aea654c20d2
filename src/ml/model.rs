// ============================================================
// Layer 5 — Attention GRU Sequence-to-Sequence Model
// ============================================================
// Encoder:   embedding → stacked bidirectional GRU
// Attention: additive, softmax over source positions
// Decoder:   one GRU step per target position, fed either the
//            reference token or its own argmax (DecodeMode)
//
// Tensors entering and leaving the model are time-major
// ([len, batch]); Burn's Gru works batch-major internally.

use burn::{
    module::Param,
    nn::{
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{
        activation::{log_softmax, relu, softmax},
        Distribution,
    },
};
use rand::Rng;

/// How the decoder picks its next input token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodeMode {
    /// With probability `ratio` per step, feed the true previous target
    /// token; otherwise feed the model's own argmax prediction.
    TeacherForcing(f64),
    /// Always feed the model's own prediction (inference behaviour).
    Greedy,
}

impl DecodeMode {
    pub fn teacher_forcing_ratio(self) -> f64 {
        match self {
            DecodeMode::TeacherForcing(ratio) => ratio,
            DecodeMode::Greedy                => 0.0,
        }
    }
}

/// The forward computation the training and evaluation loops drive.
///
/// `src`: [src_len, batch] and `trg`: [trg_len, batch] token ids.
/// Returns log-probabilities [trg_len, batch, trg_vocab]; row 0 is
/// the forced start token and carries no prediction.
///
/// Regularisation such as dropout is a property of the backend: it
/// runs on autodiff backends only, so the `valid()` copy of a model
/// is deterministic.
pub trait Seq2SeqForward<B: Backend> {
    fn forward(
        &self,
        src:  Tensor<B, 2, Int>,
        trg:  Tensor<B, 2, Int>,
        mode: DecodeMode,
    ) -> Tensor<B, 3>;
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub src_vocab_size: usize,
    pub trg_vocab_size: usize,
    #[config(default = 256)]
    pub embed_size:     usize,
    #[config(default = 512)]
    pub hidden_size:    usize,
    #[config(default = 2)]
    pub encoder_layers: usize,
    #[config(default = 1)]
    pub decoder_layers: usize,
    #[config(default = 0.5)]
    pub dropout:        f64,
}

impl Seq2SeqConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Seq2Seq<B> {
        let encoder_layers = self.encoder_layers.max(1);
        // The decoder is seeded from encoder final states, two per encoder layer.
        let decoder_layers = self.decoder_layers.clamp(1, 2 * encoder_layers);
        let h = self.hidden_size;

        let gru = |d_input: usize| -> Gru<B> { GruConfig::new(d_input, h, true).init(device) };

        let encoder = Encoder {
            embedding:       EmbeddingConfig::new(self.src_vocab_size, self.embed_size).init(device),
            forward_layers:  (0..encoder_layers)
                .map(|i| gru(if i == 0 { self.embed_size } else { 2 * h }))
                .collect(),
            backward_layers: (0..encoder_layers)
                .map(|i| gru(if i == 0 { self.embed_size } else { 2 * h }))
                .collect(),
            dropout:         DropoutConfig::new(self.dropout).init(),
        };

        // Symmetric around zero so early scores carry no sign bias.
        let bound = 1.0 / (h as f64).sqrt();
        let attention = Attention {
            projection: LinearConfig::new(2 * h, h).init(device),
            v:          Param::from_tensor(Tensor::random(
                [h], Distribution::Uniform(-bound, bound), device,
            )),
        };

        let decoder = Decoder {
            embedding: EmbeddingConfig::new(self.trg_vocab_size, self.embed_size).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
            attention,
            layers:    (0..decoder_layers)
                .map(|i| gru(if i == 0 { self.embed_size + h } else { h }))
                .collect(),
            output:    LinearConfig::new(2 * h, self.trg_vocab_size).init(device),
        };

        Seq2Seq {
            encoder,
            decoder,
            trg_vocab_size: self.trg_vocab_size,
            decoder_layers,
        }
    }
}

// ─── Encoder ──────────────────────────────────────────────────────────────────
/// Embedding followed by a stack of bidirectional GRU layers.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub embedding:       Embedding<B>,
    /// Left-to-right GRUs, one per layer
    pub forward_layers:  Vec<Gru<B>>,
    /// Right-to-left GRUs, one per layer
    pub backward_layers: Vec<Gru<B>>,
    pub dropout:         Dropout,
}

pub struct EncoderOutput<B: Backend> {
    /// Sum of both directions of the top layer — [batch, src_len, hidden]
    pub outputs: Tensor<B, 3>,
    /// Final states, layer-major, forward before backward — each [batch, hidden]
    pub hidden:  Vec<Tensor<B, 2>>,
}

impl<B: Backend> Encoder<B> {
    /// src: [src_len, batch]
    pub fn forward(&self, src: Tensor<B, 2, Int>) -> EncoderOutput<B> {
        let mut x = self.embedding.forward(src.swap_dims(0, 1)); // [batch, src_len, embed]
        let [_, src_len, _] = x.dims();

        let mut hidden = Vec::with_capacity(2 * self.forward_layers.len());
        let mut fwd_top = None;
        let mut bwd_top = None;

        for (i, (fwd, bwd)) in self.forward_layers.iter().zip(&self.backward_layers).enumerate() {
            if i > 0 {
                x = self.dropout.forward(x);
            }
            let fwd_out = fwd.forward(x.clone(), None);
            let bwd_out = bwd.forward(x.flip([1]), None).flip([1]);

            hidden.push(time_slice(fwd_out.clone(), src_len - 1));
            hidden.push(time_slice(bwd_out.clone(), 0));

            x = Tensor::cat(vec![fwd_out.clone(), bwd_out.clone()], 2);
            fwd_top = Some(fwd_out);
            bwd_top = Some(bwd_out);
        }

        let outputs = match (fwd_top, bwd_top) {
            (Some(f), Some(b)) => f + b,
            _ => x,
        };
        EncoderOutput { outputs, hidden }
    }
}

// ─── Attention ────────────────────────────────────────────────────────────────
/// Additive attention: score_t = v · relu(W [h; e_t]).
#[derive(Module, Debug)]
pub struct Attention<B: Backend> {
    /// W: [2 * hidden] → [hidden], applied to the decoder state
    /// concatenated with each encoder output
    pub projection: Linear<B>,

    /// Scoring vector — shape: [hidden]
    pub v: Param<Tensor<B, 1>>,
}

impl<B: Backend> Attention<B> {
    /// hidden: [batch, hidden], encoder_outputs: [batch, src_len, hidden]
    /// → weights over source positions [batch, src_len]
    pub fn forward(&self, hidden: Tensor<B, 2>, encoder_outputs: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, src_len, hidden_size] = encoder_outputs.dims();

        let h = hidden
            .unsqueeze_dim::<3>(1)
            .expand([batch_size, src_len, hidden_size]);
        let energy = relu(self.projection.forward(Tensor::cat(vec![h, encoder_outputs], 2)));

        let v = self.v.val().reshape([1, 1, hidden_size]);
        let scores = (energy * v).sum_dim(2).reshape([batch_size, src_len]);

        softmax(scores, 1)
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub embedding: Embedding<B>,
    pub dropout:   Dropout,
    pub attention: Attention<B>,
    pub layers:    Vec<Gru<B>>,
    pub output:    Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// One decoding step.
    ///
    /// input: [batch] previous tokens, hidden: one [batch, hidden] state
    /// per layer, encoder_outputs: [batch, src_len, hidden].
    /// Returns log-probabilities [batch, trg_vocab] and the new states.
    pub fn step(
        &self,
        input:           Tensor<B, 1, Int>,
        hidden:          Vec<Tensor<B, 2>>,
        encoder_outputs: Tensor<B, 3>,
    ) -> (Tensor<B, 2>, Vec<Tensor<B, 2>>) {
        let [batch_size] = input.dims();
        let [_, _, hidden_size] = encoder_outputs.dims();

        let embedded = self
            .dropout
            .forward(self.embedding.forward(input.reshape([batch_size, 1]))); // [batch, 1, embed]

        let top = hidden[hidden.len() - 1].clone();
        let weights = self.attention.forward(top, encoder_outputs.clone());
        let context = weights.unsqueeze_dim::<3>(1).matmul(encoder_outputs); // [batch, 1, hidden]

        let mut x = Tensor::cat(vec![embedded, context.clone()], 2);
        let mut next_hidden = Vec::with_capacity(hidden.len());
        for (i, (gru, state)) in self.layers.iter().zip(hidden).enumerate() {
            if i > 0 {
                x = self.dropout.forward(x);
            }
            x = gru.forward(x, Some(state.unsqueeze_dim::<3>(1))); // [batch, 1, hidden]
            next_hidden.push(x.clone().reshape([batch_size, hidden_size]));
        }

        let logits = self.output.forward(
            Tensor::cat(vec![x, context], 2).reshape([batch_size, 2 * hidden_size]),
        );
        (log_softmax(logits, 1), next_hidden)
    }
}

// ─── Seq2Seq ──────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,

    /// Width of every output distribution
    pub trg_vocab_size: usize,

    /// Decoder GRU depth; the initial hidden state takes this many
    /// encoder final states
    pub decoder_layers: usize,
}

impl<B: Backend> Seq2SeqForward<B> for Seq2Seq<B> {
    fn forward(
        &self,
        src:  Tensor<B, 2, Int>,
        trg:  Tensor<B, 2, Int>,
        mode: DecodeMode,
    ) -> Tensor<B, 3> {
        let [trg_len, batch_size] = trg.dims();
        let device = trg.device();

        let encoded = self.encoder.forward(src);
        let mut hidden: Vec<Tensor<B, 2>> = encoded
            .hidden
            .into_iter()
            .take(self.decoder_layers)
            .collect();

        let ratio   = mode.teacher_forcing_ratio();
        let mut rng = rand::thread_rng();

        let mut outputs = Vec::with_capacity(trg_len);
        outputs.push(Tensor::<B, 2>::zeros([batch_size, self.trg_vocab_size], &device));

        let mut input = token_row(&trg, 0);
        for t in 1..trg_len {
            let (log_probs, next_hidden) =
                self.decoder.step(input, hidden, encoded.outputs.clone());
            hidden = next_hidden;

            input = if ratio > 0.0 && rng.gen::<f64>() < ratio {
                token_row(&trg, t)
            } else {
                log_probs.clone().argmax(1).reshape([batch_size])
            };
            outputs.push(log_probs);
        }

        Tensor::stack::<3>(outputs, 0)
    }
}

/// Row `t` of a time-major [len, batch] id tensor → [batch]
fn token_row<B: Backend>(ids: &Tensor<B, 2, Int>, t: usize) -> Tensor<B, 1, Int> {
    let [_, batch_size] = ids.dims();
    ids.clone().slice([t..t + 1, 0..batch_size]).reshape([batch_size])
}

/// Step `t` of a batch-major [batch, len, dim] tensor → [batch, dim]
fn time_slice<B: Backend>(x: Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
    let [batch_size, _, dim] = x.dims();
    x.slice([0..batch_size, t..t + 1, 0..dim]).reshape([batch_size, dim])
}
