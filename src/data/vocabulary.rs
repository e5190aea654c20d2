// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// A read-only token ↔ id mapping for one language, backed by a
// HuggingFace WordLevel tokenizer (built and persisted by
// infra::vocab_store). Sentences reaching this type are already
// cleaned, so whitespace splitting gives the exact tokens.
//
// Encoded sequences are framed as <sos> w1 .. wn <eos>; the
// first target position is therefore always <sos>, which the
// loss skips.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::domain::vocabulary::SpecialToken;

/// Token ↔ id mapping for one language.
pub struct Vocabulary {
    tokenizer: Tokenizer,
}

impl Vocabulary {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Number of ids, reserved tokens included.
    pub fn len(&self) -> usize {
        self.tokenizer.get_vocab_size(false)
    }

    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.tokenizer.token_to_id(token)
    }

    pub fn id_to_token(&self, id: u32) -> Option<String> {
        self.tokenizer.id_to_token(id)
    }

    /// `<sos>` + word ids + `<eos>`. Unknown words map to `<unk>`.
    pub fn encode(&self, sentence: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(sentence, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut ids = Vec::with_capacity(encoding.len() + 2);
        ids.push(SpecialToken::Sos.id());
        ids.extend_from_slice(encoding.get_ids());
        ids.push(SpecialToken::Eos.id());
        Ok(ids)
    }

    /// Space-joined words for `ids`, reserved tokens dropped.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter(|&&id| !SpecialToken::is_reserved(id))
            .map(|&id| {
                self.id_to_token(id)
                    .unwrap_or_else(|| SpecialToken::Unk.as_str().to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
