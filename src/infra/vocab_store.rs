// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds one word-level vocabulary per language from the training
// split and persists it next to the checkpoints, so the ids used
// during training can be recovered when a checkpoint is reloaded.
//
// The vocabulary is written as a HuggingFace tokenizer JSON
// (WordLevel model, WhitespaceSplit pre-tokenizer) and read back
// with Tokenizer::from_file. Text is already lower-cased and
// punctuation-split by the Preprocessor, so no normaliser is set.
//
// Selection rule (torchtext compatible):
//   - count whitespace tokens over the training sentences
//   - keep tokens seen at least `min_freq` times
//   - most frequent first, ties alphabetical
//   - at most `max_size` words, ids assigned from 4 upwards
//     after the reserved <unk> <pad> <sos> <eos>

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};
use tokenizers::Tokenizer;

use crate::data::vocabulary::Vocabulary;
use crate::domain::vocabulary::SpecialToken;

pub struct VocabStore {
    dir: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("vocab.{lang}.json"))
    }

    /// Load a previously saved vocabulary for `lang`.
    pub fn load(&self, lang: &str) -> Result<Vocabulary> {
        let path = self.path_for(lang);
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load vocabulary from '{}': {}", path.display(), e
            ))?;
        Ok(Vocabulary::new(tokenizer))
    }

    /// Build the vocabulary for `lang` from `sentences`, save it and
    /// load it back.
    pub fn build_and_save<'a, I>(
        &self,
        lang:      &str,
        sentences: I,
        min_freq:  usize,
        max_size:  usize,
    ) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let words = select_words(sentences, min_freq, max_size);

        let mut vocab = serde_json::Map::new();
        for tok in SpecialToken::ALL {
            vocab.insert(tok.as_str().to_string(), serde_json::json!(tok.id()));
        }
        let mut next_id = SpecialToken::ALL.len() as u32;
        for word in &words {
            vocab.insert(word.clone(), serde_json::json!(next_id));
            next_id += 1;
        }

        let added_tokens: Vec<serde_json::Value> = SpecialToken::ALL
            .iter()
            .map(|tok| serde_json::json!({
                "id": tok.id(),
                "content": tok.as_str(),
                "single_word": false,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": SpecialToken::Unk.as_str()
            }
        });

        let path = self.path_for(lang);
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary '{}'", path.display()))?;

        tracing::info!(
            "Vocabulary '{}' built with {} entries, saved to '{}'",
            lang,
            next_id,
            path.display()
        );

        self.load(lang)
    }
}

/// Apply the frequency / size selection rule to the corpus tokens.
fn select_words<'a, I>(sentences: I, min_freq: usize, max_size: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut freq: HashMap<&'a str, usize> = HashMap::new();
    for sentence in sentences {
        for word in sentence.split_whitespace() {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(&str, usize)> = freq
        .into_iter()
        .filter(|&(w, n)| {
            n >= min_freq && !SpecialToken::ALL.iter().any(|t| t.as_str() == w)
        })
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.truncate(max_size);

    words.into_iter().map(|(w, _)| w.to_string()).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 4] = [
        "a dog runs .",
        "a cat runs .",
        "a dog sleeps",
        "zebra",
    ];

    fn temp_store(name: &str) -> (VocabStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "seq2seq_vocab_{}_{}",
            name,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        (VocabStore::new(&dir), dir)
    }

    #[test]
    fn test_selection_order_and_min_freq() {
        let words = select_words(CORPUS, 2, 100);
        // a:3, dog:2, runs:2, .:2 — cat, sleeps, zebra are below min_freq
        assert_eq!(words, vec!["a", ".", "dog", "runs"]);
    }

    #[test]
    fn test_selection_max_size() {
        let words = select_words(CORPUS, 1, 2);
        assert_eq!(words, vec!["a", "."]);
    }

    #[test]
    fn test_built_vocabulary_encodes_and_decodes() {
        let (store, dir) = temp_store("encode");
        let vocab = store.build_and_save("en", CORPUS, 2, 100).unwrap();

        assert_eq!(vocab.len(), 4 + 4);
        assert_eq!(vocab.token_to_id("<pad>"), Some(1));
        assert_eq!(vocab.token_to_id("a"), Some(4));

        let ids = vocab.encode("a dog flies").unwrap();
        assert_eq!(ids.first(), Some(&SpecialToken::Sos.id()));
        assert_eq!(ids.last(), Some(&SpecialToken::Eos.id()));
        assert_eq!(ids[3], SpecialToken::Unk.id());
        assert_eq!(vocab.decode(&ids), "a dog");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reload_gives_same_ids() {
        let (store, dir) = temp_store("reload");
        let built  = store.build_and_save("de", CORPUS, 1, 100).unwrap();
        let loaded = store.load("de").unwrap();

        assert_eq!(built.len(), loaded.len());
        for word in ["a", "dog", "zebra", "."] {
            assert_eq!(built.token_to_id(word), loaded.token_to_id(word));
        }
        fs::remove_dir_all(&dir).ok();
    }
}
