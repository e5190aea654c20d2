// ============================================================
// Layer 4 — Sentence Preprocessor
// ============================================================
// Normalises one corpus line so that whitespace splitting yields
// the tokens the vocabulary is built from.
//
// Cleaning steps (applied in order):
//   1. Map tabs, non-breaking / zero-width spaces, BOMs and other
//      control characters to a plain space
//   2. Lower-case everything
//   3. Surround ASCII punctuation with spaces so "dog." becomes
//      "dog ." (apostrophes and hyphens inside words stay put)
//   4. Collapse runs of spaces and trim both ends
//
// A corpus line is a single sentence, so newlines are treated
// as ordinary whitespace.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one sentence for whitespace tokenisation.
    pub fn clean(&self, text: &str) -> String {
        let chars: Vec<char> = text
            .chars()
            .map(|c| match c {
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .flat_map(char::to_lowercase)
            .collect();

        // ── Split punctuation off into its own tokens ─────────────────────────
        let mut spaced = String::with_capacity(chars.len() * 2);
        for (i, &c) in chars.iter().enumerate() {
            if c.is_ascii_punctuation() && !is_word_internal(&chars, i) {
                spaced.push(' ');
                spaced.push(c);
                spaced.push(' ');
            } else {
                spaced.push(c);
            }
        }

        // ── Collapse whitespace ───────────────────────────────────────────────
        spaced.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Apostrophes and hyphens between two alphanumerics belong to the word
/// ("don't", "t-shirt").
fn is_word_internal(chars: &[char], i: usize) -> bool {
    let c = chars[i];
    if c != '\'' && c != '-' {
        return false;
    }
    let before = i.checked_sub(1).map(|j| chars[j].is_alphanumeric()).unwrap_or(false);
    let after  = chars.get(i + 1).map(|c| c.is_alphanumeric()).unwrap_or(false);
    before && after
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
