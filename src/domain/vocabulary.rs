// ============================================================
// Layer 3 — Reserved Vocabulary Tokens
// ============================================================
// Every vocabulary, source or target, starts with the same four
// reserved entries at fixed ids. Padding positions carry
// PAD and are excluded from the loss.

/// A reserved vocabulary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialToken {
    Unk,
    Pad,
    Sos,
    Eos,
}

impl SpecialToken {
    /// All reserved tokens in id order.
    pub const ALL: [SpecialToken; 4] = [
        SpecialToken::Unk,
        SpecialToken::Pad,
        SpecialToken::Sos,
        SpecialToken::Eos,
    ];

    pub fn id(self) -> u32 {
        match self {
            SpecialToken::Unk => 0,
            SpecialToken::Pad => 1,
            SpecialToken::Sos => 2,
            SpecialToken::Eos => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpecialToken::Unk => "<unk>",
            SpecialToken::Pad => "<pad>",
            SpecialToken::Sos => "<sos>",
            SpecialToken::Eos => "<eos>",
        }
    }

    /// True for ids that never correspond to a real word.
    pub fn is_reserved(id: u32) -> bool {
        id < Self::ALL.len() as u32
    }
}
