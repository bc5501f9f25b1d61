use std::collections::{HashMap, HashSet};

use emmorph_protocol::Analysis;

const PUNCT_TAG: &str = "[Punct]";

const PUNCTUATION: &[&str] = &[
    ".", ",", ";", ":", "!", "(", ")", "[", "]", "«", "»", "\"", "·", "•", "=", "-", "—", "+", "&",
    "→", "…", "`", "?", "?!", "'", ".........", ".......", "......", ".....", "....", "...", "..",
];

/// Extra analyses appended to whatever the analyzer returns for a word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    entries: HashMap<String, Vec<Analysis>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every punctuation token analyzed as itself with tag `[Punct]`.
    pub fn punctuation() -> Self {
        let mut lexicon = Self::new();
        for &punct in PUNCTUATION {
            lexicon.insert(punct, Analysis::new(punct, PUNCT_TAG, ""));
        }
        lexicon
    }

    pub fn insert(&mut self, word: impl Into<String>, analysis: Analysis) {
        self.entries.entry(word.into()).or_default().push(analysis);
    }

    pub fn get(&self, word: &str) -> &[Analysis] {
        self.entries.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Analyses removed from the result of a word, compared as whole values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exceptions {
    entries: HashMap<String, HashSet<Analysis>>,
}

impl Exceptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A lone `+` is punctuation, never a noun with an empty lemma.
    pub fn builtin() -> Self {
        let mut exceptions = Self::new();
        exceptions.insert("+", Analysis::new("", "[/N][Nom]", "+[/N]+[Nom]"));
        exceptions
    }

    pub fn insert(&mut self, word: impl Into<String>, analysis: Analysis) {
        self.entries.entry(word.into()).or_default().insert(analysis);
    }

    /// Drops every listed analysis of `word` from `analyses`.
    pub fn remove_from(&self, word: &str, analyses: &mut Vec<Analysis>) {
        if let Some(unwanted) = self.entries.get(word) {
            let before = analyses.len();
            analyses.retain(|analysis| !unwanted.contains(analysis));
            if analyses.len() != before {
                tracing::trace!("removed {} exceptional analyses of {:?}", before - analyses.len(), word);
            }
        }
    }
}
