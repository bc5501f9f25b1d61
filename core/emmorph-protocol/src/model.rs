use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One `(lexical, category, surface)` triple of an analyzer output line.
///
/// `category` is the bracketed tag without its brackets. It may still carry a
/// backtick-prefixed rule name, which the resolver strips before lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct MorphSegment {
    pub lexical: String,
    pub category: String,
    pub surface: String,
}

impl MorphSegment {
    pub fn new(
        lexical: impl Into<String>,
        category: impl Into<String>,
        surface: impl Into<String>,
    ) -> Self {
        Self {
            lexical: lexical.into(),
            category: category.into(),
            surface: surface.into(),
        }
    }
}

/// Outcome of one resolver call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct ResolvedStem {
    pub stem: String,
    pub tag: String,
    /// Set when the word failed the twin-word check; `stem` and `tag` are empty then.
    pub rejected: bool,
}

impl ResolvedStem {
    pub fn new(stem: String, tag: String) -> Self {
        Self {
            stem,
            tag,
            rejected: false,
        }
    }

    pub fn rejected() -> Self {
        Self {
            rejected: true,
            ..Self::default()
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// `(stem, tag)`, or `None` for a rejected word.
    pub fn into_pair(self) -> Option<(String, String)> {
        if self.rejected {
            None
        } else {
            Some((self.stem, self.tag))
        }
    }
}

/// A finished analysis of one input word: lemma, compact tag and the
/// detailed segment form it was derived from (empty for lexicon entries).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Analysis {
    pub lemma: String,
    pub tag: String,
    pub detailed: String,
}

impl Analysis {
    pub fn new(
        lemma: impl Into<String>,
        tag: impl Into<String>,
        detailed: impl Into<String>,
    ) -> Self {
        Self {
            lemma: lemma.into(),
            tag: tag.into(),
            detailed: detailed.into(),
        }
    }

    /// Copy with spaces replaced by `_`, so a lemma like "jó barát" stays one column.
    pub fn underscored(&self) -> Self {
        Self {
            lemma: self.lemma.replace(' ', "_"),
            tag: self.tag.replace(' ', "_"),
            detailed: self.detailed.replace(' ', "_"),
        }
    }
}
