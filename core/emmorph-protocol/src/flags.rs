#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use bitflags::bitflags;

bitflags! {
    /// Semantic properties a morpheme category can carry.
    ///
    /// A category maps to any combination of these; the names double as the
    /// `stemmer.<NAME>` keys of the properties configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
    pub struct MorphFlags: u8 {
        /// Contributes to the stem (noun, verb, hyphen, ...)
        const STEM = 1;
        const PREFIX = 2;
        /// Can be a constituent of a compound word
        const COMP_MEMBER = 4;
        /// Its presence alone makes the word a compound
        const COMP_MUST_HAVE = 8;
        /// May stand right before the hyphen of a hyphenated compound
        const COMP_BEFORE_HYPHEN = 16;
        /// Promoted to stem once the word is known to be a compound
        const STEM_IF_COMP = 32;
        /// Word-final punctuation that must not end up as the stem
        const INT_PUNCT = 64;
        // Reserved, no rule reads it yet.
        const COMP_DELIM = 128;
    }
}
