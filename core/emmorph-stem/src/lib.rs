#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod classify;

use alloc::string::String;

use emmorph_protocol::{MorphFlags, MorphSegment, ResolvedStem, StemmerTables};

pub use classify::{classify, Classification, Morpheme};

/// Resolves one analysis into its stem and compact tag.
///
/// Pure with respect to its inputs; the tables are only read. A twin word
/// whose halves carry different inflection comes back rejected.
pub fn resolve(segments: &[MorphSegment], tables: &StemmerTables) -> ResolvedStem {
    classify(segments, tables).resolve(tables)
}

impl Classification {
    /// Runs the passes after classification and assembles the result.
    pub fn resolve(mut self, tables: &StemmerTables) -> ResolvedStem {
        // 1. Certain compound: rescue stems that only count inside compounds
        if self.sure_compound {
            if let Some(n) = self.promote_stems_if_compound(tables) {
                self.stem_code = Some(n);
                self.raise_last_stem(n);
            }
        }

        // 2. Compound decision; a hyphen needs a compound-capable morpheme before it
        let mut compound = (self.compounds > 1 && self.hyphen_pos.is_none())
            || self.must_have_compounds > 0;
        if let Some(hyphen) = self.hyphen_pos.filter(|&h| h > 0) {
            if compound && !self.joins_at_hyphen(hyphen) {
                compound = false;
            }
        }

        // 3. Trailing punctuation never ends up in the stem
        let mut internal_punct = false;
        for morpheme in self.morphemes.iter_mut().rev() {
            if !morpheme.flags.contains(MorphFlags::INT_PUNCT) {
                break;
            }
            internal_punct = true;
            morpheme.is_stem = false;
        }

        if let Some(mut last) = self.last_stem_code {
            while last > 0 && !self.morphemes[last].is_stem {
                last -= 1;
            }
            self.last_stem_code = Some(last);
        }

        // 4. Second chance for STEM_IF_COMP once other evidence made it a compound
        if compound && !self.sure_compound {
            if let Some(n) = self.promote_stems_if_compound(tables) {
                self.raise_last_stem(n);
            }
        }

        // "magán-": a hyphen after an inflected word cannot start a twin word
        let internal_punct_and = match self.hyphen_pos.filter(|&h| h > 0) {
            Some(hyphen) if internal_punct => !self.joins_at_hyphen(hyphen),
            _ => true,
        };

        // 5. A hyphen between two stems belongs to the stem
        for n in 1..self.morphemes.len().saturating_sub(2) {
            let bridged = self.morphemes[n - 1].is_stem && self.morphemes[n + 1].is_stem;
            let morpheme = &mut self.morphemes[n];
            if bridged && (morpheme.surface == classify::HYPHEN || morpheme.is_hyphen()) {
                morpheme.is_stem = true;
            }
        }

        // 6. Assemble
        let stem = match self.hyphen_pos {
            Some(hyphen) if internal_punct_and && !compound => match self.twin_stem(hyphen) {
                Some(stem) => stem,
                None => {
                    tracing::debug!("twin word halves differ, rejecting");
                    return ResolvedStem::rejected();
                }
            },
            _ => self.simple_stem(),
        };

        let tag = self.tag();
        ResolvedStem::new(stem, tag)
    }

    fn raise_last_stem(&mut self, n: usize) {
        if self.last_stem_code.map_or(true, |last| n >= last) {
            self.last_stem_code = Some(n);
        }
    }

    /// Stem of a reduplicated word ("izeg-mozog"). `None` when the non-stem
    /// categories before the hyphen differ from those after it.
    fn twin_stem(&self, hyphen: usize) -> Option<String> {
        let mut half = false;
        let mut half_pos = (1..hyphen)
            .rev()
            .find(|&z| self.morphemes[z].is_stem)
            .or(self.stem_code);

        let mut stem = String::new();
        let mut first_half = String::new();
        let mut second_half = String::new();

        for (n, morpheme) in self.morphemes.iter().enumerate() {
            if morpheme.is_hyphen() {
                half = true;
                half_pos = self.last_stem_code;
            }

            if morpheme.is_stem {
                if half_pos.map_or(false, |h| n < h) && !morpheme.surface.is_empty() {
                    stem.push_str(&morpheme.surface);
                } else {
                    stem.push_str(&morpheme.lexical);
                }
            } else {
                let tags = if half { &mut second_half } else { &mut first_half };
                tags.push_str(&morpheme.category);
                tags.push(' ');
            }
        }

        (first_half == second_half).then_some(stem)
    }

    /// Surfaces of the stems before the last one, then its dictionary form.
    fn simple_stem(&self) -> String {
        let Some(last) = self.last_stem_code else {
            return String::new();
        };

        self.morphemes[..=last]
            .iter()
            .enumerate()
            .filter(|(_, morpheme)| morpheme.is_stem)
            .map(|(n, morpheme)| {
                if n < last {
                    morpheme.surface.as_str()
                } else {
                    morpheme.lexical.as_str()
                }
            })
            .collect()
    }

    /// Prefixes wherever they stand, then every category from the last stem on.
    fn tag(&self) -> String {
        self.morphemes
            .iter()
            .enumerate()
            .filter(|(n, morpheme)| {
                self.last_stem_code.map_or(true, |last| *n >= last) || morpheme.is_prefix
            })
            .map(|(_, morpheme)| format!("[{}]", morpheme.category))
            .collect()
    }
}
