use alloc::string::String;
use alloc::vec::Vec;

use emmorph_protocol::{MorphFlags, MorphSegment, StemmerTables};

pub(crate) const HYPHEN: &str = "-";

/// A segment together with everything the resolver derived about it.
///
/// Later passes rewrite `category`, `flags` and `is_stem` in place when a
/// derivational morpheme turns out to act as a stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub lexical: String,
    pub surface: String,
    pub category: String,
    pub is_stem: bool,
    pub is_prefix: bool,
    pub is_derivative: bool,
    /// Whether the scan counted this morpheme as a compound member, including
    /// a derivative whose conversion target is one. Later passes read the
    /// counters on `Classification`, not this field; it is kept for callers
    /// inspecting a classification.
    pub is_compound_member: bool,
    pub flags: MorphFlags,
    /// Flags of the conversion target, empty when the category does not convert.
    pub flags_conv: MorphFlags,
}

impl Morpheme {
    pub fn is_hyphen(&self) -> bool {
        self.lexical == HYPHEN
    }

    pub fn is_empty(&self) -> bool {
        self.lexical.is_empty() && self.surface.is_empty()
    }

    /// Rewrites the morpheme as its conversion target.
    ///
    /// A category without a conversion entry keeps its name and only takes
    /// over the converted flags.
    pub(crate) fn convert(&mut self, tables: &StemmerTables) {
        match tables.conversion(&self.category) {
            Some(target) => self.category = String::from(target),
            None => tracing::warn!(
                "no conversion for category {}, keeping it unchanged",
                self.category
            ),
        }
        self.flags = self.flags_conv;
    }
}

/// Result of the left-to-right classification scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub morphemes: Vec<Morpheme>,
    /// Two consecutive compound members were seen.
    pub sure_compound: bool,
    pub compounds: usize,
    pub must_have_compounds: usize,
    /// First stem position.
    pub stem_code: Option<usize>,
    /// Most recent stem position.
    pub last_stem_code: Option<usize>,
    /// Position of the hyphen stem (`-`), if any.
    pub hyphen_pos: Option<usize>,
}

/// Only the part after the last backtick names the category; the prefix is a
/// rule identifier left in by the analyzer.
pub(crate) fn strip_rule_prefix(category: &str) -> &str {
    match category.rfind('`') {
        Some(pos) => &category[pos + 1..],
        None => category,
    }
}

/// Inserts every copy-to-surface character of `lexical` into `surface` at the
/// same character position. Positions past the end append.
pub(crate) fn copy_to_surface(lexical: &str, surface: &str, tables: &StemmerTables) -> String {
    if !lexical.chars().any(|c| tables.copies_to_surface(c)) {
        return String::from(surface);
    }

    let mut chars: Vec<char> = surface.chars().collect();
    for (i, c) in lexical.chars().enumerate() {
        if tables.copies_to_surface(c) {
            chars.insert(i.min(chars.len()), c);
        }
    }
    chars.into_iter().collect()
}

/// First pass: classifies every segment in order and tracks stem and compound
/// positions. Earlier morphemes may be rewritten when a later stem confirms
/// them as converted derivatives.
pub fn classify(segments: &[MorphSegment], tables: &StemmerTables) -> Classification {
    let mut state = Classification {
        morphemes: Vec::with_capacity(segments.len()),
        ..Classification::default()
    };
    let mut prev_last_stem_code: Option<usize> = None;
    let mut look_for_compound = false;
    let mut prev_compound = false;

    for (index, segment) in segments.iter().enumerate() {
        // 1. Flags of the raw category
        let mut category = strip_rule_prefix(&segment.category);
        let mut flags = tables.flags(category);
        let is_stem = flags.contains(MorphFlags::STEM);
        let mut compound_member = flags.contains(MorphFlags::COMP_MEMBER);

        // 2. Derivational conversion
        let conversion = tables.conversion(category);
        let is_derivative = conversion.is_some();
        let flags_conv = conversion.map_or(MorphFlags::empty(), |target| tables.flags(target));

        // 3. Tag replacement; flags follow only if the new tag is configured
        if let Some(replacement) = tables.replacement(category) {
            category = replacement;
            flags = tables.known_flags(category).unwrap_or(flags);
        }
        let is_prefix = flags.contains(MorphFlags::PREFIX);

        if (flags | flags_conv).contains(MorphFlags::COMP_MUST_HAVE) {
            state.must_have_compounds += 1;
        }

        let surface = copy_to_surface(&segment.lexical, &segment.surface, tables);

        // Inside a compound: "WolfGang" => "Wolfgang"
        let lexical = if state.compounds > 1 && state.hyphen_pos.map_or(true, |h| h + 2 != index) {
            segment.lexical.to_lowercase()
        } else {
            segment.lexical.clone()
        };
        let is_hyphen = lexical == HYPHEN;

        // 4. Compound evidence
        state.sure_compound |= prev_compound && compound_member;
        prev_compound = compound_member;
        // A derivative after a stem counts if its conversion is a compound member
        compound_member |= look_for_compound && flags_conv.contains(MorphFlags::COMP_MEMBER);

        state.morphemes.push(Morpheme {
            lexical,
            surface,
            category: String::from(category),
            is_stem,
            is_prefix,
            is_derivative,
            is_compound_member: compound_member,
            flags,
            flags_conv,
        });

        // 5. Stem bookkeeping
        if is_stem {
            if is_hyphen {
                state.hyphen_pos = Some(index);
            }
            state.stem_code.get_or_insert(index);
            state.last_stem_code = Some(index);

            if let Some(prev) = prev_last_stem_code {
                if !is_hyphen {
                    state.promote_derivatives(prev, index, tables);
                }
            }
            prev_last_stem_code = Some(index);
            look_for_compound = true;
        }

        if compound_member {
            state.compounds += 1;
            look_for_compound = false;
        }
    }

    state
}

impl Classification {
    /// A second stem confirms the derivatives between it and the previous
    /// stem: they take their converted category and flags.
    fn promote_derivatives(&mut self, from: usize, to: usize, tables: &StemmerTables) {
        let mut convert = false;
        for morpheme in self.morphemes[from..=to].iter_mut().rev() {
            convert |= morpheme.is_stem;
            if convert && morpheme.is_derivative {
                morpheme.convert(tables);
                morpheme.is_stem |= morpheme.flags.contains(MorphFlags::STEM);
            }
        }
    }

    /// Forces every `STEM_IF_COMP` morpheme into a converted stem.
    ///
    /// Returns the highest promoted position.
    pub(crate) fn promote_stems_if_compound(&mut self, tables: &StemmerTables) -> Option<usize> {
        let mut highest = None;
        for (n, morpheme) in self.morphemes.iter_mut().enumerate() {
            if morpheme.flags.contains(MorphFlags::STEM_IF_COMP) {
                morpheme.is_stem = true;
                morpheme.convert(tables);
                highest = Some(n);
            }
        }
        highest
    }

    /// Whether the morpheme before the hyphen at `hyphen` (> 0) lets the hyphen
    /// join a compound: it must allow it, and must not be an empty inflection
    /// slot that follows a non-stem.
    pub(crate) fn joins_at_hyphen(&self, hyphen: usize) -> bool {
        let before = &self.morphemes[hyphen - 1];
        let detached =
            hyphen > 1 && before.is_empty() && !self.morphemes[hyphen - 2].is_stem;
        before.flags.contains(MorphFlags::COMP_BEFORE_HYPHEN) && !detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_prefix_is_stripped() {
        assert_eq!(strip_rule_prefix("/N"), "/N");
        assert_eq!(strip_rule_prefix("rule63`/N"), "/N");
        assert_eq!(strip_rule_prefix("a`b`Nom"), "Nom");
        assert_eq!(strip_rule_prefix("Nom`"), "");
    }

    #[test]
    fn test_copy_to_surface_inserts_at_lexical_position() {
        let tables = StemmerTables::new().with_copy_to_surface("#|");

        assert_eq!(copy_to_surface("ház#tető", "háztető", &tables), "ház#tető");
        assert_eq!(copy_to_surface("ab|", "ab", &tables), "ab|");
        // Surface shorter than the insertion point: appended
        assert_eq!(copy_to_surface("abcd#", "a", &tables), "a#");
        assert_eq!(copy_to_surface("alma", "almá", &tables), "almá");
    }

    #[test]
    fn test_derivative_counts_as_member_only_after_a_stem() {
        let tables = StemmerTables::new()
            .with_flags("/V", MorphFlags::STEM)
            .with_flags("/Adj", MorphFlags::STEM | MorphFlags::COMP_MEMBER)
            .with_conversion("_ImpfPtcp/Adj", "/Adj");
        let derivative = MorphSegment::new("ó", "_ImpfPtcp/Adj", "ó");

        let alone = classify(&[derivative.clone()], &tables);
        assert!(!alone.morphemes[0].is_compound_member);
        assert_eq!(alone.compounds, 0);

        let after_stem = classify(&[MorphSegment::new("darabol", "/V", "darabol"), derivative], &tables);
        assert!(after_stem.morphemes[1].is_compound_member);
        assert_eq!(after_stem.compounds, 1);
    }
}
