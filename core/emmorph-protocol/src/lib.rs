#![no_std] // The resolver core stays usable without an OS

extern crate alloc;

// Enable std if the feature is active (for tests/tools)
#[cfg(any(feature = "std", test))]
extern crate std;

pub mod flags;
pub mod model;
pub mod tables;

// Re-export core types for convenience
pub use flags::MorphFlags;
pub use model::{Analysis, MorphSegment, ResolvedStem};
pub use tables::{ArchiveError, CompiledTables, StemmerTables, ARCHIVE_VERSION};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn sample_tables() -> StemmerTables {
        StemmerTables::new()
            .with_flags("/N", MorphFlags::STEM | MorphFlags::COMP_MEMBER)
            .with_flags("/N", MorphFlags::COMP_BEFORE_HYPHEN)
            .with_flags("Punct", MorphFlags::INT_PUNCT)
            .with_conversion("_Ger", "/N")
            .with_replacement("/Npr", "/N")
            .with_copy_to_surface("#")
    }

    #[test]
    fn test_unknown_category_has_no_flags() {
        let tables = sample_tables();

        assert_eq!(tables.flags("Nom"), MorphFlags::empty());
        assert_eq!(tables.known_flags("Nom"), None);
        assert_eq!(
            tables.flags("/N"),
            MorphFlags::STEM | MorphFlags::COMP_MEMBER | MorphFlags::COMP_BEFORE_HYPHEN
        );
        assert_eq!(tables.conversion("_Ger"), Some("/N"));
        assert_eq!(tables.replacement("/N"), None);
        assert!(tables.copies_to_surface('#'));
        assert!(!tables.copies_to_surface('-'));
    }

    #[test]
    fn test_archive_roundtrip() {
        let original = sample_tables();

        // Serialize
        let bytes = original.to_archive().expect("Failed to archive tables");

        // Deserialize (Simulate loading from disk)
        let loaded = StemmerTables::from_archive(&bytes).expect("Failed to load tables");

        assert_eq!(original, loaded);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_archive_rejects_garbage() {
        let err = StemmerTables::from_archive(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert_eq!(err, ArchiveError::Corrupt);
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn test_rejected_stem_has_no_pair() {
        assert_eq!(ResolvedStem::rejected().into_pair(), None);
        assert_eq!(
            ResolvedStem::new("alom".into(), "[/N]".into()).into_pair(),
            Some(("alom".into(), "[/N]".into()))
        );
    }

    #[test]
    fn test_analysis_underscores_spaces() {
        let analysis = Analysis::new("jó barát", "[/N][Nom]", "jó barát[/N]+[Nom]");
        let flat = analysis.underscored();
        assert_eq!(flat.lemma, "jó_barát");
        assert_eq!(flat.detailed, "jó_barát[/N]+[Nom]");
    }
}
