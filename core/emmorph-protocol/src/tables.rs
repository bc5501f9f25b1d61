use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use rkyv::{Archive, Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::flags::MorphFlags;

/// Bumped whenever the layout of [`CompiledTables`] changes.
pub const ARCHIVE_VERSION: u32 = 1;

/// The four read-only lookup tables driving the resolver.
///
/// Built once (from a properties file or a compiled archive) and shared by
/// reference across any number of resolver calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct StemmerTables {
    flags: BTreeMap<String, MorphFlags>,
    conversions: BTreeMap<String, String>,
    replacements: BTreeMap<String, String>,
    copy_to_surface: BTreeSet<char>,
}

impl StemmerTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `flags` to whatever `category` already carries.
    pub fn add_flags(&mut self, category: impl Into<String>, flags: MorphFlags) {
        *self.flags.entry(category.into()).or_insert(MorphFlags::empty()) |= flags;
    }

    pub fn add_conversion(&mut self, category: impl Into<String>, target: impl Into<String>) {
        self.conversions.insert(category.into(), target.into());
    }

    pub fn add_replacement(&mut self, category: impl Into<String>, target: impl Into<String>) {
        self.replacements.insert(category.into(), target.into());
    }

    pub fn add_copy_to_surface(&mut self, c: char) {
        self.copy_to_surface.insert(c);
    }

    pub fn with_flags(mut self, category: &str, flags: MorphFlags) -> Self {
        self.add_flags(category, flags);
        self
    }

    pub fn with_conversion(mut self, category: &str, target: &str) -> Self {
        self.add_conversion(category, target);
        self
    }

    pub fn with_replacement(mut self, category: &str, target: &str) -> Self {
        self.add_replacement(category, target);
        self
    }

    pub fn with_copy_to_surface(mut self, chars: &str) -> Self {
        chars.chars().for_each(|c| self.add_copy_to_surface(c));
        self
    }

    /// Flags of `category`; categories missing from the table carry none.
    pub fn flags(&self, category: &str) -> MorphFlags {
        self.known_flags(category).unwrap_or(MorphFlags::empty())
    }

    /// Flags of `category` only if the table lists it.
    pub fn known_flags(&self, category: &str) -> Option<MorphFlags> {
        self.flags.get(category).copied()
    }

    /// Derivational conversion target of `category`.
    pub fn conversion(&self, category: &str) -> Option<&str> {
        self.conversions.get(category).map(String::as_str)
    }

    /// Tag that replaces `category` before its flags are read.
    pub fn replacement(&self, category: &str) -> Option<&str> {
        self.replacements.get(category).map(String::as_str)
    }

    pub fn copies_to_surface(&self, c: char) -> bool {
        self.copy_to_surface.contains(&c)
    }

    /// Number of categories with a flag entry.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
            && self.conversions.is_empty()
            && self.replacements.is_empty()
            && self.copy_to_surface.is_empty()
    }

    /// Serializes the tables into a validated rkyv archive.
    pub fn to_archive(&self) -> Result<Vec<u8>, ArchiveError> {
        let compiled = CompiledTables::from(self);
        let bytes = rkyv::to_bytes::<_, 1024>(&compiled).map_err(|_| ArchiveError::Serialize)?;
        Ok(bytes.to_vec())
    }

    /// Loads tables written by [`StemmerTables::to_archive`].
    pub fn from_archive(bytes: &[u8]) -> Result<Self, ArchiveError> {
        // Archives read from disk are not guaranteed to be aligned
        let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);

        let compiled: CompiledTables =
            rkyv::from_bytes(&aligned).map_err(|_| ArchiveError::Corrupt)?;
        if compiled.version != ARCHIVE_VERSION {
            return Err(ArchiveError::Version(compiled.version));
        }
        Ok(compiled.into())
    }
}

/// Flags of one category, as stored in the archive.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct FlagEntry {
    pub category: String,
    pub bits: u8,
}

/// One `category -> category` mapping, as stored in the archive.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct CategoryMapping {
    pub from: String,
    pub to: String,
}

/// Flat, archivable form of [`StemmerTables`].
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[archive(check_bytes)]
pub struct CompiledTables {
    pub version: u32,
    pub flags: Vec<FlagEntry>,
    pub conversions: Vec<CategoryMapping>,
    pub replacements: Vec<CategoryMapping>,
    pub copy_to_surface: String,
}

fn mappings(map: &BTreeMap<String, String>) -> Vec<CategoryMapping> {
    map.iter()
        .map(|(from, to)| CategoryMapping {
            from: from.clone(),
            to: to.clone(),
        })
        .collect()
}

impl From<&StemmerTables> for CompiledTables {
    fn from(tables: &StemmerTables) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            flags: tables
                .flags
                .iter()
                .map(|(category, flags)| FlagEntry {
                    category: category.clone(),
                    bits: flags.bits(),
                })
                .collect(),
            conversions: mappings(&tables.conversions),
            replacements: mappings(&tables.replacements),
            copy_to_surface: tables.copy_to_surface.iter().collect(),
        }
    }
}

impl From<CompiledTables> for StemmerTables {
    fn from(compiled: CompiledTables) -> Self {
        Self {
            flags: compiled
                .flags
                .into_iter()
                .map(|entry| (entry.category, MorphFlags::from_bits_truncate(entry.bits)))
                .collect(),
            conversions: compiled
                .conversions
                .into_iter()
                .map(|m| (m.from, m.to))
                .collect(),
            replacements: compiled
                .replacements
                .into_iter()
                .map(|m| (m.from, m.to))
                .collect(),
            copy_to_surface: compiled.copy_to_surface.chars().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    Serialize,
    Corrupt,
    Version(u32),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Serialize => write!(f, "Failed to serialize stemmer tables"),
            ArchiveError::Corrupt => write!(f, "Stemmer table archive is corrupt"),
            ArchiveError::Version(found) => write!(
                f,
                "Stemmer table archive version {} (expected {})",
                found, ARCHIVE_VERSION
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ArchiveError {}
