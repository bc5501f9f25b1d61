pub mod config;
pub mod detailed;
pub mod properties;
pub mod tokenizer;

use emmorph_protocol::MorphSegment;

pub use crate::config::{ConfigError, StemmerConfig};
pub use crate::properties::parse_properties;
pub use crate::tokenizer::tokenize;

/// Textual shape of a morphological analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// Analyzer output: `a:a l:l :o m:m :[/N] ...`
    #[default]
    Hfst,
    /// `alom[/N]=alm+a[Poss.3Sg]+[Nom]`
    Detailed,
}

impl InputFormat {
    pub fn tokenize(self, line: &str) -> Vec<MorphSegment> {
        match self {
            InputFormat::Hfst => tokenizer::tokenize(line),
            InputFormat::Detailed => detailed::parse(line),
        }
    }
}
