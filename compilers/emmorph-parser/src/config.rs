use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use emmorph_protocol::{MorphFlags, StemmerTables};
use thiserror::Error;

use crate::properties::parse_properties;

const ITEM_SEP: &str = "stemmer.item_sep";
const VALUE_SEP: &str = "stemmer.value_sep";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration `{path:?}`: {inner}")]
    Io { path: PathBuf, inner: io::Error },

    #[error("Separator `{0}` must not be empty")]
    EmptySeparator(&'static str),
}

/// Everything read from a stemmer properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StemmerConfig {
    pub tables: StemmerTables,
    /// Extra analyzer arguments, without the trailing FSA path.
    pub analyzer_params: Vec<String>,
}

impl StemmerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|inner| ConfigError::Io {
            path: path.to_path_buf(),
            inner,
        })?;
        Self::from_props_str(&source)
    }

    pub fn from_props_str(source: &str) -> Result<Self, ConfigError> {
        Self::from_properties(&parse_properties(source))
    }

    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let item_sep = separator(props, ITEM_SEP, ";")?;
        let value_sep = separator(props, VALUE_SEP, "=")?;

        let mut tables = StemmerTables::new();

        for (name, flag) in MorphFlags::all().iter_names() {
            for category in items(value(props, &format!("stemmer.{}", name)), item_sep) {
                tables.add_flags(category, flag);
            }
        }

        for (from, to) in pairs(value(props, "stemmer.convert"), item_sep, value_sep) {
            tables.add_conversion(from, to);
        }
        for (from, to) in pairs(value(props, "stemmer.replace"), item_sep, value_sep) {
            tables.add_replacement(from, to);
        }
        value(props, "stemmer.copy2surface")
            .chars()
            .for_each(|c| tables.add_copy_to_surface(c));

        let mut analyzer_params: Vec<String> = value(props, "analyzer.params")
            .split_whitespace()
            .map(String::from)
            .collect();
        // The last word names the FSA, which is supplied separately
        analyzer_params.pop();

        tracing::debug!(
            "loaded stemmer configuration: {} categories, {} analyzer params",
            tables.len(),
            analyzer_params.len()
        );

        Ok(StemmerConfig {
            tables,
            analyzer_params,
        })
    }
}

fn value<'a>(props: &'a HashMap<String, String>, key: &str) -> &'a str {
    props.get(key).map(String::as_str).unwrap_or("")
}

fn separator<'a>(
    props: &'a HashMap<String, String>,
    key: &'static str,
    default: &'a str,
) -> Result<&'a str, ConfigError> {
    match props.get(key) {
        Some(sep) if sep.is_empty() => Err(ConfigError::EmptySeparator(key)),
        Some(sep) => Ok(sep.as_str()),
        None => Ok(default),
    }
}

fn items<'a>(value: &'a str, item_sep: &'a str) -> impl Iterator<Item = &'a str> {
    value.split(item_sep).filter(|item| !item.is_empty())
}

fn pairs<'a>(
    value: &'a str,
    item_sep: &'a str,
    value_sep: &'a str,
) -> impl Iterator<Item = (&'a str, &'a str)> {
    items(value, item_sep).filter_map(move |item| {
        let pair = item.split_once(value_sep);
        if pair.is_none() {
            tracing::warn!("ignoring mapping {:?} without `{}`", item, value_sep);
        }
        pair
    })
}
