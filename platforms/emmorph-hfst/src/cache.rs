use std::collections::HashMap;

use emmorph_protocol::Analysis;

pub const DEFAULT_CAPACITY: usize = 20_000;

/// Per-word query results. Starts over once `capacity` words are stored.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<String, Vec<Analysis>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl QueryCache {
    /// A capacity of 0 disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, word: &str) -> Option<&[Analysis]> {
        match self.entries.get(word) {
            Some(analyses) => {
                self.hits += 1;
                Some(analyses.as_slice())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, word: impl Into<String>, analyses: Vec<Analysis>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            tracing::debug!("query cache full ({} words), clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(word.into(), analyses);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
