pub mod analyzer;
pub mod cache;
pub mod lexicon;

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

use emmorph_parser::{detailed, tokenize, ConfigError, StemmerConfig};
use emmorph_protocol::{Analysis, StemmerTables};
use thiserror::Error;

pub use crate::analyzer::{Analyzer, AnalyzerError, HfstLookup};
pub use crate::cache::QueryCache;
pub use crate::lexicon::{Exceptions, Lexicon};

#[derive(Debug, Error)]
pub enum EmMorphError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
}

/// Lemmatizer front end: analyzer lines in, `(lemma, tag, detailed)` out.
pub struct EmMorph<A: Analyzer = HfstLookup> {
    analyzer: A,
    tables: StemmerTables,
    lexicon: Lexicon,
    exceptions: Exceptions,
    cache: QueryCache,
}

impl EmMorph<HfstLookup> {
    /// Loads the properties file, starts `hfst_lookup` on `fsa` and sends a
    /// warm-up query.
    pub fn open(
        config: impl AsRef<Path>,
        fsa: impl AsRef<Path>,
        hfst_lookup: impl AsRef<OsStr>,
    ) -> Result<Self, EmMorphError> {
        let config = StemmerConfig::load(config)?;
        let analyzer = HfstLookup::spawn(hfst_lookup, &config.analyzer_params, fsa)?;

        let mut emmorph = Self::with_analyzer(analyzer, config.tables);
        emmorph.query("test")?;
        Ok(emmorph)
    }
}

impl<A: Analyzer> EmMorph<A> {
    /// Punctuation lexicon and built-in exceptions, default cache size.
    pub fn with_analyzer(analyzer: A, tables: StemmerTables) -> Self {
        Self {
            analyzer,
            tables,
            lexicon: Lexicon::punctuation(),
            exceptions: Exceptions::builtin(),
            cache: QueryCache::default(),
        }
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self.cache.clear();
        self
    }

    pub fn with_exceptions(mut self, exceptions: Exceptions) -> Self {
        self.exceptions = exceptions;
        self.cache.clear();
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = QueryCache::with_capacity(capacity);
        self
    }

    pub fn tables(&self) -> &StemmerTables {
        &self.tables
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Every analysis of `word`, in analyzer order followed by lexicon
    /// entries. Rejected analyzer lines are left out.
    pub fn query(&mut self, word: &str) -> Result<Vec<Analysis>, EmMorphError> {
        if let Some(cached) = self.cache.get(word) {
            return Ok(cached.to_vec());
        }

        let mut analyses = Vec::new();
        for line in self.analyzer.lookup(word)? {
            let segments = tokenize(&line);
            match emmorph_stem::resolve(&segments, &self.tables).into_pair() {
                Some((lemma, tag)) => {
                    analyses.push(Analysis::new(lemma, tag, detailed::render(&segments)))
                }
                None => tracing::debug!("rejected analysis {:?} of {:?}", line, word),
            }
        }

        analyses.extend_from_slice(self.lexicon.get(word));
        self.exceptions.remove_from(word, &mut analyses);

        self.cache.insert(word, analyses.clone());
        Ok(analyses)
    }

    /// Distinct analyses with spaces turned into `_`, sorted.
    fn distinct(&mut self, word: &str) -> Result<BTreeSet<Analysis>, EmMorphError> {
        Ok(self.query(word)?.iter().map(Analysis::underscored).collect())
    }

    /// Sorted distinct `(lemma, tag)` pairs.
    pub fn stem(&mut self, word: &str) -> Result<Vec<(String, String)>, EmMorphError> {
        let pairs: BTreeSet<_> = self
            .distinct(word)?
            .into_iter()
            .map(|analysis| (analysis.lemma, analysis.tag))
            .collect();
        Ok(pairs.into_iter().collect())
    }

    /// Sorted distinct detailed analyses.
    pub fn analyze(&mut self, word: &str) -> Result<Vec<String>, EmMorphError> {
        let forms: BTreeSet<_> = self
            .distinct(word)?
            .into_iter()
            .map(|analysis| analysis.detailed)
            .collect();
        Ok(forms.into_iter().collect())
    }

    /// Sorted distinct `(lemma, tag, detailed)` triples.
    pub fn dstem(&mut self, word: &str) -> Result<Vec<Analysis>, EmMorphError> {
        Ok(self.distinct(word)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PROPS: &str = "\
stemmer.STEM=/N;/V;Hyph;Punct
stemmer.COMP_MEMBER=/N
stemmer.COMP_BEFORE_HYPHEN=/N
stemmer.COMP_MUST_HAVE=Hyph
stemmer.INT_PUNCT=Punct
";

    const HAZ: &str = "h:h á:á z:z :[/N] :[Nom]";

    #[derive(Default)]
    struct FakeAnalyzer {
        answers: HashMap<String, Vec<String>>,
        lookups: usize,
    }

    impl FakeAnalyzer {
        fn answer(mut self, word: &str, lines: &[&str]) -> Self {
            self.answers
                .insert(word.to_string(), lines.iter().map(|l| l.to_string()).collect());
            self
        }
    }

    impl Analyzer for FakeAnalyzer {
        fn lookup(&mut self, word: &str) -> Result<Vec<String>, AnalyzerError> {
            self.lookups += 1;
            match word {
                "crash" => Err(AnalyzerError::Terminated {
                    stderr: "fsa not found".to_string(),
                }),
                _ => Ok(self.answers.get(word).cloned().unwrap_or_default()),
            }
        }
    }

    fn emmorph(analyzer: FakeAnalyzer) -> EmMorph<FakeAnalyzer> {
        let config = StemmerConfig::from_props_str(PROPS).unwrap();
        EmMorph::with_analyzer(analyzer, config.tables)
    }

    #[test]
    fn test_stem_is_sorted_and_distinct() {
        let analyzer = FakeAnalyzer::default()
            .answer("alom", &["a:a l:l :o m:m :[/N] a:a :[Poss.3Sg] :[Nom]"])
            .answer("ház", &[HAZ, HAZ]);
        let mut emmorph = emmorph(analyzer);

        assert_eq!(
            emmorph.stem("ház").unwrap(),
            vec![("ház".to_string(), "[/N][Nom]".to_string())]
        );
        assert_eq!(
            emmorph.dstem("alom").unwrap(),
            vec![Analysis::new("alom", "[/N][Poss.3Sg][Nom]", "alom[/N]=alm+a[Poss.3Sg]+[Nom]")]
        );
        assert_eq!(emmorph.analyze("ház").unwrap(), vec!["ház[/N]+[Nom]"]);
    }

    #[test]
    fn test_rejected_lines_are_suppressed() {
        let analyzer = FakeAnalyzer::default().answer(
            "izeg-mozog",
            &[
                "i:i z:z e:e g:g :[/V] :[Prs.NDef.3Sg] -:- :[Hyph] m:m o:o z:z o:o g:g :[/V] :[Pst.NDef.3Sg]",
                "i:i z:z e:e g:g :[/V] :[Prs.NDef.3Sg] -:- :[Hyph] m:m o:o z:z o:o g:g :[/V] :[Prs.NDef.3Sg]",
            ],
        );
        let mut emmorph = emmorph(analyzer);

        assert_eq!(
            emmorph.stem("izeg-mozog").unwrap(),
            vec![("izeg-mozog".to_string(), "[/V][Prs.NDef.3Sg]".to_string())]
        );
    }

    #[test]
    fn test_lexicon_is_merged_and_underscored() {
        let mut lexicon = Lexicon::punctuation();
        lexicon.insert("jó barát", Analysis::new("jó barát", "[/N][Nom]", "jó barát[/N]+[Nom]"));
        let mut emmorph = emmorph(FakeAnalyzer::default()).with_lexicon(lexicon);

        assert_eq!(
            emmorph.stem(".").unwrap(),
            vec![(".".to_string(), "[Punct]".to_string())]
        );
        assert_eq!(
            emmorph.dstem("jó barát").unwrap(),
            vec![Analysis::new("jó_barát", "[/N][Nom]", "jó_barát[/N]+[Nom]")]
        );
        assert!(emmorph.stem("ismeretlen").unwrap().is_empty());
    }

    #[test]
    fn test_exceptions_are_removed() {
        let mut exceptions = Exceptions::new();
        exceptions.insert("ház", Analysis::new("ház", "[/N][Nom]", "ház[/N]+[Nom]"));
        let analyzer = FakeAnalyzer::default().answer("ház", &[HAZ]);
        let mut emmorph = emmorph(analyzer).with_exceptions(exceptions);

        assert!(emmorph.stem("ház").unwrap().is_empty());
    }

    #[test]
    fn test_queries_are_cached() {
        let analyzer = FakeAnalyzer::default().answer("ház", &[HAZ]);
        let mut emmorph = emmorph(analyzer);

        emmorph.stem("ház").unwrap();
        emmorph.analyze("ház").unwrap();
        emmorph.dstem("ház").unwrap();

        assert_eq!(emmorph.analyzer.lookups, 1);
        assert_eq!(emmorph.cache().hits(), 2);
    }

    #[test]
    fn test_analyzer_failure_is_not_cached() {
        let mut emmorph = emmorph(FakeAnalyzer::default());

        assert!(matches!(
            emmorph.stem("crash"),
            Err(EmMorphError::Analyzer(AnalyzerError::Terminated { .. }))
        ));
        assert!(emmorph.stem("crash").is_err());
        assert_eq!(emmorph.analyzer.lookups, 2);
    }

    #[test]
    fn test_open_without_analyzer_binary() {
        let dir = std::env::temp_dir().join("emmorph-hfst-open-test.props");
        std::fs::write(&dir, PROPS).unwrap();

        let result = EmMorph::open(&dir, "hu.hfstol", "/nonexistent/hfst-lookup");
        assert!(matches!(
            result,
            Err(EmMorphError::Analyzer(AnalyzerError::Spawn { .. }))
        ));
    }
}
