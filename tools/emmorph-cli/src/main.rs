use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use emmorph_hfst::EmMorph;
use emmorph_parser::{InputFormat, StemmerConfig};
use emmorph_protocol::{Analysis, StemmerTables};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emmorph", author, version, about = "Stems Hungarian words from emMorph analyses")]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compiles a stemmer properties file to binary tables
    Compile {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Resolves analyzer output lines into stem and tag
    Resolve {
        #[command(flatten)]
        tables: TablesArgs,

        #[arg(long, value_enum, default_value_t = Format::Hfst)]
        format: Format,

        /// One JSON object per line
        #[arg(long)]
        json: bool,

        /// Read lines from FILE instead of stdin
        input: Option<PathBuf>,
    },

    /// Runs hfst-lookup and stems one word per line
    Stem {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Compiled analyzer transducer
        #[arg(short, long, value_name = "FILE")]
        fsa: PathBuf,

        #[arg(long, value_name = "PATH", default_value = "hfst-lookup")]
        hfst_lookup: PathBuf,

        #[arg(long)]
        json: bool,

        input: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TablesArgs {
    /// Stemmer properties file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tables written by `emmorph compile`
    #[arg(short, long, value_name = "FILE")]
    tables: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// `a:a l:l :o m:m :[/N] ...`
    Hfst,
    /// `alom[/N]=alm+a[Poss.3Sg]+[Nom]`
    Detailed,
}

impl From<Format> for InputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Hfst => InputFormat::Hfst,
            Format::Detailed => InputFormat::Detailed,
        }
    }
}

#[derive(Serialize)]
struct WordReport<'a> {
    word: &'a str,
    analyses: Vec<Analysis>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Compile { config, output } => compile(&config, &output),
        Command::Resolve {
            tables,
            format,
            json,
            input,
        } => resolve(&tables, format.into(), json, input.as_deref()),
        Command::Stem {
            config,
            fsa,
            hfst_lookup,
            json,
            input,
        } => stem(&config, &fsa, &hfst_lookup, json, input.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn compile(config: &Path, output: &Path) -> Result<()> {
    let config = StemmerConfig::load(config)?;
    let bytes = config
        .tables
        .to_archive()
        .context("Cannot serialize stemmer tables")?;

    fs::write(output, &bytes).with_context(|| format!("Cannot write {:?}", output))?;
    tracing::info!(
        "wrote {} bytes ({} categories) to {:?}",
        bytes.len(),
        config.tables.len(),
        output
    );
    Ok(())
}

fn load_tables(args: &TablesArgs) -> Result<StemmerTables> {
    match (&args.config, &args.tables) {
        (Some(config), _) => Ok(StemmerConfig::load(config)?.tables),
        (None, Some(tables)) => {
            let bytes = fs::read(tables).with_context(|| format!("Cannot read {:?}", tables))?;
            StemmerTables::from_archive(&bytes)
                .with_context(|| format!("Cannot load compiled tables {:?}", tables))
        }
        (None, None) => anyhow::bail!("either --config or --tables is required"),
    }
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Cannot open {:?}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    Ok(reader)
}

fn resolve(args: &TablesArgs, format: InputFormat, json: bool, input: Option<&Path>) -> Result<()> {
    let tables = load_tables(args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in open_input(input)?.lines() {
        let line = line?;
        let resolved = emmorph_stem::resolve(&format.tokenize(line.trim_end()), &tables);

        if json {
            writeln!(out, "{}", serde_json::to_string(&resolved)?)?;
        } else if resolved.is_rejected() {
            writeln!(out, "<rejected>")?;
        } else {
            writeln!(out, "{}\t{}", resolved.stem, resolved.tag)?;
        }
    }
    Ok(())
}

fn stem(
    config: &Path,
    fsa: &Path,
    hfst_lookup: &Path,
    json: bool,
    input: Option<&Path>,
) -> Result<()> {
    let mut emmorph = EmMorph::open(config, fsa, hfst_lookup)
        .with_context(|| format!("Cannot start the analyzer on {:?}", fsa))?;

    let interactive = input.is_none() && atty::is(atty::Stream::Stdin);
    if interactive {
        eprintln!("Type one word per line, Ctrl+D or empty word to exit");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut reader = open_input(input)?;
    let mut line = String::new();

    loop {
        if interactive {
            eprint!("--> ");
        }
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let word = line.trim();
        if word.is_empty() {
            if interactive {
                break;
            }
            continue;
        }

        let analyses = emmorph.dstem(word)?;
        if json {
            let report = WordReport { word, analyses };
            writeln!(out, "{}", serde_json::to_string(&report)?)?;
        } else {
            write_analyses(&mut out, word, &analyses)?;
        }
        out.flush()?;
    }

    tracing::debug!(
        "query cache: {} hits, {} misses",
        emmorph.cache().hits(),
        emmorph.cache().misses()
    );
    Ok(())
}

/// `word<TAB>detailed<TAB>lemma<TAB>tag` per analysis, a blank line after the word.
fn write_analyses(out: &mut impl Write, word: &str, analyses: &[Analysis]) -> io::Result<()> {
    if analyses.is_empty() {
        writeln!(out, "{}\t<unknown>", word)?;
    }
    for analysis in analyses {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            word, analysis.detailed, analysis.lemma, analysis.tag
        )?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_needs_exactly_one_table_source() {
        assert!(Cli::try_parse_from(["emmorph", "resolve"]).is_err());
        assert!(Cli::try_parse_from(["emmorph", "resolve", "-c", "a.props", "-t", "a.bin"]).is_err());
        assert!(Cli::try_parse_from(["emmorph", "resolve", "-t", "a.bin", "--format", "detailed"]).is_ok());
    }

    #[test]
    fn test_word_output_format() {
        let mut out = Vec::new();
        let analyses = vec![Analysis::new("alma", "[/N][Ins]", "alma[/N]+val[Ins]=vel")];
        write_analyses(&mut out, "almával", &analyses).unwrap();
        write_analyses(&mut out, "xyz", &[]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "almával\talma[/N]+val[Ins]=vel\talma\t[/N][Ins]\n\nxyz\t<unknown>\n\n"
        );
    }

    #[test]
    fn test_compiled_tables_load_like_properties() {
        let dir = std::env::temp_dir();
        let props = dir.join("emmorph-cli-test.props");
        let archive = dir.join("emmorph-cli-test.bin");
        fs::write(&props, "stemmer.STEM=/N;/V\nstemmer.convert=_Ger=/N\n").unwrap();

        compile(&props, &archive).unwrap();

        let from_props = load_tables(&TablesArgs {
            config: Some(props),
            tables: None,
        })
        .unwrap();
        let from_archive = load_tables(&TablesArgs {
            config: None,
            tables: Some(archive),
        })
        .unwrap();
        assert_eq!(from_props, from_archive);
    }
}
