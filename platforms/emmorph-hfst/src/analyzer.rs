use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Cannot start analyzer `{program}`: {inner}")]
    Spawn { program: String, inner: io::Error },

    #[error("Analyzer process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Analyzer terminated: {stderr}")]
    Terminated { stderr: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Source of raw morphological analyses for a word form.
pub trait Analyzer {
    /// Analysis column of every usable output line for `word`.
    fn lookup(&mut self, word: &str) -> Result<Vec<String>, AnalyzerError>;
}

/// Keeps the analysis of a `word<TAB>analysis<TAB>weight` line unless the
/// analyzer marked the word unknown (`+?`).
pub fn analysis_column(line: &str) -> Option<&str> {
    let mut fields = line.trim().split('\t');
    let (_, analysis, _) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || analysis.ends_with("+?") {
        return None;
    }
    Some(analysis)
}

/// Lines of analyzer stderr kept for the `Terminated` report.
const STDERR_TAIL: usize = 32;

/// Reads one line, replacing invalid UTF-8, so a bad byte never leaves the
/// rest of an answer in the pipe.
fn read_lossy_line(reader: &mut impl BufRead, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Drains stderr as it arrives so a chatty analyzer never blocks on a full
/// pipe. Yields the last lines once the process closes it.
fn drain_stderr(stderr: ChildStderr) -> JoinHandle<VecDeque<String>> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        loop {
            match read_lossy_line(&mut reader, &mut buf) {
                Ok(Some(line)) => {
                    let line = line.trim_end().to_string();
                    tracing::debug!("analyzer: {}", line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::debug!("cannot read analyzer stderr: {}", err);
                    break;
                }
            }
        }
        tail
    })
}

/// A long-running `hfst-lookup` process answering one word per line.
pub struct HfstLookup {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<VecDeque<String>>>,
}

impl HfstLookup {
    pub fn spawn<S: AsRef<OsStr>>(
        program: impl AsRef<OsStr>,
        params: &[S],
        fsa: impl AsRef<Path>,
    ) -> Result<Self, AnalyzerError> {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(params)
            .arg(fsa.as_ref())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|inner| AnalyzerError::Spawn {
                program: program.to_string_lossy().into_owned(),
                inner,
            })?;

        let stdin = child.stdin.take().ok_or(AnalyzerError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(AnalyzerError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().map(drain_stderr);

        tracing::debug!("started analyzer {:?} (pid {})", program, child.id());

        Ok(HfstLookup {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr,
        })
    }

    /// Collects the tail of what the process wrote to stderr before it went away.
    fn terminated(&mut self) -> AnalyzerError {
        let tail = match self.stderr.take().map(JoinHandle::join) {
            Some(Ok(tail)) => tail,
            Some(Err(_)) => {
                tracing::debug!("analyzer stderr reader panicked");
                VecDeque::new()
            }
            None => VecDeque::new(),
        };
        let lines: Vec<String> = tail.into_iter().collect();
        AnalyzerError::Terminated {
            stderr: lines.join("\n").trim_end().to_string(),
        }
    }
}

impl Analyzer for HfstLookup {
    fn lookup(&mut self, word: &str) -> Result<Vec<String>, AnalyzerError> {
        // One query per line: a line break would send two and desync the answers
        if word.contains(['\n', '\r']) {
            tracing::debug!("not looking up {:?}: contains a line break", word);
            return Ok(Vec::new());
        }

        let sent = writeln!(self.stdin, "{}", word).and_then(|_| self.stdin.flush());
        match sent {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Err(self.terminated()),
            Err(err) => return Err(err.into()),
        }

        let mut analyses = Vec::new();
        let mut buf = Vec::new();
        loop {
            let line = match read_lossy_line(&mut self.stdout, &mut buf) {
                Ok(Some(line)) => line,
                Ok(None) => return Err(self.terminated()),
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                    return Err(self.terminated())
                }
                Err(err) => return Err(err.into()),
            };
            // A blank line closes the answer
            if line.len() <= 1 {
                break;
            }
            if let Some(analysis) = analysis_column(&line) {
                analyses.push(analysis.to_string());
            }
        }

        Ok(analyses)
    }
}

impl Drop for HfstLookup {
    fn drop(&mut self) {
        if let Err(err) = self.child.kill() {
            tracing::debug!("analyzer already stopped: {}", err);
        }
        if let Err(err) = self.child.wait() {
            tracing::warn!("cannot reap analyzer process: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_column_filters_unknown_words() {
        assert_eq!(
            analysis_column("almával\ta:a l:l m:m a:á :[/N] v:v a:a l:l :[Ins]\t0.000000\n"),
            Some("a:a l:l m:m a:á :[/N] v:v a:a l:l :[Ins]")
        );
        assert_eq!(analysis_column("xyzw\txyzw+?\tinf\n"), None);
        assert_eq!(analysis_column("only\ttwo"), None);
        assert_eq!(analysis_column("a\tb\tc\td"), None);
    }

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let err = HfstLookup::spawn(
            "/nonexistent/hfst-lookup",
            &["-q"],
            "hu.hfstol",
        )
        .err()
        .unwrap();

        assert!(matches!(err, AnalyzerError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_lookup_against_line_protocol() {
        // `sh` stands in for hfst-lookup: one fixed answer per input word
        let script = "while read w; do \
                      printf '%s\\ta:a :[/N]\\t0.0\\n%s\\t%s+?\\tinf\\n\\n' \"$w\" \"$w\" \"$w\"; \
                      done";
        let mut analyzer = HfstLookup::spawn("sh", &["-c", script], "fsa").unwrap();

        assert_eq!(analyzer.lookup("a").unwrap(), vec!["a:a :[/N]"]);
        assert_eq!(analyzer.lookup("b").unwrap(), vec!["a:a :[/N]"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_line_breaks_do_not_desync_answers() {
        let script = "while read w; do printf '%s\\t%s:%s :[/N]\\t0.0\\n\\n' \"$w\" \"$w\" \"$w\"; done";
        let mut analyzer = HfstLookup::spawn("sh", &["-c", script], "fsa").unwrap();

        assert!(analyzer.lookup("a\nb").unwrap().is_empty());
        assert!(analyzer.lookup("a\r").unwrap().is_empty());
        assert_eq!(analyzer.lookup("c").unwrap(), vec!["c:c :[/N]"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_utf8_answer_stays_in_step() {
        let script = "while read w; do printf '%s\\t\\377:%s :[/N]\\t0.0\\n\\n' \"$w\" \"$w\"; done";
        let mut analyzer = HfstLookup::spawn("sh", &["-c", script], "fsa").unwrap();

        assert_eq!(analyzer.lookup("a").unwrap(), vec!["\u{fffd}:a :[/N]"]);
        assert_eq!(analyzer.lookup("b").unwrap(), vec!["\u{fffd}:b :[/N]"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_noisy_stderr_does_not_block_answers() {
        // Far more than a pipe buffer of warnings before the first answer
        let script = "i=0; while [ $i -lt 20000 ]; do echo warning: noise >&2; i=$((i+1)); done; \
                      while read w; do printf '%s\\ta:a :[/N]\\t0.0\\n\\n' \"$w\"; done";
        let mut analyzer = HfstLookup::spawn("sh", &["-c", script], "fsa").unwrap();

        assert_eq!(analyzer.lookup("a").unwrap(), vec!["a:a :[/N]"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_lookup_reports_early_exit() {
        let mut analyzer =
            HfstLookup::spawn("sh", &["-c", "read w; echo gone >&2"], "fsa").unwrap();

        let err = analyzer.lookup("a").unwrap_err();
        match err {
            AnalyzerError::Terminated { stderr } => assert_eq!(stderr, "gone"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
