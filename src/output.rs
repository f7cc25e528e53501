//! CI output sinks.
//!
//! GitHub Actions collects step outputs from the file named by
//! `GITHUB_OUTPUT`, one `key=value` per line. The file is shared with other
//! steps, so it is only ever appended to.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append-only destination for `key=value` records.
pub trait OutputSink {
    fn emit(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Writes one `key=value` line per record to any writer.
#[derive(Debug)]
pub struct LineOutput<W: Write> {
    writer: W,
}

impl<W: Write> LineOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for LineOutput<W> {
    fn emit(&mut self, key: &str, value: &str) -> io::Result<()> {
        writeln!(self.writer, "{}={}", key, value)?;
        self.writer.flush()
    }
}

/// The GitHub Actions step output file.
pub type GithubOutput = LineOutput<File>;

impl GithubOutput {
    /// Open `path` for appending, creating it if missing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

/// Stdout, for running outside CI.
pub type StdoutOutput = LineOutput<io::Stdout>;

impl StdoutOutput {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}
