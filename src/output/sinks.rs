//! Concrete output sinks

use super::traits::{OutputError, OutputResult, OutputSink, SearchResult};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Appends one JSON object per line to a file
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Opens (or creates) `path` for appending
    pub fn open(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl OutputSink for JsonLinesSink {
    fn output(&self, result: &SearchResult) -> OutputResult<()> {
        let line = serde_json::to_string(result)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| OutputError::Write("results file lock poisoned".to_string()))?;
        writeln!(writer, "{}", line)?;
        // Flush per record so a crash never loses an emitted page
        writer.flush()?;
        Ok(())
    }
}

/// Pretty-prints every result to stdout
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn output(&self, result: &SearchResult) -> OutputResult<()> {
        let pretty = serde_json::to_string_pretty(result)?;
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        writeln!(lock, "{}", pretty)?;
        Ok(())
    }
}

/// Delivers to several sinks in order; the first failure aborts delivery
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn OutputSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink at the end of the chain
    pub fn push(&mut self, sink: Box<dyn OutputSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for MultiSink {
    fn output(&self, result: &SearchResult) -> OutputResult<()> {
        for sink in &self.sinks {
            sink.output(result)?;
        }
        Ok(())
    }
}

/// Keeps results in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<SearchResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything emitted so far
    pub fn results(&self) -> Vec<SearchResult> {
        self.results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }
}

impl OutputSink for MemorySink {
    fn output(&self, result: &SearchResult) -> OutputResult<()> {
        self.results
            .lock()
            .map_err(|_| OutputError::Write("memory sink lock poisoned".to_string()))?
            .push(result.clone());
        Ok(())
    }
}
