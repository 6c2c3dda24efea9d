// Dataset ingestion. One trait, three stores: a local CSV file, a remote
// CSV export (the published-spreadsheet case), and a JSON array file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

use crate::frame::{Frame, Value};

/// A spreadsheet-like store the dashboard reads one full table from per
/// render cycle. Fetch failures (unreachable host, error status,
/// unreadable file, malformed payload) propagate to the caller; there is
/// no retry policy.
pub trait TabularSource {
    fn fetch(&self) -> Result<Frame>;
}

/// Pick a store from the configured handle: URLs go over HTTP, `.json`
/// files parse as an array of objects, anything else reads as CSV.
pub fn open_source(handle: &str) -> Box<dyn TabularSource> {
    if handle.starts_with("http://") || handle.starts_with("https://") {
        Box::new(RemoteCsvSource::new(handle))
    } else if handle.ends_with(".json") {
        Box::new(JsonFileSource::new(handle))
    } else {
        Box::new(CsvFileSource::new(handle))
    }
}

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TabularSource for CsvFileSource {
    fn fetch(&self) -> Result<Frame> {
        let file = File::open(&self.path)
            .context(format!("Failed to open CSV file '{}'", self.path.display()))?;
        let frame = read_csv(file)
            .context(format!("Failed to parse CSV file '{}'", self.path.display()))?;
        info!(
            "Loaded {} rows from '{}'",
            frame.row_count(),
            self.path.display()
        );
        Ok(frame)
    }
}

pub struct RemoteCsvSource {
    url: String,
}

impl RemoteCsvSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl TabularSource for RemoteCsvSource {
    fn fetch(&self) -> Result<Frame> {
        let response = reqwest::blocking::get(&self.url)
            .context(format!("Failed to fetch spreadsheet from '{}'", self.url))?
            .error_for_status()
            .context(format!("Spreadsheet endpoint '{}' returned an error", self.url))?;
        let body = response
            .text()
            .context("Failed to read spreadsheet response body")?;
        let frame = read_csv(body.as_bytes())
            .context(format!("Failed to parse CSV payload from '{}'", self.url))?;
        info!("Loaded {} rows from '{}'", frame.row_count(), self.url);
        Ok(frame)
    }
}

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TabularSource for JsonFileSource {
    fn fetch(&self) -> Result<Frame> {
        let file = File::open(&self.path)
            .context(format!("Failed to open JSON file '{}'", self.path.display()))?;
        let json: serde_json::Value = serde_json::from_reader(file)
            .context(format!("Failed to parse JSON file '{}'", self.path.display()))?;
        let frame = Frame::from_json(&json)?;
        info!(
            "Loaded {} rows from '{}'",
            frame.row_count(),
            self.path.display()
        );
        Ok(frame)
    }
}

/// Parse CSV into a frame: headers become column names verbatim, cells
/// are typed the way a spreadsheet import types them.
fn read_csv<R: Read>(reader: R) -> Result<Frame> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        rows.push(record.iter().map(Value::infer).collect());
    }

    Frame::new(columns, rows)
}
