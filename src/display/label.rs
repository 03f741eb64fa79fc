//! Label implementations
//!
//! `MemoryLabel` keeps what it was told (tests, embedding hosts);
//! `WriterLabel` prints one line per update to any `io::Write`.

use crate::display::LabelUpdate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use tracing::warn;

/// A single-line text widget provided by the host
pub trait Label {
    /// Replace the label text
    fn set_text(&mut self, text: &str);

    /// Render a state transition; plain labels only need the text
    fn show(&mut self, update: &LabelUpdate) {
        self.set_text(&update.text);
    }
}

/// Label that remembers every text it has shown
#[derive(Debug, Clone, Default)]
pub struct MemoryLabel {
    history: Vec<String>,
}

impl MemoryLabel {
    /// Current text (empty before the first update)
    pub fn text(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("")
    }

    /// Every text shown, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Label for MemoryLabel {
    fn set_text(&mut self, text: &str) {
        self.history.push(text.to_string());
    }
}

/// Output format for `WriterLabel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// The label text only
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LabelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Label that writes each update as a line
#[derive(Debug)]
pub struct WriterLabel<W: Write> {
    writer: W,
    format: LabelFormat,
}

impl<W: Write> WriterLabel<W> {
    pub fn new(writer: W, format: LabelFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: &str) {
        let result = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush());
        if let Err(e) = result {
            warn!("Failed to write label update: {}", e);
        }
    }
}

impl<W: Write> Label for WriterLabel<W> {
    fn set_text(&mut self, text: &str) {
        self.write_line(text);
    }

    fn show(&mut self, update: &LabelUpdate) {
        match self.format {
            LabelFormat::Text => self.write_line(&update.text),
            LabelFormat::Json => match serde_json::to_string(update) {
                Ok(line) => self.write_line(&line),
                Err(e) => warn!("Failed to serialize label update: {}", e),
            },
        }
    }
}
