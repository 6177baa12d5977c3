//! CSV Row Parsing
//!
//! Turns a raw Discogs CSV export into an ordered sequence of header-keyed
//! rows. Built on the `csv` crate reader with the export-specific policies
//! applied on top:
//!
//! - a UTF-8 byte-order-mark on the first header is stripped
//! - blank header cells get positional `column_{n}` names (1-based)
//! - rows whose every field is blank are dropped
//! - short rows are padded with empty cells, long rows keep their extras
//!   under positional names only if a header exists for them
//!
//! Parsing itself never fails: empty input yields an empty vector and
//! malformed quoting is recovered best-effort (an unterminated quote consumes
//! the rest of the input, per the underlying reader).

use ::csv::ReaderBuilder;
use std::collections::HashMap;

/// One parsed CSV row, keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct CsvRow {
    fields: HashMap<String, String>,
}

impl CsvRow {
    /// Cell value for a header, trimmed. Missing columns yield an empty
    /// string.
    pub fn text(&self, header: &str) -> String {
        self.fields
            .get(header)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Raw cell value, untrimmed.
    pub fn raw(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    #[cfg(test)]
    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Parse CSV text into header-keyed rows.
pub fn parse_rows(text: &str) -> Vec<CsvRow> {
    let input = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut records = reader.records().filter_map(|r| r.ok());

    let headers: Vec<String> = match records.next() {
        Some(first) => first
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let cleaned = raw.trim();
                if cleaned.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    cleaned.to_string()
                }
            })
            .collect(),
        None => return Vec::new(),
    };

    records
        .filter(|record| record.iter().any(|value| !value.trim().is_empty()))
        .map(|record| {
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    (header.clone(), record.get(i).unwrap_or_default().to_string())
                })
                .collect();
            CsvRow { fields }
        })
        .collect()
}
