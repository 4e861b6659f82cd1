//! Verse extraction from the raw feed.
//!
//! The feed is a JSON export whose rows carry a five-element array
//! `[id, bookOrdinal, chapter, verse, text]`. Each row becomes a
//! [`RawVerseRecord`], and each record becomes an [`ExtractedVerse`] with its
//! inline `{...}` annotation lifted into `notes` and its 1-based book ordinal
//! converted to a 0-based book index.
//!
//! Any malformed record aborts extraction. Downstream assembly assumes
//! complete coverage, so there is no skip-and-continue mode.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{ExtractedVerse, RawVerseRecord};

/// First brace-delimited span, non-greedy, single line.
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?\}").expect("annotation pattern is valid"));

/// `{"resultset": {"row": [...]}}`, the database export shape.
#[derive(Deserialize)]
struct ResultSet {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct Row {
    field: Value,
}

/// Read and parse the raw feed file at `path`.
pub fn read_feed(path: &Path) -> Result<Vec<RawVerseRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_feed(path, &content)
}

/// Parse feed JSON: either the export envelope or a bare array of rows.
/// `source` is only used for error messages.
pub fn parse_feed(source: &Path, content: &str) -> Result<Vec<RawVerseRecord>> {
    let doc: Value = serde_json::from_str(content).map_err(|e| Error::json(source, e))?;

    feed_fields(source, doc)?
        .iter()
        .enumerate()
        .map(|(i, field)| parse_record(i, field))
        .collect()
}

/// The per-verse `field` arrays, in feed order. A malformed envelope row is
/// reported by its position, like a malformed record.
fn feed_fields(source: &Path, doc: Value) -> Result<Vec<Value>> {
    let mut envelope = match doc {
        Value::Array(rows) => return Ok(rows),
        Value::Object(envelope) => envelope,
        other => {
            let reason = format!(
                "expected an export object or an array of rows, got {}",
                kind_of(&other)
            );
            return Err(invalid_document(source, reason));
        }
    };

    let resultset = envelope
        .remove("resultset")
        .ok_or_else(|| invalid_document(source, "export object has no `resultset`"))?;
    let resultset: ResultSet =
        serde_json::from_value(resultset).map_err(|e| Error::json(source, e))?;

    resultset
        .row
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value::<Row>(row)
                .map(|r| r.field)
                .map_err(|e| Error::ParseRecord {
                    index,
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn invalid_document(source: &Path, reason: impl std::fmt::Display) -> Error {
    Error::json(source, serde::de::Error::custom(reason))
}

fn parse_record(index: usize, field: &Value) -> Result<RawVerseRecord> {
    let malformed = |reason: String| Error::ParseRecord { index, reason };

    let items = field
        .as_array()
        .ok_or_else(|| malformed(format!("expected an array, got {}", kind_of(field))))?;
    if items.len() < 5 {
        return Err(malformed(format!(
            "expected 5 elements, got {}",
            items.len()
        )));
    }

    let book_ordinal = number_at(items, 1, "book ordinal").map_err(&malformed)?;
    if book_ordinal == 0 {
        return Err(malformed("book ordinal must be 1-based".to_string()));
    }
    let chapter = number_at(items, 2, "chapter").map_err(&malformed)?;
    let verse = number_at(items, 3, "verse").map_err(&malformed)?;
    let text = items[4]
        .as_str()
        .ok_or_else(|| malformed(format!("text must be a string, got {}", kind_of(&items[4]))))?;

    Ok(RawVerseRecord {
        book_ordinal,
        chapter,
        verse,
        text: text.to_string(),
    })
}

/// Read a non-negative integer. Integral floats (`3.0`) are accepted since
/// some exporters write every number as a double.
fn number_at(items: &[Value], pos: usize, name: &str) -> std::result::Result<u32, String> {
    let value = &items[pos];
    let n = match value.as_u64() {
        Some(n) => n,
        None => match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 => f as u64,
            _ => return Err(format!("{} must be a non-negative integer, got {}", name, value)),
        },
    };
    u32::try_from(n).map_err(|_| format!("{} {} is too large", name, n))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Split the first `{...}` annotation out of `text`.
///
/// Returns the cleaned text and the notes. Every occurrence of the matched
/// literal is removed; later spans with different content stay in the text.
pub fn split_annotation(text: &str) -> (String, Vec<String>) {
    match ANNOTATION.find(text) {
        Some(m) => {
            let span = m.as_str();
            let note = &span[1..span.len() - 1];
            (text.replace(span, ""), vec![note.to_string()])
        }
        None => (text.to_string(), Vec::new()),
    }
}

/// Normalize a single record.
pub fn extract_verse(record: &RawVerseRecord) -> ExtractedVerse {
    let (text, notes) = split_annotation(&record.text);
    ExtractedVerse {
        // parse_record rejects ordinal 0
        book: record.book_ordinal.saturating_sub(1) as usize,
        chapter: record.chapter,
        verse: record.verse,
        text,
        notes,
    }
}

pub fn extract_verses(records: &[RawVerseRecord]) -> Vec<ExtractedVerse> {
    records.iter().map(extract_verse).collect()
}
