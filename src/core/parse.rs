//! # Tool Output Parsers
//!
//! Narrow typed parsers for the textual output of external toolbox
//! commands. Line- and pipe-delimited text is inherently fragile, so every
//! format the crate consumes is parsed here, behind a function returning a
//! typed result, and nowhere else.
//!
//! Formats covered:
//! - shell-style `key=value` summaries (univariate raster statistics,
//!   region settings, vector topology info)
//! - the pipe-delimited distance table of the nearest-distance query
//! - pipe-delimited point dumps of the input layer (`x|y|category`)

use crate::core::point::ObserverPoint;

/// Result type for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors raised by malformed external tool output
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("key '{key}' not found in tool output")]
    MissingKey { key: String },

    #[error("field '{field}' holds '{value}', expected a number")]
    InvalidNumber { field: String, value: String },

    #[error("distance table has {lines} line(s), expected header plus at least one row")]
    TruncatedTable { lines: usize },

    #[error("distance table row '{line}' has no second field")]
    MissingField { line: String },

    #[error("point dump line '{line}' is not x|y|category")]
    MalformedPoint { line: String },
}

/// Look up `key` in shell-style `key=value` output
fn key_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim())
}

/// Extract an integer count for `key` from a `key=value` summary
///
/// Used for the non-null cell count of a univariate raster summary (`n`)
/// and the point count of a vector topology summary (`points`).
pub fn parse_count(text: &str, key: &str) -> ParseResult<u64> {
    let value = key_value(text, key).ok_or_else(|| ParseError::MissingKey {
        key: key.to_string(),
    })?;
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field: key.to_string(),
        value: value.to_string(),
    })
}

/// Extract the north-south resolution from a region summary
///
/// The computational region is assumed to have square cells; only `nsres`
/// is read and its square converts cell counts to area.
pub fn parse_resolution(text: &str) -> ParseResult<f64> {
    let value = key_value(text, "nsres").ok_or_else(|| ParseError::MissingKey {
        key: "nsres".to_string(),
    })?;
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field: "nsres".to_string(),
        value: value.to_string(),
    })
}

/// Extract the minimum distance from a nearest-distance table
///
/// The table is pipe-delimited with a header line; the minimum distance is
/// the second field of the second line:
///
/// ```text
/// from_cat|dist
/// 1|100.5
/// ```
pub fn parse_min_distance(text: &str) -> ParseResult<f64> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(ParseError::TruncatedTable { lines: lines.len() });
    }
    let row = lines[1];
    let field = row
        .split('|')
        .nth(1)
        .ok_or_else(|| ParseError::MissingField {
            line: row.to_string(),
        })?;
    field
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            field: "dist".to_string(),
            value: field.to_string(),
        })
}

/// Parse a pipe-delimited point dump, one `x|y|category` line per point
///
/// Order of lines is preserved; it drives the iteration order of the run.
pub fn parse_points(text: &str) -> ParseResult<Vec<ObserverPoint>> {
    let mut points = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = || ParseError::MalformedPoint {
            line: line.to_string(),
        };
        let mut fields = line.split('|');
        let x: f64 = fields
            .next()
            .and_then(|f| f.trim().parse().ok())
            .ok_or_else(malformed)?;
        let y: f64 = fields
            .next()
            .and_then(|f| f.trim().parse().ok())
            .ok_or_else(malformed)?;
        let category: i64 = fields
            .next()
            .and_then(|f| f.trim().parse().ok())
            .ok_or_else(malformed)?;
        points.push(ObserverPoint::new(category, x, y));
    }
    Ok(points)
}
