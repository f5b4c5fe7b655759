//! `.wts` decoder.
//!
//! Strict inverse of [`wts`](super::wts): anything the encoder would not
//! have produced is rejected with a line number, rather than guessed at.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, WtsError};
use crate::format::wts::HEX_WIDTH;

/// One tensor line read back from a `.wts` file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WtsRecord {
    /// Tensor name
    pub name: String,
    /// Decoded values, in file order
    pub values: Vec<f32>,
}

impl WtsRecord {
    /// Number of NaN values
    #[must_use]
    pub fn nan_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Number of infinite values
    #[must_use]
    pub fn inf_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_infinite()).count()
    }
}

/// Decode one hex token into a value.
///
/// # Errors
///
/// Returns `FormatError` unless the token is exactly eight hex digits.
pub fn decode_value(token: &str) -> Result<f32> {
    if token.len() != HEX_WIDTH || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(WtsError::format(format!(
            "expected {HEX_WIDTH} hex digits, got {token:?}"
        )));
    }
    let bits = u32::from_str_radix(token, 16)
        .map_err(|e| WtsError::format(format!("bad hex token {token:?}: {e}")))?;
    Ok(f32::from_bits(bits))
}

fn parse_count(field: &str, line_no: usize, what: &str) -> Result<usize> {
    field
        .parse()
        .map_err(|_| WtsError::format(format!("line {line_no}: invalid {what} {field:?}")))
}

fn parse_line(line: &str, line_no: usize) -> Result<WtsRecord> {
    let mut tokens = line.split_ascii_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| WtsError::format(format!("line {line_no}: empty tensor line")))?;
    let count_field = tokens
        .next()
        .ok_or_else(|| WtsError::format(format!("line {line_no}: missing element count")))?;
    let count = parse_count(count_field, line_no, "element count")?;

    let values = tokens
        .map(|token| {
            decode_value(token).map_err(|e| WtsError::format(format!("line {line_no}: {e}")))
        })
        .collect::<Result<Vec<f32>>>()?;

    if values.len() != count {
        return Err(WtsError::format(format!(
            "line {line_no}: tensor '{name}' declares {count} values, found {}",
            values.len()
        )));
    }
    Ok(WtsRecord {
        name: name.to_string(),
        values,
    })
}

/// Decode a `.wts` stream into its records, in file order.
///
/// # Errors
///
/// `Io` from the reader, or `FormatError` if the header count, a declared
/// element count, or a hex token does not check out.
///
/// # Examples
///
/// ```
/// use wtsgen::format::wts_reader::decode;
///
/// let records = decode(&b"1\nw 3  3f800000 bf800000 00000000\n"[..]).unwrap();
/// assert_eq!(records[0].name, "w");
/// assert_eq!(records[0].values, vec![1.0, -1.0, 0.0]);
/// ```
pub fn decode<R: BufRead>(reader: R) -> Result<Vec<WtsRecord>> {
    let mut lines = reader.lines();
    let header = lines
        .next()
        .ok_or_else(|| WtsError::format("empty file, expected tensor count"))??;
    let expected = parse_count(header.trim(), 1, "tensor count")?;

    let mut records = Vec::with_capacity(expected);
    for (i, line) in lines.enumerate() {
        let line = line?;
        let line_no = i + 2;
        if records.len() == expected {
            return Err(WtsError::format(format!(
                "line {line_no}: content after the {expected} declared tensor(s)"
            )));
        }
        records.push(parse_line(&line, line_no)?);
    }

    if records.len() != expected {
        return Err(WtsError::format(format!(
            "header declares {expected} tensor(s), file contains {}",
            records.len()
        )));
    }
    Ok(records)
}

/// Decode the `.wts` file at `path`.
///
/// # Errors
///
/// See [`decode`].
pub fn read_wts<P: AsRef<Path>>(path: P) -> Result<Vec<WtsRecord>> {
    let file = File::open(path)?;
    decode(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_value() {
        assert_eq!(decode_value("3f800000").unwrap(), 1.0);
        assert_eq!(decode_value("BF800000").unwrap(), -1.0);
        assert!(decode_value("7fc00000").unwrap().is_nan());
        assert!(decode_value("3f80000").is_err());
        assert!(decode_value("3f8000000").is_err());
        assert!(decode_value("+f800000").is_err());
        assert!(decode_value("zzzzzzzz").is_err());
    }

    #[test]
    fn test_decode_multiple_records() {
        let text = "2\na 1  3f800000\nb 2  40000000 40400000\n";
        let records = decode(text.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "b");
        assert_eq!(records[1].values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_decode_count_mismatch() {
        let err = decode(&b"1\nw 3  3f800000 bf800000\n"[..]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 2"));
        assert!(msg.contains("declares 3 values, found 2"));
    }

    #[test]
    fn test_decode_too_few_lines() {
        let err = decode(&b"2\nw 1  3f800000\n"[..]).unwrap_err();
        assert!(err.to_string().contains("declares 2 tensor(s), file contains 1"));
    }

    #[test]
    fn test_decode_trailing_content() {
        let err = decode(&b"1\nw 1  3f800000\n\n"[..]).unwrap_err();
        assert!(err.to_string().contains("content after"));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(
            decode(&b""[..]).unwrap_err(),
            WtsError::FormatError { .. }
        ));
    }

    #[test]
    fn test_decode_bad_header() {
        assert!(decode(&b"two\n"[..]).unwrap_err().to_string().contains("tensor count"));
    }

    #[test]
    fn test_record_special_value_counts() {
        let record = WtsRecord {
            name: "x".to_string(),
            values: vec![f32::NAN, f32::INFINITY, 1.0, f32::NEG_INFINITY, f32::NAN],
        };
        assert_eq!(record.nan_count(), 2);
        assert_eq!(record.inf_count(), 2);
    }
}
