//! `.wts` weight-file encoder.
//!
//! Layout, byte for byte:
//!
//! ```text
//! <tensor count>\n
//! <name> <element count> <space><hex8><space><hex8>...\n    (one per tensor)
//! ```
//!
//! Each tensor line is `"{name} {count} "` followed by one `" {hex}"` token
//! per element, so the first value is preceded by two spaces. Each `hex8` is
//! the big-endian IEEE-754 single-precision pattern as eight lowercase hex
//! digits. There is no version field and no footer; any change here breaks
//! every consumer of the format.

use std::io::Write;

use rayon::prelude::*;
use tracing::debug;

use crate::collection::TensorCollection;
use crate::error::{Result, WtsError};
use crate::tensor::Tensor;

/// Conventional file extension
pub const WTS_EXTENSION: &str = "wts";

/// Hex digits per encoded value
pub const HEX_WIDTH: usize = 8;

/// Summary of one encoding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Tensor lines written
    pub tensor_count: usize,
    /// Values written across all lines
    pub element_count: usize,
    /// Bytes handed to the sink, header included
    pub bytes_written: usize,
}

/// Encode one value as eight lowercase hex digits.
///
/// The `u32` bit pattern printed most-significant digit first is exactly
/// the big-endian byte encoding. NaN payloads and infinities pass through
/// unchanged.
///
/// # Examples
///
/// ```
/// use wtsgen::format::wts::encode_value;
///
/// assert_eq!(encode_value(1.0), "3f800000");
/// assert_eq!(encode_value(-1.0), "bf800000");
/// assert_eq!(encode_value(0.0), "00000000");
/// ```
#[must_use]
pub fn encode_value(value: f32) -> String {
    format!("{:08x}", value.to_bits())
}

/// Check that a name survives whitespace tokenization.
///
/// # Errors
///
/// Returns `InvalidName` if the name is empty or contains whitespace.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(WtsError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Render the complete line for one tensor, trailing newline included.
///
/// # Errors
///
/// Returns `InvalidName` for an unrepresentable name, and
/// `InternalInconsistency` if the buffer does not fill the shape.
pub fn render_line(tensor: &Tensor) -> Result<String> {
    validate_name(&tensor.name)?;
    tensor.check_consistent()?;

    let count = tensor.values.len();
    // name + count + per-value (space + 8 digits) + separator + newline
    let mut line = String::with_capacity(tensor.name.len() + 22 + count * (HEX_WIDTH + 1));
    line.push_str(&tensor.name);
    line.push(' ');
    line.push_str(&count.to_string());
    line.push(' ');
    for &value in &tensor.values {
        line.push(' ');
        line.push_str(&encode_value(value));
    }
    line.push('\n');
    Ok(line)
}

fn header(collection: &TensorCollection) -> String {
    format!("{}\n", collection.len())
}

/// Encode `collection` to `sink`, one tensor at a time.
///
/// Each line is rendered in full before it is written, so a bad tensor
/// never leaves a partial line behind. Lines already written stay written:
/// callers that need an all-or-nothing artifact go through
/// [`export_wts`](crate::format::export_wts).
///
/// # Errors
///
/// `InvalidName`, `InternalInconsistency`, or `Io` from the sink. The
/// first error aborts the pass.
///
/// # Examples
///
/// ```
/// use wtsgen::{format::wts::encode, Tensor, TensorCollection};
///
/// let tensors =
///     TensorCollection::from_tensors(vec![Tensor::vector("w", vec![1.0, -1.0, 0.0])]).unwrap();
/// let mut out = Vec::new();
/// encode(&tensors, &mut out).unwrap();
/// assert_eq!(out, b"1\nw 3  3f800000 bf800000 00000000\n");
/// ```
pub fn encode<W: Write>(collection: &TensorCollection, sink: &mut W) -> Result<EncodeStats> {
    let head = header(collection);
    sink.write_all(head.as_bytes())?;

    let mut stats = EncodeStats {
        bytes_written: head.len(),
        ..EncodeStats::default()
    };
    for tensor in collection {
        let line = render_line(tensor)?;
        sink.write_all(line.as_bytes())?;
        debug!(
            tensor = %tensor.name,
            shape = ?tensor.shape,
            elements = tensor.values.len(),
            "encoded tensor"
        );
        stats.tensor_count += 1;
        stats.element_count += tensor.values.len();
        stats.bytes_written += line.len();
    }
    Ok(stats)
}

/// Encode `collection` to `sink`, rendering lines on the rayon pool.
///
/// Lines are rendered concurrently and written in collection order. Every
/// line is rendered before the first byte reaches the sink, so a
/// validation error leaves the sink untouched. This costs one full copy of
/// the encoded text in memory.
///
/// # Errors
///
/// Same as [`encode`].
pub fn encode_parallel<W: Write>(
    collection: &TensorCollection,
    sink: &mut W,
) -> Result<EncodeStats> {
    let lines: Vec<String> = collection
        .as_slice()
        .par_iter()
        .map(render_line)
        .collect::<Result<_>>()?;

    let head = header(collection);
    sink.write_all(head.as_bytes())?;
    let mut bytes_written = head.len();
    for line in &lines {
        sink.write_all(line.as_bytes())?;
        bytes_written += line.len();
    }
    debug!(tensors = lines.len(), bytes = bytes_written, "encoded collection in parallel");

    Ok(EncodeStats {
        tensor_count: lines.len(),
        element_count: collection.total_elements(),
        bytes_written,
    })
}

#[cfg(test)]
#[path = "wts_tests.rs"]
mod tests;
