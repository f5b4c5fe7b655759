//! `SafeTensors` checkpoint loading.
//!
//! Implements the `SafeTensors` format:
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets]
//! [Raw tensor data: little-endian elements]
//! ```
//!
//! Every tensor is converted to f32 on load, integer buffers such as
//! batch-norm `num_batches_tracked` included, so the collection handed to
//! the encoder is uniformly single precision.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::TensorCollection;
use crate::error::{Result, WtsError};
use crate::tensor::Tensor;

/// Element types accepted from a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeTensorsDType {
    /// 64-bit float, narrowed on load
    F64,
    /// 32-bit float
    F32,
    /// 16-bit float (IEEE 754 half-precision)
    F16,
    /// Brain float 16
    BF16,
    /// 64-bit signed integer
    I64,
    /// 32-bit signed integer
    I32,
    /// Unsigned byte
    U8,
    /// One byte, 0 or 1
    Bool,
}

impl SafeTensorsDType {
    /// Parse the dtype string used in the JSON header
    #[must_use]
    pub fn parse(dtype: &str) -> Option<Self> {
        match dtype {
            "F64" => Some(Self::F64),
            "F32" => Some(Self::F32),
            "F16" => Some(Self::F16),
            "BF16" => Some(Self::BF16),
            "I64" => Some(Self::I64),
            "I32" => Some(Self::I32),
            "U8" => Some(Self::U8),
            "BOOL" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Bytes per element
    #[must_use]
    pub fn bytes_per_element(self) -> usize {
        match self {
            Self::F64 | Self::I64 => 8,
            Self::F32 | Self::I32 => 4,
            Self::F16 | Self::BF16 => 2,
            Self::U8 | Self::Bool => 1,
        }
    }
}

/// Metadata for a single tensor in `SafeTensors` format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorMetadata {
    /// Data type of the tensor (e.g., "F32").
    pub dtype: String,
    /// Shape of the tensor.
    pub shape: Vec<usize>,
    /// Data offsets `[start, end]` in the raw data section.
    pub data_offsets: [usize; 2],
}

/// Tensor metadata keyed by name.
pub type SafeTensorsMetadata = BTreeMap<String, TensorMetadata>;

/// User metadata from the `__metadata__` header section.
pub type UserMetadata = BTreeMap<String, String>;

/// A checkpoint loaded into memory.
#[derive(Debug, Clone, Default)]
pub struct LoadedCheckpoint {
    /// Tensors, in the order they are laid out in the data section
    pub tensors: TensorCollection,
    /// String metadata carried in the header
    pub user_metadata: UserMetadata,
}

/// Parse an in-memory `SafeTensors` file.
///
/// Tensors are ordered by their start offset in the data section, which is
/// the order the producer serialized them in; zero-sized tensors sharing an
/// offset fall back to name order.
///
/// # Errors
///
/// `FormatError` for a malformed header or out-of-range data, and
/// `UnsupportedDType` for element types with no f32 conversion.
pub fn parse_safetensors(bytes: &[u8]) -> Result<LoadedCheckpoint> {
    let metadata_len = validate_and_read_header(bytes)?;
    let (metadata, user_metadata) = parse_metadata(bytes, metadata_len)?;
    let data = &bytes[8 + metadata_len..];

    let mut entries: Vec<(&String, &TensorMetadata)> = metadata.iter().collect();
    entries.sort_by(|(a_name, a), (b_name, b)| {
        a.data_offsets[0]
            .cmp(&b.data_offsets[0])
            .then_with(|| a_name.cmp(b_name))
    });

    let mut tensors = TensorCollection::with_capacity(entries.len());
    for (name, meta) in entries {
        let values = decode_tensor(name, meta, data)?;
        debug!(tensor = %name, dtype = %meta.dtype, shape = ?meta.shape, "loaded tensor");
        tensors.push(Tensor::new(name.clone(), meta.shape.clone(), values)?)?;
    }

    Ok(LoadedCheckpoint {
        tensors,
        user_metadata,
    })
}

/// Load a `SafeTensors` checkpoint from disk.
///
/// # Errors
///
/// `Io` if the file cannot be read, otherwise see [`parse_safetensors`].
pub fn load_safetensors<P: AsRef<Path>>(path: P) -> Result<LoadedCheckpoint> {
    let bytes = fs::read(path)?;
    parse_safetensors(&bytes)
}

/// Serialize a collection as F32 `SafeTensors` bytes.
///
/// Data is laid out in collection order, so parsing the bytes back yields
/// the same order.
///
/// # Errors
///
/// `InternalInconsistency` for a tensor whose buffer does not fill its
/// shape, `FormatError` if the header cannot be serialized.
pub fn to_safetensors_bytes(
    collection: &TensorCollection,
    user_metadata: &UserMetadata,
) -> Result<Vec<u8>> {
    let mut header = serde_json::Map::new();
    if !user_metadata.is_empty() {
        let meta_obj: serde_json::Map<String, serde_json::Value> = user_metadata
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        header.insert(
            "__metadata__".to_string(),
            serde_json::Value::Object(meta_obj),
        );
    }

    let mut raw_data = Vec::with_capacity(collection.total_elements() * 4);
    for tensor in collection {
        tensor.check_consistent()?;
        let start = raw_data.len();
        for &value in &tensor.values {
            raw_data.extend_from_slice(&value.to_le_bytes());
        }
        let meta = TensorMetadata {
            dtype: "F32".to_string(),
            shape: tensor.shape.clone(),
            data_offsets: [start, raw_data.len()],
        };
        let meta = serde_json::to_value(meta)
            .map_err(|e| WtsError::format(format!("JSON serialization failed: {e}")))?;
        header.insert(tensor.name.clone(), meta);
    }

    let metadata_json = serde_json::to_string(&header)
        .map_err(|e| WtsError::format(format!("JSON serialization failed: {e}")))?;
    let metadata_bytes = metadata_json.as_bytes();

    let mut output = Vec::with_capacity(8 + metadata_bytes.len() + raw_data.len());
    output.extend_from_slice(&(metadata_bytes.len() as u64).to_le_bytes());
    output.extend_from_slice(metadata_bytes);
    output.extend_from_slice(&raw_data);
    Ok(output)
}

/// Write a collection to `path` as an F32 `SafeTensors` file.
///
/// # Errors
///
/// See [`to_safetensors_bytes`], plus `Io` on write failure.
pub fn save_safetensors<P: AsRef<Path>>(path: P, collection: &TensorCollection) -> Result<()> {
    let bytes = to_safetensors_bytes(collection, &UserMetadata::new())?;
    fs::write(path, bytes)?;
    Ok(())
}

#[path = "safetensors_reader.rs"]
mod safetensors_reader;
use safetensors_reader::{decode_tensor, parse_metadata, validate_and_read_header};

#[cfg(test)]
#[path = "safetensors_tests.rs"]
mod tests;
