use half::{bf16, f16};

use super::{SafeTensorsDType, SafeTensorsMetadata, TensorMetadata, UserMetadata};
use crate::error::{Result, WtsError};
use crate::tensor::{narrow_f64, shape_numel};

pub(super) fn validate_and_read_header(bytes: &[u8]) -> Result<usize> {
    if bytes.len() < 8 {
        return Err(WtsError::format(format!(
            "SafeTensors file is {} bytes, need at least 8 bytes for header",
            bytes.len()
        )));
    }

    let mut header_bytes = [0u8; 8];
    header_bytes.copy_from_slice(&bytes[0..8]);
    let metadata_len = usize::try_from(u64::from_le_bytes(header_bytes))
        .map_err(|_| WtsError::format("SafeTensors metadata length does not fit in memory"))?;

    if metadata_len == 0 {
        return Err(WtsError::format("SafeTensors metadata length is 0"));
    }

    if metadata_len > bytes.len() - 8 {
        return Err(WtsError::format(format!(
            "SafeTensors metadata length {metadata_len} exceeds file size"
        )));
    }

    Ok(metadata_len)
}

pub(super) fn parse_metadata(
    bytes: &[u8],
    metadata_len: usize,
) -> Result<(SafeTensorsMetadata, UserMetadata)> {
    let metadata_json = &bytes[8..8 + metadata_len];
    let metadata_str = std::str::from_utf8(metadata_json)
        .map_err(|e| WtsError::format(format!("metadata is not valid UTF-8: {e}")))?;

    let raw_metadata: serde_json::Value = serde_json::from_str(metadata_str)
        .map_err(|e| WtsError::format(format!("metadata JSON parsing failed: {e}")))?;

    let serde_json::Value::Object(map) = raw_metadata else {
        return Err(WtsError::format("metadata header is not a JSON object"));
    };

    let mut metadata = SafeTensorsMetadata::new();
    let mut user_metadata = UserMetadata::new();

    for (key, value) in map {
        if key == "__metadata__" {
            extract_user_metadata(value, &mut user_metadata);
            continue;
        }
        if key.starts_with("__") {
            continue;
        }
        let tensor_meta: TensorMetadata = serde_json::from_value(value)
            .map_err(|e| WtsError::format(format!("bad entry for tensor '{key}': {e}")))?;
        metadata.insert(key, tensor_meta);
    }

    Ok((metadata, user_metadata))
}

/// Extracts string key-value pairs from a `__metadata__` JSON object.
pub(super) fn extract_user_metadata(value: serde_json::Value, user_metadata: &mut UserMetadata) {
    let serde_json::Value::Object(meta_map) = value else {
        return;
    };
    for (mk, mv) in meta_map {
        if let serde_json::Value::String(s) = mv {
            user_metadata.insert(mk, s);
        }
    }
}

/// Decode one tensor's bytes to f32, checking offsets and size first.
pub(super) fn decode_tensor(name: &str, meta: &TensorMetadata, data: &[u8]) -> Result<Vec<f32>> {
    let dtype =
        SafeTensorsDType::parse(&meta.dtype).ok_or_else(|| WtsError::UnsupportedDType {
            tensor: name.to_string(),
            dtype: meta.dtype.clone(),
        })?;

    let [start, end] = meta.data_offsets;
    if start > end || end > data.len() {
        return Err(WtsError::format(format!(
            "tensor '{name}' data offsets [{start}, {end}] outside data section of {} bytes",
            data.len()
        )));
    }

    let expected = shape_numel(&meta.shape)
        .and_then(|numel| numel.checked_mul(dtype.bytes_per_element()))
        .ok_or_else(|| {
            WtsError::format(format!(
                "tensor '{name}' shape {:?} of {} overflows the addressable size",
                meta.shape, meta.dtype
            ))
        })?;
    if end - start != expected {
        return Err(WtsError::format(format!(
            "tensor '{name}' holds {} bytes, shape {:?} of {} needs {expected}",
            end - start,
            meta.shape,
            meta.dtype
        )));
    }

    Ok(convert_to_f32(dtype, &data[start..end]))
}

/// Widen or narrow little-endian elements of `dtype` to f32.
///
/// F64 goes through [`narrow_f64`]; integer casts round to nearest.
#[allow(clippy::cast_precision_loss)]
fn convert_to_f32(dtype: SafeTensorsDType, bytes: &[u8]) -> Vec<f32> {
    match dtype {
        SafeTensorsDType::F32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        SafeTensorsDType::F64 => bytes
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                narrow_f64(f64::from_le_bytes(b))
            })
            .collect(),
        SafeTensorsDType::F16 => bytes
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        SafeTensorsDType::BF16 => bytes
            .chunks_exact(2)
            .map(|c| bf16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        SafeTensorsDType::I64 => bytes
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                i64::from_le_bytes(b) as f32
            })
            .collect(),
        SafeTensorsDType::I32 => bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
            .collect(),
        SafeTensorsDType::U8 | SafeTensorsDType::Bool => bytes.iter().map(|&b| f32::from(b)).collect(),
    }
}
