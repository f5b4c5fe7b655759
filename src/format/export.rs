//! Checkpoint-to-`.wts` export pipeline.
//!
//! Derive the anchor grid, encode, and publish the file atomically: the
//! output is written to a temporary file next to the destination and only
//! renamed into place once every byte is flushed.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::anchor::DetectHead;
use crate::collection::TensorCollection;
use crate::error::{Result, WtsError};
use crate::format::wts::{encode, encode_parallel, EncodeStats, WTS_EXTENSION};

/// Options for [`export_wts`]
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Detection head whose anchor grid is re-derived; `None` skips it
    pub head: Option<DetectHead>,
    /// Render lines on the rayon pool
    pub parallel: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            head: Some(DetectHead::default()),
            parallel: false,
        }
    }
}

/// Report from an export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the file was published
    pub output: PathBuf,
    /// Tensor lines written
    pub tensor_count: usize,
    /// Values written
    pub element_count: usize,
    /// File size in bytes
    pub bytes_written: usize,
    /// Whether a persisted anchor grid was replaced
    pub replaced_grid: bool,
}

/// Apply `options` to `collection` and write the result to `output`.
///
/// The collection is mutated by the anchor-grid substitution and is the
/// exact set of tensors that was written when this returns `Ok`.
///
/// # Errors
///
/// Any error from derivation or encoding, or `Io` if the temporary file
/// cannot be created or persisted. On error nothing exists at `output`
/// that was not there before.
///
/// # Example
///
/// ```rust,ignore
/// use wtsgen::format::{export_wts, ExportOptions};
/// use wtsgen::serialization::safetensors::load_safetensors;
///
/// let mut checkpoint = load_safetensors("yolov5s.safetensors")?;
/// let report = export_wts(&mut checkpoint.tensors, &ExportOptions::default(), "yolov5s.wts")?;
/// println!("{} tensors", report.tensor_count);
/// ```
pub fn export_wts<P: AsRef<Path>>(
    collection: &mut TensorCollection,
    options: &ExportOptions,
    output: P,
) -> Result<ExportReport> {
    let output = output.as_ref();

    let replaced_grid = match &options.head {
        Some(head) => head.apply(collection)?.is_some(),
        None => false,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(staging);
    let stats: EncodeStats = if options.parallel {
        encode_parallel(collection, &mut writer)?
    } else {
        encode(collection, &mut writer)?
    };
    writer.flush()?;

    let staging = writer
        .into_inner()
        .map_err(|e| WtsError::Io(e.into_error()))?;
    staging.as_file().sync_all()?;
    staging.persist(output).map_err(|e| WtsError::Io(e.error))?;

    info!(
        output = %output.display(),
        tensors = stats.tensor_count,
        elements = stats.element_count,
        bytes = stats.bytes_written,
        "wrote weight file"
    );

    Ok(ExportReport {
        output: output.to_path_buf(),
        tensor_count: stats.tensor_count,
        element_count: stats.element_count,
        bytes_written: stats.bytes_written,
        replaced_grid,
    })
}

/// Resolve the output path for a checkpoint.
///
/// - no output: the checkpoint path with its extension replaced by `.wts`
/// - an existing directory: `<dir>/<checkpoint stem>.wts`
/// - anything else: used as given
#[must_use]
pub fn default_output_path(weights: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        None => weights.with_extension(WTS_EXTENSION),
        Some(dir) if dir.is_dir() => {
            // Append rather than `with_extension` so dotted stems survive
            let mut file_name = weights
                .file_stem()
                .unwrap_or(weights.as_os_str())
                .to_os_string();
            file_name.push(".");
            file_name.push(WTS_EXTENSION);
            dir.join(file_name)
        }
        Some(path) => path.to_path_buf(),
    }
}
