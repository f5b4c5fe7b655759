//! Convert command implementation
//!
//! Loads a checkpoint, re-derives the detection head's anchor grid and
//! publishes the `.wts` file.

use crate::error::{CliError, Result};
use crate::output;
use std::path::Path;
use wtsgen::anchor::{DetectHead, StrideSource, DEFAULT_STRIDES};
use wtsgen::format::{default_output_path, export_wts, ExportOptions};
use wtsgen::serialization::load_safetensors;

/// Detection-head selection from the command line
#[derive(Debug, Clone)]
pub(crate) struct HeadArgs {
    pub(crate) layer: String,
    pub(crate) strides: Option<Vec<f32>>,
    pub(crate) stride_key: Option<String>,
    pub(crate) disabled: bool,
}

impl HeadArgs {
    /// Resolve to the head to apply, `None` when derivation is disabled
    pub(crate) fn detect_head(&self) -> Option<DetectHead> {
        if self.disabled {
            return None;
        }
        let head = DetectHead::for_layer(&self.layer);
        Some(match (&self.stride_key, &self.strides) {
            (Some(key), _) => DetectHead {
                strides: StrideSource::Tensor(key.clone()),
                ..head
            },
            (None, Some(values)) => head.with_strides(values.clone()),
            (None, None) => head.with_strides(DEFAULT_STRIDES.to_vec()),
        })
    }
}

/// Run the convert command
pub(crate) fn run(
    weights: &Path,
    output: Option<&Path>,
    head: &HeadArgs,
    parallel: bool,
    quiet: bool,
) -> Result<()> {
    if !weights.is_file() {
        return Err(CliError::InvalidInputFile(weights.to_path_buf()));
    }
    let destination = default_output_path(weights, output);

    let mut checkpoint = load_safetensors(weights)?;
    let options = ExportOptions {
        head: head.detect_head(),
        parallel,
    };
    let report = export_wts(&mut checkpoint.tensors, &options, &destination)?;

    if quiet {
        return Ok(());
    }

    output::section("gen-wts convert");
    output::kv("Input", weights.display());
    output::kv("Output", report.output.display());
    output::kv("Tensors", report.tensor_count);
    output::kv("Values", report.element_count);
    output::kv("Size", output::format_size(report.bytes_written as u64));
    match &options.head {
        Some(head) => {
            let shape = checkpoint
                .tensors
                .get(&head.grid_key)
                .map(|t| output::format_shape(&t.shape))
                .unwrap_or_default();
            output::kv("Anchor grid", format!("{} {shape}", head.grid_key));
            if !report.replaced_grid {
                output::warning(&format!(
                    "checkpoint had no {}; derived grid appended",
                    head.grid_key
                ));
            }
        }
        None => output::warning("anchor grid not re-derived; tensors written as stored"),
    }
    println!();
    output::success(&format!(
        "Model {} conversion to wts file {} is successfully completed",
        weights.display(),
        report.output.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> HeadArgs {
        HeadArgs {
            layer: "model.24".to_string(),
            strides: None,
            stride_key: None,
            disabled: false,
        }
    }

    #[test]
    fn test_default_head_uses_standard_strides() {
        assert_eq!(args().detect_head(), Some(DetectHead::default()));
    }

    #[test]
    fn test_explicit_strides() {
        let head = HeadArgs {
            layer: "model.33".to_string(),
            strides: Some(vec![8.0, 16.0, 32.0, 64.0]),
            ..args()
        }
        .detect_head()
        .unwrap();
        assert_eq!(head.anchors_key, "model.33.anchors");
        assert_eq!(
            head.strides,
            StrideSource::Explicit(vec![8.0, 16.0, 32.0, 64.0])
        );
    }

    #[test]
    fn test_stride_key() {
        let head = HeadArgs {
            stride_key: Some("model.24.stride".to_string()),
            ..args()
        }
        .detect_head()
        .unwrap();
        assert_eq!(head.strides, StrideSource::Tensor("model.24.stride".to_string()));
    }

    #[test]
    fn test_disabled() {
        let head = HeadArgs {
            disabled: true,
            ..args()
        };
        assert!(head.detect_head().is_none());
    }
}
