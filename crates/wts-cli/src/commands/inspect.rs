//! Inspect command implementation
//!
//! Lists the tensor lines of a `.wts` file with element and non-finite
//! counts.

use crate::error::{CliError, Result};
use crate::output;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use wtsgen::format::{read_wts, WtsRecord};

/// Tensor line summary for display/JSON
#[derive(Serialize, Clone)]
struct TensorLine {
    name: String,
    count: usize,
    nan_count: usize,
    inf_count: usize,
}

impl From<&WtsRecord> for TensorLine {
    fn from(record: &WtsRecord) -> Self {
        Self {
            name: record.name.clone(),
            count: record.values.len(),
            nan_count: record.nan_count(),
            inf_count: record.inf_count(),
        }
    }
}

/// Inspect result
#[derive(Serialize)]
struct InspectResult {
    file: String,
    file_size_bytes: u64,
    tensor_count: usize,
    total_values: usize,
    tensors: Vec<TensorLine>,
}

/// Run the inspect command
pub(crate) fn run(path: &Path, limit: usize, json_output: bool) -> Result<()> {
    validate_path(path)?;

    let records = read_wts(path)?;
    let result = InspectResult {
        file: path.display().to_string(),
        file_size_bytes: std::fs::metadata(path)?.len(),
        tensor_count: records.len(),
        total_values: records.iter().map(|r| r.values.len()).sum(),
        tensors: records.iter().take(limit).map(TensorLine::from).collect(),
    };

    if json_output {
        output_json(&result)
    } else {
        output_text(&result);
        Ok(())
    }
}

fn validate_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(CliError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

fn output_json(result: &InspectResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CliError::Conversion(format!("JSON serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}

fn output_text(result: &InspectResult) {
    output::section(&format!("Weights: {}", result.file));
    output::kv("Tensors", result.tensor_count);
    output::kv("Values", result.total_values);
    output::kv("Size", output::format_size(result.file_size_bytes));
    println!();

    let name_width = result
        .tensors
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);
    for tensor in &result.tensors {
        let mut line = format!("  {:<name_width$}  {:>10}", tensor.name, tensor.count);
        if tensor.nan_count > 0 || tensor.inf_count > 0 {
            let flag = format!("NaN: {}  Inf: {}", tensor.nan_count, tensor.inf_count);
            line.push_str(&format!("  {}", flag.red().bold()));
        }
        println!("{line}");
    }

    let hidden = result.tensor_count - result.tensors.len();
    if hidden > 0 {
        println!("  ... {hidden} more (use --limit to show)");
    }

    let non_finite = result
        .tensors
        .iter()
        .filter(|t| t.nan_count > 0 || t.inf_count > 0)
        .count();
    if non_finite > 0 {
        println!();
        output::warning(&format!("{non_finite} tensor(s) contain NaN or Inf values"));
    }
}
