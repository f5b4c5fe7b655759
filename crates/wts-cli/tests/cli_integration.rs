//! CLI Integration Tests for gen-wts

#![allow(clippy::unwrap_used)] // Tests can use unwrap

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wtsgen::format::read_wts;
use wtsgen::serialization::save_safetensors;
use wtsgen::{Tensor, TensorCollection};

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a gen-wts command
fn gen_wts() -> Command {
    let mut cmd = Command::cargo_bin("gen-wts").expect("Failed to find gen-wts binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Standard-layout checkpoint: a conv layer, the head's anchors and a
/// stale anchor grid persisted at training time.
fn write_checkpoint(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    let tensors = TensorCollection::from_tensors(vec![
        Tensor::new("model.0.conv.weight", vec![2, 1, 1, 1], vec![0.5, -2.0]).unwrap(),
        Tensor::new("model.0.bn.num_batches_tracked", vec![], vec![100.0]).unwrap(),
        Tensor::new(
            "model.24.anchors",
            vec![3, 1, 2],
            vec![1.25, 1.625, 1.875, 3.8125, 3.625, 2.8125],
        )
        .unwrap(),
        Tensor::new("model.24.anchor_grid", vec![3, 1, 1, 1, 1, 2], vec![0.0; 6]).unwrap(),
        Tensor::vector("model.24.m.0.bias", vec![0.125]),
    ])
    .unwrap();
    save_safetensors(&path, &tensors).unwrap();
    path
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    gen_wts()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_version_flag() {
    gen_wts()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::is_match(r"gen-wts \S+ \(\S+\)").unwrap());
}

#[test]
fn test_convert_requires_weights() {
    gen_wts()
        .arg("convert")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--weights"));
}

// ============================================================================
// Convert
// ============================================================================

#[test]
fn test_convert_default_output_path() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "yolov5s.safetensors");
    let expected = dir.path().join("yolov5s.wts");

    gen_wts()
        .args(["convert", "-w"])
        .arg(&weights)
        .assert()
        .success()
        .stdout(predicate::str::contains("is successfully completed"));

    let records = read_wts(&expected).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "model.0.conv.weight",
            "model.0.bn.num_batches_tracked",
            "model.24.anchors",
            "model.24.m.0.bias",
            "model.24.anchor_grid",
        ]
    );
    assert_eq!(
        records[4].values,
        vec![10.0, 13.0, 30.0, 61.0, 116.0, 90.0]
    );
}

#[test]
fn test_convert_file_starts_with_count_line() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");
    let out = dir.path().join("m.wts");

    gen_wts()
        .args(["convert", "-q", "-w"])
        .arg(&weights)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("5\nmodel.0.conv.weight 2  3f000000 c0000000\n"));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_convert_into_directory() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "best.safetensors");
    let out_dir = dir.path().join("engines");
    fs::create_dir(&out_dir).unwrap();

    gen_wts()
        .args(["convert", "-w"])
        .arg(&weights)
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success();

    assert!(out_dir.join("best.wts").is_file());
}

#[test]
fn test_convert_no_anchor_grid_keeps_stored_buffer() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");
    let out = dir.path().join("raw.wts");

    gen_wts()
        .args(["convert", "--no-anchor-grid", "-w"])
        .arg(&weights)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let records = read_wts(&out).unwrap();
    assert_eq!(records[3].name, "model.24.anchor_grid");
    assert_eq!(records[3].values, vec![0.0; 6]);
}

#[test]
fn test_convert_parallel_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");
    let seq = dir.path().join("seq.wts");
    let par = dir.path().join("par.wts");

    gen_wts()
        .args(["convert", "-w"])
        .arg(&weights)
        .arg("-o")
        .arg(&seq)
        .assert()
        .success();
    gen_wts()
        .args(["convert", "--parallel", "-w"])
        .arg(&weights)
        .arg("-o")
        .arg(&par)
        .assert()
        .success();

    assert_eq!(fs::read(seq).unwrap(), fs::read(par).unwrap());
}

#[test]
fn test_convert_missing_input_is_invalid() {
    gen_wts()
        .args(["convert", "-w", "/nonexistent/model.safetensors"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid input file"));
}

#[test]
fn test_convert_directory_input_is_invalid() {
    let dir = TempDir::new().unwrap();
    gen_wts()
        .args(["convert", "-w"])
        .arg(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid input file"));
}

#[test]
fn test_convert_garbage_checkpoint() {
    let dir = TempDir::new().unwrap();
    let weights = dir.path().join("junk.safetensors");
    fs::write(&weights, b"abc").unwrap();

    gen_wts()
        .args(["convert", "-w"])
        .arg(&weights)
        .assert()
        .code(4);
    assert!(!dir.path().join("junk.wts").exists());
}

#[test]
fn test_convert_stride_count_mismatch() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");

    gen_wts()
        .args(["convert", "--strides", "8,16", "-w"])
        .arg(&weights)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("2 stride(s) supplied for 3"));
    assert!(!dir.path().join("m.wts").exists());
}

#[test]
fn test_convert_missing_stride_key() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");

    gen_wts()
        .args(["convert", "--stride-key", "model.24.stride", "-w"])
        .arg(&weights)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("stride tensor not found"));
}

#[test]
fn test_convert_wrong_layer() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");

    gen_wts()
        .args(["convert", "--layer", "model.33", "-w"])
        .arg(&weights)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("model.33.anchors"));
}

#[test]
fn test_strides_conflict_with_stride_key() {
    gen_wts()
        .args([
            "convert",
            "-w",
            "m.safetensors",
            "--strides",
            "8,16,32",
            "--stride-key",
            "model.24.stride",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_verbose_logs_tensors() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");

    gen_wts()
        .args(["convert", "-v", "-w"])
        .arg(&weights)
        .assert()
        .success()
        .stderr(predicate::str::contains("model.24.anchor_grid"));
}

// ============================================================================
// Inspect
// ============================================================================

#[test]
fn test_inspect_text() {
    let dir = TempDir::new().unwrap();
    let wts = dir.path().join("w.wts");
    fs::write(&wts, "2\nconv.weight 2  3f800000 7fc00000\nconv.bias 1  3f000000\n").unwrap();

    gen_wts()
        .arg("inspect")
        .arg(&wts)
        .assert()
        .success()
        .stdout(predicate::str::contains("conv.weight"))
        .stdout(predicate::str::contains("conv.bias"))
        .stdout(predicate::str::contains("NaN: 1"));
}

#[test]
fn test_inspect_json() {
    let dir = TempDir::new().unwrap();
    let wts = dir.path().join("w.wts");
    fs::write(&wts, "2\na 1  3f800000\nb 2  7f800000 00000000\n").unwrap();

    let out = gen_wts()
        .args(["inspect", "--json"])
        .arg(&wts)
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["tensor_count"], 2);
    assert_eq!(json["total_values"], 3);
    assert_eq!(json["tensors"][1]["name"], "b");
    assert_eq!(json["tensors"][1]["inf_count"], 1);
}

#[test]
fn test_inspect_limit() {
    let dir = TempDir::new().unwrap();
    let wts = dir.path().join("w.wts");
    fs::write(&wts, "3\na 0 \nb 0 \nc 0 \n").unwrap();

    gen_wts()
        .args(["inspect", "--limit", "1"])
        .arg(&wts)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 more"));
}

#[test]
fn test_inspect_missing_file() {
    gen_wts()
        .args(["inspect", "/nonexistent/w.wts"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_inspect_malformed_file() {
    let dir = TempDir::new().unwrap();
    let wts = dir.path().join("bad.wts");
    fs::write(&wts, "1\nw 2  3f800000\n").unwrap();

    gen_wts()
        .arg("inspect")
        .arg(&wts)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_convert_then_inspect() {
    let dir = TempDir::new().unwrap();
    let weights = write_checkpoint(dir.path(), "m.safetensors");

    gen_wts()
        .args(["convert", "-q", "-w"])
        .arg(&weights)
        .assert()
        .success();

    gen_wts()
        .arg("inspect")
        .arg(dir.path().join("m.wts"))
        .assert()
        .success()
        .stdout(predicate::str::contains("model.24.anchor_grid"));
}
