//! wtsgen: detection checkpoints to engine-agnostic `.wts` weight files.
//!
//! Inference-compilation toolchains that rebuild a network layer by layer
//! read their weights from a flat text file keyed by tensor name. This
//! crate loads a checkpoint, replaces the detection head's anchor grid with
//! one derived from the anchors and strides, and writes the result.
//!
//! # Quick Start
//!
//! ```
//! use wtsgen::prelude::*;
//!
//! let mut tensors = TensorCollection::from_tensors(vec![
//!     Tensor::vector("model.0.conv.weight", vec![1.0, -1.0]),
//!     Tensor::new("model.24.anchors", vec![3, 1, 2], vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]).unwrap(),
//! ])
//! .unwrap();
//!
//! DetectHead::default().apply(&mut tensors).unwrap();
//! assert_eq!(tensors.as_slice()[2].name, "model.24.anchor_grid");
//!
//! let mut out = Vec::new();
//! encode(&tensors, &mut out).unwrap();
//! assert!(out.starts_with(b"3\nmodel.0.conv.weight 2  3f800000 bf800000\n"));
//! ```
//!
//! # Modules
//!
//! - [`tensor`]: Named, shaped f32 tensors
//! - [`collection`]: Ordered tensor collection with unique names
//! - [`anchor`]: Anchor grid derivation and substitution
//! - [`format`]: `.wts` encoder, decoder and file export
//! - [`serialization`]: Checkpoint loading (`SafeTensors` format)
//! - [`error`]: Error type shared by every module

pub mod anchor;
pub mod collection;
pub mod error;
pub mod format;
pub mod prelude;
pub mod serialization;
pub mod tensor;

pub use anchor::{DetectHead, StrideSource};
pub use collection::TensorCollection;
pub use error::{Result, WtsError};
pub use tensor::{narrow_f64, Tensor};
