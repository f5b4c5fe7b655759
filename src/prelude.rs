//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use wtsgen::prelude::*;
//! ```

pub use crate::anchor::{derive_anchor_grid, derive_and_substitute, DetectHead, StrideSource};
pub use crate::collection::TensorCollection;
pub use crate::error::{Result, WtsError};
pub use crate::format::{encode, export_wts, read_wts, ExportOptions};
pub use crate::serialization::load_safetensors;
pub use crate::tensor::Tensor;
