//! Engine-agnostic weight file format (.wts)
//!
//! A flat text format read by inference-compilation toolchains that build
//! their networks layer by layer and look weights up by name:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ <tensor count>\n                                     │
//! ├──────────────────────────────────────────────────────┤
//! │ <name> <n>  <hex8> <hex8> ... <hex8>\n   (× count)   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Values are big-endian IEEE-754 f32 patterns written as lowercase hex,
//! in row-major order. Tensor lines follow the collection's insertion
//! order.
//!
//! # Example
//!
//! ```
//! use wtsgen::format::wts::encode;
//! use wtsgen::format::wts_reader::decode;
//! use wtsgen::{Tensor, TensorCollection};
//!
//! let tensors = TensorCollection::from_tensors(vec![
//!     Tensor::new("conv.weight", vec![1, 2], vec![0.5, -0.25]).unwrap(),
//! ])
//! .unwrap();
//!
//! let mut bytes = Vec::new();
//! encode(&tensors, &mut bytes).unwrap();
//! let records = decode(bytes.as_slice()).unwrap();
//! assert_eq!(records[0].values, vec![0.5, -0.25]);
//! ```

mod export;
pub mod wts;
pub mod wts_reader;

pub use export::{default_output_path, export_wts, ExportOptions, ExportReport};
pub use wts::{encode, encode_parallel, EncodeStats, WTS_EXTENSION};
pub use wts_reader::{decode, read_wts, WtsRecord};
