//! Checkpoint serialization
//!
//! The converter's input boundary. Checkpoints arrive as `SafeTensors`
//! files and leave this module as a [`TensorCollection`](crate::TensorCollection)
//! of f32 tensors:
//!
//! ```text
//! [8-byte header: u64 metadata length (little-endian)]
//! [JSON metadata: tensor names, dtypes, shapes, data_offsets]
//! [Raw tensor data]
//! ```
//!
//! Example:
//! ```rust
//! use wtsgen::serialization::safetensors::{parse_safetensors, to_safetensors_bytes, UserMetadata};
//! use wtsgen::{Tensor, TensorCollection};
//!
//! let tensors = TensorCollection::from_tensors(vec![
//!     Tensor::vector("model.0.conv.weight", vec![0.5, 0.25]),
//! ])
//! .unwrap();
//! let bytes = to_safetensors_bytes(&tensors, &UserMetadata::new()).unwrap();
//!
//! let loaded = parse_safetensors(&bytes).unwrap();
//! assert_eq!(loaded.tensors.get("model.0.conv.weight").unwrap().values, vec![0.5, 0.25]);
//! ```

pub mod safetensors;

pub use safetensors::{load_safetensors, parse_safetensors, save_safetensors, LoadedCheckpoint};
