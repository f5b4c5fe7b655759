//! Anchor-grid derivation for the detection head.
//!
//! The head stores its anchors in stride units, shape `[S, A, 2]`. The
//! inference engine wants absolute box sizes, so the grid is rebuilt as
//!
//! ```text
//! grid[s, a, d, 0, 0] = anchors[s, a, d] * strides[s]
//! ```
//!
//! and written under the head's grid key, replacing any buffer persisted
//! there at training time. The two trailing singleton axes make the grid
//! broadcastable against `[.., H, W]` feature maps.

use tracing::{debug, warn};

use crate::collection::TensorCollection;
use crate::error::{Result, WtsError};
use crate::tensor::Tensor;

/// Layer prefix of the detection head in the standard three-scale model.
pub const DEFAULT_DETECT_LAYER: &str = "model.24";

/// Strides of the standard P3/P4/P5 detection scales.
pub const DEFAULT_STRIDES: [f32; 3] = [8.0, 16.0, 32.0];

/// Where the per-scale strides come from.
#[derive(Debug, Clone, PartialEq)]
pub enum StrideSource {
    /// A tensor in the collection, looked up by key
    Tensor(String),
    /// Values supplied directly, one per scale
    Explicit(Vec<f32>),
}

/// Keys and strides identifying one detection head.
///
/// # Examples
///
/// ```
/// use wtsgen::anchor::{DetectHead, StrideSource};
///
/// let head = DetectHead::for_layer("model.33");
/// assert_eq!(head.anchors_key, "model.33.anchors");
/// assert_eq!(head.grid_key, "model.33.anchor_grid");
/// assert_eq!(head.strides, StrideSource::Tensor("model.33.stride".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DetectHead {
    /// Key of the `[S, A, 2]` anchor tensor
    pub anchors_key: String,
    /// Canonical key the derived grid is stored under
    pub grid_key: String,
    /// Per-scale strides
    pub strides: StrideSource,
}

impl DetectHead {
    /// Head whose tensors live under `prefix`, strides read from
    /// `<prefix>.stride`.
    #[must_use]
    pub fn for_layer(prefix: &str) -> Self {
        Self {
            anchors_key: format!("{prefix}.anchors"),
            grid_key: format!("{prefix}.anchor_grid"),
            strides: StrideSource::Tensor(format!("{prefix}.stride")),
        }
    }

    /// Replace the stride source with explicit values
    #[must_use]
    pub fn with_strides(mut self, strides: Vec<f32>) -> Self {
        self.strides = StrideSource::Explicit(strides);
        self
    }

    /// Derive the grid for this head and substitute it into `collection`.
    ///
    /// Returns the placeholder tensor that previously sat at the grid key.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if a source tensor is missing or the shapes
    /// do not broadcast.
    pub fn apply(&self, collection: &mut TensorCollection) -> Result<Option<Tensor>> {
        match &self.strides {
            StrideSource::Tensor(key) => {
                derive_and_substitute(collection, &self.anchors_key, key, &self.grid_key)
            }
            StrideSource::Explicit(values) => derive_and_substitute_with_strides(
                collection,
                &self.anchors_key,
                values,
                &self.grid_key,
            ),
        }
    }
}

impl Default for DetectHead {
    /// `model.24` with the P3/P4/P5 strides. Checkpoints of this family keep
    /// the stride as a module attribute, so it is rarely in the state dict.
    fn default() -> Self {
        Self::for_layer(DEFAULT_DETECT_LAYER).with_strides(DEFAULT_STRIDES.to_vec())
    }
}

/// Compute the anchor grid from an `[S, A, 2]` anchor tensor and `S` strides.
///
/// The result has shape `[S, A, 2, 1, 1]` and is named `target_key`. Values
/// are products in f32 arithmetic; nothing is accumulated across scales or
/// anchors.
///
/// # Errors
///
/// Returns `ShapeMismatch` if the anchors are not `[S, A, 2]`, their buffer
/// does not fill that shape, or `strides.len() != S`.
///
/// # Examples
///
/// ```
/// use wtsgen::anchor::derive_anchor_grid;
/// use wtsgen::Tensor;
///
/// let anchors = Tensor::new("anchors", vec![2, 1, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let grid = derive_anchor_grid(&anchors, &[8.0, 16.0], "anchor_grid").unwrap();
/// assert_eq!(grid.shape, vec![2, 1, 2, 1, 1]);
/// assert_eq!(grid.values, vec![8.0, 16.0, 48.0, 64.0]);
/// ```
pub fn derive_anchor_grid(anchors: &Tensor, strides: &[f32], target_key: &str) -> Result<Tensor> {
    let [scales, per_scale, dims] = match anchors.shape.as_slice() {
        &[s, a, d] => [s, a, d],
        other => {
            return Err(WtsError::shape_mismatch(
                &anchors.name,
                format!("expected [scales, anchors, 2], got {other:?}"),
            ))
        }
    };
    if dims != 2 {
        return Err(WtsError::shape_mismatch(
            &anchors.name,
            format!("last dimension must be 2 (width, height), got {dims}"),
        ));
    }
    if !anchors.is_consistent() {
        return Err(WtsError::shape_mismatch(
            &anchors.name,
            format!(
                "shape {:?} needs {} values, buffer holds {}",
                anchors.shape,
                anchors.numel(),
                anchors.values.len()
            ),
        ));
    }
    if strides.len() != scales {
        return Err(WtsError::shape_mismatch(
            &anchors.name,
            format!(
                "{} stride(s) supplied for {scales} detection scale(s)",
                strides.len()
            ),
        ));
    }

    let per_scale_len = per_scale * dims;
    let values: Vec<f32> = if per_scale_len == 0 {
        Vec::new()
    } else {
        anchors
            .values
            .chunks_exact(per_scale_len)
            .zip(strides)
            .flat_map(|(scale, &stride)| scale.iter().map(move |&v| v * stride))
            .collect()
    };

    Ok(Tensor {
        name: target_key.to_string(),
        shape: vec![scales, per_scale, dims, 1, 1],
        values,
    })
}

/// Derive the anchor grid from two tensors in `collection` and store it
/// under `target_key`.
///
/// Any tensor already at `target_key` is removed and returned; the derived
/// grid is appended at the end. All other tensors keep their order.
///
/// # Errors
///
/// Returns `ShapeMismatch` if either source tensor is missing or the shapes
/// do not broadcast. The collection is untouched on error.
pub fn derive_and_substitute(
    collection: &mut TensorCollection,
    anchor_key: &str,
    stride_key: &str,
    target_key: &str,
) -> Result<Option<Tensor>> {
    let strides = collection
        .get(stride_key)
        .ok_or_else(|| WtsError::shape_mismatch(stride_key, "stride tensor not found"))?;
    strides.check_consistent().map_err(|_| {
        WtsError::shape_mismatch(
            stride_key,
            format!(
                "shape {:?} needs {} values, buffer holds {}",
                strides.shape,
                strides.numel(),
                strides.values.len()
            ),
        )
    })?;
    let strides = strides.values.clone();
    derive_and_substitute_with_strides(collection, anchor_key, &strides, target_key)
}

/// Like [`derive_and_substitute`], with the strides given directly.
///
/// # Errors
///
/// Returns `ShapeMismatch` if the anchor tensor is missing or the shapes do
/// not broadcast. The collection is untouched on error.
pub fn derive_and_substitute_with_strides(
    collection: &mut TensorCollection,
    anchor_key: &str,
    strides: &[f32],
    target_key: &str,
) -> Result<Option<Tensor>> {
    let anchors = collection
        .get(anchor_key)
        .ok_or_else(|| WtsError::shape_mismatch(anchor_key, "anchor tensor not found"))?;
    let grid = derive_anchor_grid(anchors, strides, target_key)?;
    debug!(
        key = target_key,
        shape = ?grid.shape,
        strides = ?strides,
        "derived anchor grid"
    );

    let displaced = collection.upsert(grid);
    if let Some(old) = &displaced {
        warn!(
            key = target_key,
            old_shape = ?old.shape,
            "replaced persisted anchor grid with derived values"
        );
    }
    Ok(displaced)
}

#[cfg(test)]
#[path = "anchor_tests.rs"]
mod tests;
