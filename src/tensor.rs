//! Named f32 tensors.
//!
//! A [`Tensor`] is plain data: a name, a shape and a flat buffer in
//! row-major order (last axis fastest). Fields are public so loaders can
//! build tensors without copying; [`Tensor::new`] is the checked path.

use crate::error::{Result, WtsError};

/// Named, shaped buffer of IEEE-754 single-precision values.
///
/// # Examples
///
/// ```
/// use wtsgen::Tensor;
///
/// let t = Tensor::new("conv.weight", vec![2, 3], vec![0.0; 6]).unwrap();
/// assert_eq!(t.numel(), 6);
/// assert_eq!(t.ndim(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Name, unique within a collection
    pub name: String,
    /// Dimensions; empty for a scalar
    pub shape: Vec<usize>,
    /// Flattened values, last axis fastest
    pub values: Vec<f32>,
}

impl Tensor {
    /// Create a tensor, checking that `values` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns `InternalInconsistency` if `values.len()` differs from the
    /// product of `shape`.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, values: Vec<f32>) -> Result<Self> {
        let tensor = Self {
            name: name.into(),
            shape,
            values,
        };
        tensor.check_consistent()?;
        Ok(tensor)
    }

    /// Create a tensor from double-precision values, narrowing each one
    /// with [`narrow_f64`].
    ///
    /// # Errors
    ///
    /// Same as [`Tensor::new`].
    pub fn from_f64(name: impl Into<String>, shape: Vec<usize>, values: &[f64]) -> Result<Self> {
        Self::new(name, shape, values.iter().copied().map(narrow_f64).collect())
    }

    /// Create a 1-D tensor holding `values`.
    #[must_use]
    pub fn vector(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            shape: vec![values.len()],
            values,
        }
    }

    /// Element count implied by the shape. A scalar (empty shape) has one.
    ///
    /// Saturates at `usize::MAX` for shapes whose product does not fit;
    /// such a shape is never consistent with a real buffer.
    #[must_use]
    pub fn numel(&self) -> usize {
        shape_numel(&self.shape).unwrap_or(usize::MAX)
    }

    /// Number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Whether the buffer length matches the shape
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        shape_numel(&self.shape) == Some(self.values.len())
    }

    /// Fail with `InternalInconsistency` unless the buffer matches the shape.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn check_consistent(&self) -> Result<()> {
        if self.is_consistent() {
            Ok(())
        } else {
            Err(WtsError::InternalInconsistency {
                tensor: self.name.clone(),
                declared: self.numel(),
                actual: self.values.len(),
            })
        }
    }
}

/// Product of `shape`, or `None` if it overflows `usize`.
///
/// A zero dimension makes the product zero regardless of the others.
///
/// # Examples
///
/// ```
/// use wtsgen::tensor::shape_numel;
///
/// assert_eq!(shape_numel(&[2, 3, 4]), Some(24));
/// assert_eq!(shape_numel(&[]), Some(1));
/// assert_eq!(shape_numel(&[usize::MAX, 2]), None);
/// assert_eq!(shape_numel(&[usize::MAX, 2, 0]), Some(0));
/// ```
#[must_use]
pub fn shape_numel(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Narrow a double to single precision.
///
/// Rounds to nearest, ties to even, as `as f32` is defined to do for
/// float-to-float casts. Values beyond the f32 range become infinities, NaN
/// stays NaN, and subnormal results are kept rather than flushed to zero.
/// The weight file carries 32-bit patterns only, so every wider value goes
/// through here before it is encoded.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn narrow_f64(value: f64) -> f32 {
    value as f32
}
