//! Insertion-ordered tensor collection.
//!
//! Iteration order is the order tensors were pushed and is what the
//! encoder writes; nothing in this module sorts. Removal keeps the
//! relative order of the remaining tensors.

use std::collections::HashMap;

use crate::error::{Result, WtsError};
use crate::tensor::Tensor;

/// Name-unique, insertion-ordered map of tensors.
///
/// # Examples
///
/// ```
/// use wtsgen::{Tensor, TensorCollection};
///
/// let mut tensors = TensorCollection::new();
/// tensors.push(Tensor::vector("b", vec![1.0])).unwrap();
/// tensors.push(Tensor::vector("a", vec![2.0])).unwrap();
/// assert_eq!(tensors.names().collect::<Vec<_>>(), vec!["b", "a"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TensorCollection {
    tensors: Vec<Tensor>,
    index: HashMap<String, usize>,
}

impl TensorCollection {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection with room for `capacity` tensors
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tensors: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Build a collection from tensors in the given order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTensor` if two tensors share a name.
    pub fn from_tensors(tensors: Vec<Tensor>) -> Result<Self> {
        let mut collection = Self::with_capacity(tensors.len());
        for tensor in tensors {
            collection.push(tensor)?;
        }
        Ok(collection)
    }

    /// Append a tensor.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTensor` if the name is already present.
    pub fn push(&mut self, tensor: Tensor) -> Result<()> {
        if self.index.contains_key(&tensor.name) {
            return Err(WtsError::DuplicateTensor { name: tensor.name });
        }
        self.index.insert(tensor.name.clone(), self.tensors.len());
        self.tensors.push(tensor);
        Ok(())
    }

    /// Remove a tensor by name, keeping the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        let position = self.index.remove(name)?;
        let removed = self.tensors.remove(position);
        for tensor in &self.tensors[position..] {
            if let Some(slot) = self.index.get_mut(&tensor.name) {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Replace whatever sits under `tensor.name` and append the new tensor
    /// at the end. Returns the displaced tensor, if there was one.
    pub fn upsert(&mut self, tensor: Tensor) -> Option<Tensor> {
        let displaced = self.remove(&tensor.name);
        self.index.insert(tensor.name.clone(), self.tensors.len());
        self.tensors.push(tensor);
        displaced
    }

    /// Look up a tensor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.index.get(name).map(|&i| &self.tensors[i])
    }

    /// Whether a tensor with this name is present
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a tensor in iteration order
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Number of tensors
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if the collection holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Tensors in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Tensor> {
        self.tensors.iter()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.iter().map(|t| t.name.as_str())
    }

    /// Tensors as a slice, in insertion order
    #[must_use]
    pub fn as_slice(&self) -> &[Tensor] {
        &self.tensors
    }

    /// Sum of buffer lengths across all tensors
    #[must_use]
    pub fn total_elements(&self) -> usize {
        self.tensors.iter().map(|t| t.values.len()).sum()
    }
}

impl<'a> IntoIterator for &'a TensorCollection {
    type Item = &'a Tensor;
    type IntoIter = std::slice::Iter<'a, Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.iter()
    }
}
