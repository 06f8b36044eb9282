//! Tensor implementation
//!
//! This module provides the `Tensor` type, a row-major `f32` array with an
//! explicit shape. Attention weights and probability tensors in this crate
//! are at most 3-dimensional and small, so the representation stays a flat
//! `Vec<f32>` with index arithmetic rather than a strided view type.

use std::fmt;

use crate::error::{Result, RevelarError};

/// Row-major N-dimensional `f32` tensor
///
/// # Examples
///
/// ```
/// use revelar::Tensor;
///
/// let t = Tensor::from_vec(vec![2, 3], vec![
///     1.0, 2.0, 3.0,
///     4.0, 5.0, 6.0,
/// ]).unwrap();
///
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.ndim(), 2);
/// assert_eq!(t.size(), 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// Flattened data in row-major order
    data: Vec<f32>,
    /// Shape of the tensor
    shape: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor from a flat vector and shape
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the shape is empty, contains a zero
    /// dimension, or its product does not equal `data.len()`.
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        if shape.is_empty() {
            return Err(RevelarError::ShapeMismatch {
                reason: "shape cannot be empty".to_string(),
            });
        }

        if shape.contains(&0) {
            return Err(RevelarError::ShapeMismatch {
                reason: format!("shape {shape:?} contains a zero dimension"),
            });
        }

        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(RevelarError::ShapeMismatch {
                reason: format!(
                    "data length {} does not match shape {:?} (expected {})",
                    data.len(),
                    shape,
                    expected
                ),
            });
        }

        Ok(Self { data, shape })
    }

    /// Build a 2-D tensor from nested rows, as parsed from a JSON matrix
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if `rows` is empty or ragged.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let num_rows = rows.len();
        if num_rows == 0 {
            return Err(RevelarError::ShapeMismatch {
                reason: "matrix has no rows".to_string(),
            });
        }

        let num_cols = rows[0].len();
        let mut data = Vec::with_capacity(num_rows * num_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != num_cols {
                return Err(RevelarError::ShapeMismatch {
                    reason: format!(
                        "row {} has {} columns, expected {}",
                        i,
                        row.len(),
                        num_cols
                    ),
                });
            }
            data.extend_from_slice(row);
        }

        Self::from_vec(vec![num_rows, num_cols], data)
    }

    /// Get the shape of the tensor
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to the underlying data
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Whether every element is finite (no NaN or infinity)
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Convert a 2-D tensor back to nested rows for document emission
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the tensor is not 2-dimensional.
    pub fn to_rows(&self) -> Result<Vec<Vec<f32>>> {
        if self.ndim() != 2 {
            return Err(RevelarError::ShapeMismatch {
                reason: format!("expected a 2-D tensor, got shape {:?}", self.shape),
            });
        }

        let cols = self.shape[1];
        Ok(self.data.chunks(cols).map(<[f32]>::to_vec).collect())
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={:?}, len={})", self.shape, self.data.len())
    }
}
