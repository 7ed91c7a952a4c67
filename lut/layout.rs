//! # Matrix Layout Policies
//!
//! Zero-sized marker types that fix, at compile time, which logical dimension of
//! a look-up matrix is the outer (row) dimension in memory.
//!
//! Callers always address a matrix logically as `(dataset, field)`. The policy
//! turns that into a physical `(row, col)`:
//!
//! ```
//! use merged_lut::layout::{DatasetMajor, FieldMajor, LayoutPolicy};
//!
//! assert_eq!(DatasetMajor::physical(2, 5), (2, 5));
//! assert_eq!(FieldMajor::physical(2, 5), (5, 2));
//! ```
//!
//! `DatasetMajor` keeps all fields of one input contiguous, which is what you want
//! when walking every field of a single input. `FieldMajor` keeps all inputs of one
//! field contiguous, which is what you want when walking every input for one field.

use std::fmt::Debug;

/// Marker trait for matrix layouts.
///
/// This trait is sealed: only [`DatasetMajor`] and [`FieldMajor`] exist.
pub trait LayoutPolicy: Copy + Clone + Default + Debug + private::Sealed {
    /// Whether rows correspond to input datasets.
    const IS_DATASET_MAJOR: bool;

    /// Maps a logical `(dataset, field)` address to a physical `(row, col)`.
    fn physical(dataset: usize, field: usize) -> (usize, usize);

    /// Maps logical extents to the physical `(rows, cols)` extents.
    #[inline(always)]
    fn physical_extent(num_datasets: usize, num_fields: usize) -> (usize, usize) {
        Self::physical(num_datasets, num_fields)
    }

    /// Maps a physical `(rows, cols)` extent back to `(datasets, fields)`.
    #[inline(always)]
    fn logical_extent(rows: usize, cols: usize) -> (usize, usize) {
        // Both policies are involutions.
        Self::physical(rows, cols)
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::DatasetMajor {}
    impl Sealed for super::FieldMajor {}
}

/// Rows are input datasets, columns are fields: `lut[dataset][field]`.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct DatasetMajor;

impl LayoutPolicy for DatasetMajor {
    const IS_DATASET_MAJOR: bool = true;

    #[inline(always)]
    fn physical(dataset: usize, field: usize) -> (usize, usize) {
        (dataset, field)
    }
}

/// Rows are fields, columns are input datasets: `lut[field][dataset]`.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct FieldMajor;

impl LayoutPolicy for FieldMajor {
    const IS_DATASET_MAJOR: bool = false;

    #[inline(always)]
    fn physical(dataset: usize, field: usize) -> (usize, usize) {
        (field, dataset)
    }
}
