// ========================================================================================
//                          The bidirectional index look-up table
// ========================================================================================
//
// LUT = look-up table, to avoid confusion with the map types.
//
// A table holds two matrices:
//   - inputs_to_merged: (input dataset, local field)  -> merged field
//   - merged_to_inputs: (input dataset, merged field) -> local field
//
// Each matrix has its own layout policy. `MergedIndexTable<DatasetMajor, _>` keeps
// every field of one input contiguous in the forward matrix, which makes walking all
// fields of one input cheap and walking all inputs of one field expensive.
// `FieldMajor` is the opposite. Which one is right depends on the owner's traversal
// pattern, so it is a type parameter rather than a runtime flag.
//
// Construction, resizing and deallocation are crate-internal: only the owners in
// `merger` (and tests) decide how big a table is. Reallocation should be rare, so
// keeping it behind the crate boundary forces owners to size tables deliberately.

use log::{debug, trace};

use crate::layout::{DatasetMajor, FieldMajor, LayoutPolicy};
use crate::matrix::GrowOnlyMatrix;
use crate::missing::{MISSING_INDEX, to_cell};

/// Two look-up matrices translating between input and merged field indices.
///
/// Lookups on a cell that was never written return [`MISSING_INDEX`]. Every index
/// argument is a precondition: addressing outside the current extent of a matrix
/// is a caller bug. Debug builds fail with an assertion; release builds panic on
/// the slice index.
#[derive(Debug, Clone)]
pub struct MergedIndexTable<Fwd: LayoutPolicy = DatasetMajor, Rev: LayoutPolicy = DatasetMajor> {
    inputs_to_merged: GrowOnlyMatrix<Fwd>,
    merged_to_inputs: GrowOnlyMatrix<Rev>,
    num_input_datasets: usize,
    num_merged_fields: usize,
}

/// Alias for [`MergedIndexTable`] naming both directions explicitly.
pub type BidirectionalIndexTable<Fwd, Rev> = MergedIndexTable<Fwd, Rev>;

/// Both matrices laid out by input dataset.
pub type InputOrderedLut = MergedIndexTable<DatasetMajor, DatasetMajor>;
/// Both matrices laid out by field.
pub type FieldOrderedLut = MergedIndexTable<FieldMajor, FieldMajor>;

impl<Fwd: LayoutPolicy, Rev: LayoutPolicy> MergedIndexTable<Fwd, Rev> {
    /// A table with no cells at all. Resize before use.
    pub(crate) fn empty() -> Self {
        Self {
            inputs_to_merged: GrowOnlyMatrix::empty(),
            merged_to_inputs: GrowOnlyMatrix::empty(),
            num_input_datasets: 0,
            num_merged_fields: 0,
        }
    }

    /// A table covering `num_input_datasets` x `num_merged_fields`, every cell missing.
    pub(crate) fn new(num_input_datasets: usize, num_merged_fields: usize) -> Self {
        let mut table = Self::empty();
        table.resize_luts_if_needed(num_input_datasets, num_merged_fields);
        table
    }

    /// Deallocates both matrices. Dimensions collapse to zero.
    pub(crate) fn clear(&mut self) {
        self.inputs_to_merged.clear();
        self.merged_to_inputs.clear();
        self.num_input_datasets = 0;
        self.num_merged_fields = 0;
    }

    /// Grows both matrices to cover at least the requested extent.
    ///
    /// Smaller requests leave the affected dimension untouched: tables never shrink.
    pub(crate) fn resize_luts_if_needed(&mut self, num_input_datasets: usize, num_merged_fields: usize) {
        self.resize_merged_to_inputs_lut_if_needed(num_input_datasets, num_merged_fields);
        self.resize_inputs_to_merged_lut_if_needed(num_input_datasets, num_merged_fields);
    }

    pub(crate) fn resize_inputs_to_merged_lut_if_needed(
        &mut self,
        num_input_datasets: usize,
        num_merged_fields: usize,
    ) {
        let before = self.inputs_to_merged.physical_extent();
        if self.inputs_to_merged.grow(num_input_datasets, num_merged_fields) {
            debug!(
                "Grew input->merged LUT from {:?} to {:?} (dataset-major: {})",
                before,
                self.inputs_to_merged.physical_extent(),
                Fwd::IS_DATASET_MAJOR
            );
        } else {
            trace!("input->merged LUT already covers {num_input_datasets}x{num_merged_fields}");
        }
        self.track_extent(self.inputs_to_merged.logical_extent());
    }

    pub(crate) fn resize_merged_to_inputs_lut_if_needed(
        &mut self,
        num_input_datasets: usize,
        num_merged_fields: usize,
    ) {
        let before = self.merged_to_inputs.physical_extent();
        if self.merged_to_inputs.grow(num_input_datasets, num_merged_fields) {
            debug!(
                "Grew merged->input LUT from {:?} to {:?} (dataset-major: {})",
                before,
                self.merged_to_inputs.physical_extent(),
                Rev::IS_DATASET_MAJOR
            );
        } else {
            trace!("merged->input LUT already covers {num_input_datasets}x{num_merged_fields}");
        }
        self.track_extent(self.merged_to_inputs.logical_extent());
    }

    fn track_extent(&mut self, (datasets, fields): (usize, usize)) {
        self.num_input_datasets = self.num_input_datasets.max(datasets);
        self.num_merged_fields = self.num_merged_fields.max(fields);
    }

    // --- Public surface ---

    /// Largest number of input datasets either matrix has been sized for.
    #[inline(always)]
    pub fn num_input_datasets(&self) -> usize {
        self.num_input_datasets
    }

    /// Largest number of merged fields either matrix has been sized for.
    #[inline(always)]
    pub fn num_merged_fields(&self) -> usize {
        self.num_merged_fields
    }

    /// Logical `(datasets, fields)` extent of the input->merged matrix.
    pub fn inputs_to_merged_extent(&self) -> (usize, usize) {
        self.inputs_to_merged.logical_extent()
    }

    /// Logical `(datasets, fields)` extent of the merged->input matrix.
    pub fn merged_to_inputs_extent(&self) -> (usize, usize) {
        self.merged_to_inputs.logical_extent()
    }

    /// Invalidates every mapping. The allocation is kept.
    pub fn reset_luts(&mut self) {
        self.inputs_to_merged.reset_all();
        self.merged_to_inputs.reset_all();
    }

    /// Records that field `input_idx` of input `input_dataset` is merged field `merged_idx`.
    ///
    /// Writes both directions. No other mapping is touched, so a previous mapping
    /// of either index stays in the other matrix until reset explicitly.
    #[inline(always)]
    pub fn add_input_merged_idx_pair(&mut self, input_dataset: usize, input_idx: usize, merged_idx: usize) {
        self.inputs_to_merged.set(input_dataset, input_idx, to_cell(merged_idx));
        self.merged_to_inputs.set(input_dataset, merged_idx, to_cell(input_idx));
    }

    /// Merged field index for field `input_idx` of input `input_dataset`,
    /// or [`MISSING_INDEX`].
    #[inline(always)]
    pub fn merged_idx_for_input(&self, input_dataset: usize, input_idx: usize) -> i32 {
        self.inputs_to_merged.get(input_dataset, input_idx)
    }

    /// Field index within input `input_dataset` for merged field `merged_idx`,
    /// or [`MISSING_INDEX`].
    #[inline(always)]
    pub fn input_idx_for_merged(&self, input_dataset: usize, merged_idx: usize) -> i32 {
        self.merged_to_inputs.get(input_dataset, merged_idx)
    }

    /// Invalidates the input->merged cell only.
    #[inline(always)]
    pub fn reset_merged_idx_for_input(&mut self, input_dataset: usize, input_idx: usize) {
        self.inputs_to_merged.set(input_dataset, input_idx, MISSING_INDEX);
    }

    /// Invalidates the merged->input cell only.
    #[inline(always)]
    pub fn reset_input_idx_for_merged(&mut self, input_dataset: usize, merged_idx: usize) {
        self.merged_to_inputs.set(input_dataset, merged_idx, MISSING_INDEX);
    }
}
