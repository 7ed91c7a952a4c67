// ========================================================================================
//                               The grow-only index matrix
// ========================================================================================
//
// One half of a look-up table. The matrix is addressed logically as
// `(dataset, field)` and stored physically as `rows[row][col]`, where the layout
// policy `L` decides which logical dimension becomes the row.
//
// Dimensions only ever grow. Every cell created by a growth event holds the
// missing sentinel.

use std::marker::PhantomData;

use crate::layout::LayoutPolicy;
use crate::missing::MISSING_INDEX;

#[derive(Debug, Clone)]
pub(crate) struct GrowOnlyMatrix<L: LayoutPolicy> {
    rows: Vec<Vec<i32>>,
    /// Width of every row. Tracked separately so that a matrix with no rows can
    /// still remember how wide its rows must be once they appear.
    cols: usize,
    layout: PhantomData<L>,
}

impl<L: LayoutPolicy> GrowOnlyMatrix<L> {
    pub(crate) fn empty() -> Self {
        Self {
            rows: Vec::new(),
            cols: 0,
            layout: PhantomData,
        }
    }

    /// Physical `(rows, cols)` extent.
    #[inline(always)]
    pub(crate) fn physical_extent(&self) -> (usize, usize) {
        (self.rows.len(), self.cols)
    }

    /// Logical `(datasets, fields)` extent.
    #[inline(always)]
    pub(crate) fn logical_extent(&self) -> (usize, usize) {
        L::logical_extent(self.rows.len(), self.cols)
    }

    #[inline(always)]
    pub(crate) fn get(&self, dataset: usize, field: usize) -> i32 {
        let (row, col) = L::physical(dataset, field);
        self.check_bounds(row, col);
        self.rows[row][col]
    }

    #[inline(always)]
    pub(crate) fn set(&mut self, dataset: usize, field: usize, value: i32) {
        let (row, col) = L::physical(dataset, field);
        self.check_bounds(row, col);
        self.rows[row][col] = value;
    }

    /// Out-of-bounds access is a caller bug. Debug builds stop here with a
    /// readable message; release builds trap on the slice index instead.
    #[inline(always)]
    fn check_bounds(&self, row: usize, col: usize) {
        debug_assert!(
            row < self.rows.len(),
            "Look-up table row {row} out of bounds ({} rows)",
            self.rows.len()
        );
        debug_assert!(
            col < self.cols,
            "Look-up table column {col} out of bounds ({} columns)",
            self.cols
        );
    }

    /// Grows the matrix so that it covers at least `num_datasets` x `num_fields`.
    ///
    /// Rows are appended first. If the requested width exceeds the current width,
    /// every row is widened; otherwise only the appended rows are filled, to the
    /// existing width. Requests smaller than the current extent leave that
    /// dimension untouched.
    ///
    /// Returns `true` if any cell was allocated.
    pub(crate) fn grow(&mut self, num_datasets: usize, num_fields: usize) -> bool {
        let (new_rows, new_cols) = L::physical_extent(num_datasets, num_fields);
        let old_rows = self.rows.len();
        let old_cols = self.cols;

        if new_rows > old_rows {
            self.rows.resize_with(new_rows, Vec::new);
        }

        let first_row_to_fill = if new_cols > old_cols {
            self.cols = new_cols;
            0
        } else {
            old_rows
        };

        let width = self.cols;
        let mut grew = false;
        for row in &mut self.rows[first_row_to_fill..] {
            if row.len() < width {
                row.resize(width, MISSING_INDEX);
                grew = true;
            }
        }
        grew || self.rows.len() > old_rows || self.cols > old_cols
    }

    /// Writes the sentinel into every cell, keeping the allocation.
    pub(crate) fn reset_all(&mut self) {
        for row in &mut self.rows {
            row.fill(MISSING_INDEX);
        }
    }

    /// Deallocates every row. Both dimensions collapse to zero.
    pub(crate) fn clear(&mut self) {
        self.rows = Vec::new();
        self.cols = 0;
    }
}
