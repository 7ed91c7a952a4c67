// ========================================================================================
//                             The allele index look-up table
// ========================================================================================
//
// A site rarely carries more than a handful of alleles, so this table is sized for
// `DEFAULT_INIT_NUM_ALLELES` merged alleles up front and remembers the largest allele
// count it has been asked for. `resize_luts_if_needed` then returns after a single
// comparison for almost every site.

use crate::layout::DatasetMajor;
use crate::table::MergedIndexTable;

/// Number of merged alleles a fresh table can hold without reallocating.
pub const DEFAULT_INIT_NUM_ALLELES: usize = 10;

/// Look-up table between the allele vectors of the input records at one site and
/// the merged allele vector.
///
/// Both matrices are laid out by input, since alleles are always walked one input
/// at a time.
#[derive(Debug, Clone)]
pub struct AlleleIndexTable {
    lut: MergedIndexTable<DatasetMajor, DatasetMajor>,
    max_num_alleles: usize,
}

/// Alias for [`AlleleIndexTable`] stressing its bounded growth.
pub type BoundedAlleleIndexTable = AlleleIndexTable;
/// The look-up table used when combining the alleles of one site.
pub type CombineAllelesLut = AlleleIndexTable;

impl AlleleIndexTable {
    pub(crate) fn new(num_input_datasets: usize) -> Self {
        Self::with_capacity(num_input_datasets, DEFAULT_INIT_NUM_ALLELES)
    }

    pub(crate) fn with_capacity(num_input_datasets: usize, num_alleles: usize) -> Self {
        Self {
            lut: MergedIndexTable::new(num_input_datasets, num_alleles),
            max_num_alleles: num_alleles,
        }
    }

    /// Makes room for `num_merged_alleles` merged alleles.
    ///
    /// The underlying table is only touched when the request exceeds every
    /// previous request.
    #[inline(always)]
    pub(crate) fn resize_luts_if_needed(&mut self, num_merged_alleles: usize) {
        if num_merged_alleles > self.max_num_alleles {
            let num_inputs = self.lut.num_input_datasets();
            self.lut.resize_luts_if_needed(num_inputs, num_merged_alleles);
            self.max_num_alleles = num_merged_alleles;
        }
    }

    /// Largest merged allele count this table has been sized for.
    #[inline(always)]
    pub fn max_num_alleles(&self) -> usize {
        self.max_num_alleles
    }

    pub fn num_input_datasets(&self) -> usize {
        self.lut.num_input_datasets()
    }

    /// Read-only view of the underlying table.
    pub fn lut(&self) -> &MergedIndexTable<DatasetMajor, DatasetMajor> {
        &self.lut
    }

    /// Invalidates every allele mapping, keeping the allocation.
    pub fn reset_luts(&mut self) {
        self.lut.reset_luts();
    }

    #[inline(always)]
    pub fn add_input_merged_idx_pair(&mut self, input_dataset: usize, input_allele: usize, merged_allele: usize) {
        self.lut.add_input_merged_idx_pair(input_dataset, input_allele, merged_allele);
    }

    #[inline(always)]
    pub fn merged_idx_for_input(&self, input_dataset: usize, input_allele: usize) -> i32 {
        self.lut.merged_idx_for_input(input_dataset, input_allele)
    }

    #[inline(always)]
    pub fn input_idx_for_merged(&self, input_dataset: usize, merged_allele: usize) -> i32 {
        self.lut.input_idx_for_merged(input_dataset, merged_allele)
    }

    #[inline(always)]
    pub fn reset_merged_idx_for_input(&mut self, input_dataset: usize, input_allele: usize) {
        self.lut.reset_merged_idx_for_input(input_dataset, input_allele);
    }

    #[inline(always)]
    pub fn reset_input_idx_for_merged(&mut self, input_dataset: usize, merged_allele: usize) {
        self.lut.reset_input_idx_for_merged(input_dataset, merged_allele);
    }
}
