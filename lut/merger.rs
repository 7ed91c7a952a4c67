// ========================================================================================
//                            Owners of the merge look-up tables
// ========================================================================================
//
// The look-up tables only store correspondences. The owners in this module decide
// them: which merged index a name gets, when a table has to grow, and which stale
// mappings must be invalidated before a table is reused.
//
//   - `FieldMerger` merges named header entries (INFO/FORMAT IDs, sample names)
//     by union, in first-seen order.
//   - `AlleleMerger` merges the allele lists of the records at one site. It is
//     reused site after site, so the table stays allocated and only the pairs of
//     the previous site are invalidated.

use ahash::{AHashMap, AHashSet};
use log::debug;
use thiserror::Error;

use crate::alleles::AlleleIndexTable;
use crate::config::MergeConfig;
use crate::layout::{DatasetMajor, LayoutPolicy};
use crate::missing::as_index;
use crate::table::MergedIndexTable;

/// Largest merged index a table cell can hold.
const MAX_CELL_INDEX: usize = i32::MAX as usize;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("Input dataset {dataset} is out of range; the merge was set up for {num_inputs} inputs.")]
    DatasetOutOfRange { dataset: usize, num_inputs: usize },
    #[error("Input dataset {dataset} lists '{name}' more than once.")]
    DuplicateField { dataset: usize, name: String },
    #[error("Merging would produce {0} fields, which does not fit in a look-up table cell.")]
    TooManyFields(usize),
    #[error("Site has entries for {found} inputs, but the merge was set up for {expected}.")]
    InputCountMismatch { found: usize, expected: usize },
    #[error("Input dataset {0} has a record at this site with no alleles.")]
    EmptyAlleleList(usize),
    #[error("Input dataset {dataset} has reference allele '{found}', expected '{expected}'.")]
    ReferenceMismatch {
        dataset: usize,
        expected: String,
        found: String,
    },
}

// ========================================================================================
//                                     Field merging
// ========================================================================================

/// Merges the named fields of N inputs into one list by union.
///
/// The first input to mention a name decides its merged position. The forward
/// matrix uses layout `Fwd` and the reverse matrix layout `Rev`; pick them for the
/// way the merged output will be written.
#[derive(Debug, Clone)]
pub struct FieldMerger<Fwd: LayoutPolicy = DatasetMajor, Rev: LayoutPolicy = DatasetMajor> {
    lut: MergedIndexTable<Fwd, Rev>,
    name_to_merged: AHashMap<String, usize>,
    merged_names: Vec<String>,
    /// Number of local fields of each registered input.
    input_field_counts: Vec<Option<usize>>,
}

impl<Fwd: LayoutPolicy, Rev: LayoutPolicy> FieldMerger<Fwd, Rev> {
    pub fn new(num_inputs: usize) -> Self {
        Self::with_capacity(num_inputs, 0)
    }

    /// A merger whose table is sized for `field_capacity` merged fields up front.
    pub fn with_capacity(num_inputs: usize, field_capacity: usize) -> Self {
        Self {
            lut: MergedIndexTable::new(num_inputs, field_capacity),
            name_to_merged: AHashMap::with_capacity(field_capacity),
            merged_names: Vec::with_capacity(field_capacity),
            input_field_counts: vec![None; num_inputs],
        }
    }

    pub fn from_config(num_inputs: usize, config: &MergeConfig) -> Self {
        Self::with_capacity(num_inputs, config.field_capacity)
    }

    #[inline(always)]
    pub fn num_inputs(&self) -> usize {
        self.input_field_counts.len()
    }

    /// Merged field names in merged index order.
    pub fn merged_names(&self) -> &[String] {
        &self.merged_names
    }

    /// Number of fields registered for `dataset`, or `None` if it was never added.
    pub fn input_field_count(&self, dataset: usize) -> Option<usize> {
        self.input_field_counts.get(dataset).copied().flatten()
    }

    /// Read-only view of the look-up table.
    pub fn lut(&self) -> &MergedIndexTable<Fwd, Rev> {
        &self.lut
    }

    /// Registers the local field list of `dataset`.
    ///
    /// Names not seen before are appended to the merged list. Registering the same
    /// input again replaces its previous mappings.
    pub fn add_input<S: AsRef<str>>(&mut self, dataset: usize, names: &[S]) -> Result<(), MergeError> {
        let num_inputs = self.num_inputs();
        if dataset >= num_inputs {
            return Err(MergeError::DatasetOutOfRange { dataset, num_inputs });
        }

        let mut seen: AHashSet<&str> = AHashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_ref()) {
                return Err(MergeError::DuplicateField {
                    dataset,
                    name: name.as_ref().to_string(),
                });
            }
        }

        let unseen = seen
            .iter()
            .filter(|name| !self.name_to_merged.contains_key(**name))
            .count();
        let merged_count = self.merged_names.len() + unseen;
        if merged_count > MAX_CELL_INDEX {
            return Err(MergeError::TooManyFields(merged_count));
        }

        self.forget_input(dataset);

        let mut merged_indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let merged = match self.name_to_merged.get(name) {
                Some(&idx) => idx,
                None => {
                    let idx = self.merged_names.len();
                    self.name_to_merged.insert(name.to_string(), idx);
                    self.merged_names.push(name.to_string());
                    idx
                }
            };
            merged_indices.push(merged);
        }

        self.reserve_merged_fields(self.merged_names.len());
        for (local, &merged) in merged_indices.iter().enumerate() {
            self.lut.add_input_merged_idx_pair(dataset, local, merged);
        }
        self.input_field_counts[dataset] = Some(names.len());

        debug!(
            "Input {dataset}: {} fields, {unseen} previously unseen, {} merged",
            names.len(),
            self.merged_names.len()
        );
        Ok(())
    }

    /// Merged index of local field `local` of `dataset`.
    pub fn merged_index(&self, dataset: usize, local: usize) -> Option<usize> {
        let count = self.input_field_count(dataset)?;
        if local >= count {
            return None;
        }
        as_index(self.lut.merged_idx_for_input(dataset, local))
    }

    /// Local index within `dataset` of merged field `merged`, if that input has it.
    pub fn local_index(&self, dataset: usize, merged: usize) -> Option<usize> {
        if dataset >= self.num_inputs() || merged >= self.merged_names.len() {
            return None;
        }
        as_index(self.lut.input_idx_for_merged(dataset, merged))
    }

    /// Forgets every field and deallocates the table. The inputs stay.
    pub fn clear(&mut self) {
        self.lut.clear();
        self.lut.resize_luts_if_needed(self.num_inputs(), 0);
        self.name_to_merged.clear();
        self.merged_names.clear();
        self.input_field_counts.fill(None);
    }

    /// Grows the table geometrically so that a stream of new fields reallocates rarely.
    fn reserve_merged_fields(&mut self, needed: usize) {
        let capacity = self.lut.num_merged_fields();
        if needed > capacity {
            let target = needed.max(capacity.saturating_mul(2)).min(MAX_CELL_INDEX);
            self.lut.resize_luts_if_needed(self.num_inputs(), target);
        }
    }

    /// Invalidates both directions of every pair recorded for `dataset`.
    fn forget_input(&mut self, dataset: usize) {
        let Some(count) = self.input_field_counts[dataset].take() else {
            return;
        };
        for local in 0..count {
            if let Some(merged) = as_index(self.lut.merged_idx_for_input(dataset, local)) {
                self.lut.reset_input_idx_for_merged(dataset, merged);
            }
            self.lut.reset_merged_idx_for_input(dataset, local);
        }
    }
}

// ========================================================================================
//                                     Allele merging
// ========================================================================================

/// Merges the allele lists of the input records at one site.
///
/// Allele 0 of every input is the reference and must agree across inputs; it is
/// always merged allele 0. Alternate alleles follow in first-seen order.
#[derive(Debug, Clone)]
pub struct AlleleMerger {
    lut: AlleleIndexTable,
    merged_alleles: Vec<String>,
    /// Number of alleles each input had at the current site; 0 if absent.
    input_allele_counts: Vec<usize>,
}

impl AlleleMerger {
    pub fn new(num_inputs: usize) -> Self {
        Self {
            lut: AlleleIndexTable::new(num_inputs),
            merged_alleles: Vec::new(),
            input_allele_counts: vec![0; num_inputs],
        }
    }

    pub fn from_config(num_inputs: usize, config: &MergeConfig) -> Self {
        Self {
            lut: AlleleIndexTable::with_capacity(num_inputs, config.allele_capacity),
            merged_alleles: Vec::with_capacity(config.allele_capacity),
            input_allele_counts: vec![0; num_inputs],
        }
    }

    #[inline(always)]
    pub fn num_inputs(&self) -> usize {
        self.input_allele_counts.len()
    }

    /// Merged alleles of the current site.
    pub fn merged_alleles(&self) -> &[String] {
        &self.merged_alleles
    }

    /// Read-only view of the allele look-up table.
    pub fn lut(&self) -> &AlleleIndexTable {
        &self.lut
    }

    /// Merges one site. `site[d]` holds the alleles of input `d`, reference first,
    /// or `None` if that input has no record here.
    ///
    /// Once the input count checks out, the mappings of the previous site are
    /// invalidated, even if this site then fails to merge.
    pub fn merge_site<S: AsRef<str>>(&mut self, site: &[Option<&[S]>]) -> Result<&[String], MergeError> {
        let expected = self.num_inputs();
        if site.len() != expected {
            return Err(MergeError::InputCountMismatch {
                found: site.len(),
                expected,
            });
        }

        self.forget_site();

        let mut lookup: AHashMap<&str, usize> = AHashMap::new();
        let mut merged: Vec<&str> = Vec::new();
        for (dataset, alleles) in site.iter().enumerate() {
            let Some(alleles) = alleles else { continue };
            let Some(reference) = alleles.first() else {
                return Err(MergeError::EmptyAlleleList(dataset));
            };
            let reference = reference.as_ref();
            match merged.first().copied() {
                None => {
                    lookup.insert(reference, 0);
                    merged.push(reference);
                }
                Some(expected) if expected != reference => {
                    return Err(MergeError::ReferenceMismatch {
                        dataset,
                        expected: expected.to_string(),
                        found: reference.to_string(),
                    });
                }
                Some(_) => {}
            }

            let mut seen: AHashSet<&str> = AHashSet::with_capacity(alleles.len());
            for allele in alleles.iter() {
                let allele = allele.as_ref();
                if !seen.insert(allele) {
                    return Err(MergeError::DuplicateField {
                        dataset,
                        name: allele.to_string(),
                    });
                }
                if !lookup.contains_key(allele) {
                    lookup.insert(allele, merged.len());
                    merged.push(allele);
                }
            }
        }

        self.lut.resize_luts_if_needed(merged.len());
        for (dataset, alleles) in site.iter().enumerate() {
            let Some(alleles) = alleles else { continue };
            for (local, allele) in alleles.iter().enumerate() {
                self.lut
                    .add_input_merged_idx_pair(dataset, local, lookup[allele.as_ref()]);
            }
            self.input_allele_counts[dataset] = alleles.len();
        }

        self.merged_alleles.extend(merged.iter().map(|a| a.to_string()));
        Ok(&self.merged_alleles)
    }

    /// Merged index of allele `local` of `dataset` at the current site.
    pub fn merged_allele_index(&self, dataset: usize, local: usize) -> Option<usize> {
        if local >= *self.input_allele_counts.get(dataset)? {
            return None;
        }
        as_index(self.lut.merged_idx_for_input(dataset, local))
    }

    /// Index within `dataset` of merged allele `merged` at the current site.
    pub fn input_allele_index(&self, dataset: usize, merged: usize) -> Option<usize> {
        if dataset >= self.num_inputs() || merged >= self.merged_alleles.len() {
            return None;
        }
        as_index(self.lut.input_idx_for_merged(dataset, merged))
    }

    /// Invalidates every allele mapping, keeping the table allocated.
    pub fn reset(&mut self) {
        self.lut.reset_luts();
        self.merged_alleles.clear();
        self.input_allele_counts.fill(0);
    }

    /// Invalidates only the pairs written for the previous site.
    fn forget_site(&mut self) {
        for dataset in 0..self.input_allele_counts.len() {
            let count = std::mem::take(&mut self.input_allele_counts[dataset]);
            for local in 0..count {
                if let Some(merged) = as_index(self.lut.merged_idx_for_input(dataset, local)) {
                    self.lut.reset_input_idx_for_merged(dataset, merged);
                }
                self.lut.reset_merged_idx_for_input(dataset, local);
            }
        }
        self.merged_alleles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alleles::DEFAULT_INIT_NUM_ALLELES;
    use crate::layout::FieldMajor;
    use crate::missing::is_missing;

    #[test]
    fn union_assigns_merged_indices_in_first_seen_order() {
        let mut merger = FieldMerger::<DatasetMajor, FieldMajor>::new(2);
        merger.add_input(0, &["DP", "AF"]).unwrap();
        merger.add_input(1, &["MQ", "DP"]).unwrap();

        assert_eq!(merger.merged_names(), ["DP", "AF", "MQ"]);
        assert_eq!(merger.merged_index(1, 0), Some(2));
        assert_eq!(merger.merged_index(1, 1), Some(0));
        assert_eq!(merger.local_index(0, 2), None);
        assert_eq!(merger.local_index(1, 2), Some(0));
        assert_eq!(merger.local_index(0, 1), Some(1));
    }

    #[test]
    fn table_grows_geometrically() {
        let mut merger = FieldMerger::<FieldMajor, FieldMajor>::new(1);
        merger.add_input(0, &["A"]).unwrap();
        assert_eq!(merger.lut().num_merged_fields(), 1);
        let names: Vec<String> = (0..3).map(|i| format!("F{i}")).collect();
        merger.add_input(0, &names).unwrap();
        // Four merged fields needed, capacity doubles past that only when required.
        assert_eq!(merger.merged_names().len(), 4);
        assert!(merger.lut().num_merged_fields() >= 4);
    }

    #[test]
    fn re_registering_an_input_drops_its_stale_pairs() {
        let mut merger = FieldMerger::<DatasetMajor, DatasetMajor>::with_capacity(1, 8);
        merger.add_input(0, &["GT", "DP", "GQ"]).unwrap();
        merger.add_input(0, &["GQ"]).unwrap();

        assert_eq!(merger.input_field_count(0), Some(1));
        assert_eq!(merger.merged_index(0, 0), Some(2));
        assert_eq!(merger.merged_index(0, 1), None);
        assert_eq!(merger.local_index(0, 0), None);
        assert_eq!(merger.local_index(0, 1), None);
        assert_eq!(merger.local_index(0, 2), Some(0));
        assert!(is_missing(merger.lut().merged_idx_for_input(0, 1)));
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let mut merger = FieldMerger::<DatasetMajor, DatasetMajor>::new(1);
        assert_eq!(
            merger.add_input(3, &["X"]),
            Err(MergeError::DatasetOutOfRange {
                dataset: 3,
                num_inputs: 1
            })
        );
        assert_eq!(
            merger.add_input(0, &["X", "X"]),
            Err(MergeError::DuplicateField {
                dataset: 0,
                name: "X".to_string()
            })
        );
        assert!(merger.merged_names().is_empty());
    }

    #[test]
    fn clear_forgets_fields_but_keeps_inputs() {
        let mut merger = FieldMerger::<DatasetMajor, FieldMajor>::new(2);
        merger.add_input(0, &["S1", "S2"]).unwrap();
        merger.clear();
        assert_eq!(merger.num_inputs(), 2);
        assert!(merger.merged_names().is_empty());
        assert_eq!(merger.lut().num_merged_fields(), 0);
        assert_eq!(merger.merged_index(0, 0), None);

        merger.add_input(1, &["S3"]).unwrap();
        assert_eq!(merger.merged_index(1, 0), Some(0));
    }

    #[test]
    fn allele_merge_puts_reference_first_and_unions_alts() {
        let mut merger = AlleleMerger::new(3);
        let a: &[&str] = &["A", "T"];
        let b: &[&str] = &["A", "G", "T"];
        let merged = merger.merge_site(&[Some(a), None, Some(b)]).unwrap();
        assert_eq!(merged, ["A", "T", "G"]);

        assert_eq!(merger.merged_allele_index(2, 1), Some(2));
        assert_eq!(merger.merged_allele_index(2, 2), Some(1));
        assert_eq!(merger.input_allele_index(0, 2), None);
        assert_eq!(merger.input_allele_index(2, 0), Some(0));
        assert_eq!(merger.merged_allele_index(1, 0), None);
    }

    #[test]
    fn next_site_invalidates_previous_pairs() {
        let mut merger = AlleleMerger::new(2);
        let first: &[&str] = &["C", "G", "T"];
        merger.merge_site(&[Some(first), Some(first)]).unwrap();

        let second: &[&str] = &["G", "A"];
        merger.merge_site(&[None, Some(second)]).unwrap();
        assert_eq!(merger.merged_alleles(), ["G", "A"]);
        assert_eq!(merger.merged_allele_index(0, 0), None);
        assert!(is_missing(merger.lut().merged_idx_for_input(0, 2)));
        assert!(is_missing(merger.lut().input_idx_for_merged(0, 2)));
        assert!(is_missing(merger.lut().input_idx_for_merged(1, 2)));
    }

    #[test]
    fn many_alleles_grow_the_table_once() {
        let mut merger = AlleleMerger::new(2);
        let many: Vec<String> = (0..15).map(|i| "A".repeat(i + 1)).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let one: &[&str] = &["A"];

        merger.merge_site(&[Some(&refs[..]), Some(one)]).unwrap();
        assert_eq!(merger.lut().max_num_alleles(), 15);
        assert_eq!(merger.merged_allele_index(0, 14), Some(14));
        for allele in 1..15 {
            assert!(is_missing(merger.lut().input_idx_for_merged(1, allele)));
        }

        merger.merge_site(&[Some(one), Some(one)]).unwrap();
        assert_eq!(merger.lut().max_num_alleles(), 15);
        assert!(merger.lut().max_num_alleles() > DEFAULT_INIT_NUM_ALLELES);
    }

    #[test]
    fn allele_errors_are_reported() {
        let mut merger = AlleleMerger::new(2);
        let a: &[&str] = &["A"];
        let c: &[&str] = &["C", "A"];
        let empty: &[&str] = &[];

        assert_eq!(
            merger.merge_site(&[Some(a)]),
            Err(MergeError::InputCountMismatch {
                found: 1,
                expected: 2
            })
        );
        assert_eq!(
            merger.merge_site(&[Some(a), Some(c)]),
            Err(MergeError::ReferenceMismatch {
                dataset: 1,
                expected: "A".to_string(),
                found: "C".to_string()
            })
        );
        assert_eq!(
            merger.merge_site(&[Some(empty), None]),
            Err(MergeError::EmptyAlleleList(0))
        );
    }

    #[test]
    fn reset_keeps_allele_table_allocated() {
        let mut merger = AlleleMerger::from_config(
            1,
            &MergeConfig {
                allele_capacity: 4,
                ..MergeConfig::default()
            },
        );
        let a: &[&str] = &["A", "C"];
        merger.merge_site(&[Some(a)]).unwrap();
        merger.reset();
        assert!(merger.merged_alleles().is_empty());
        assert_eq!(merger.lut().max_num_alleles(), 4);
        assert!(is_missing(merger.lut().merged_idx_for_input(0, 1)));
    }
}
