#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
//! Look-up tables that translate between the local field numbering of each
//! input VCF and the unified numbering of the merged VCF.
//!
//! A field can be anything with an index in a header or a record: an INFO or
//! FORMAT definition, a sample column, an allele. Each [`MergedIndexTable`]
//! keeps two matrices, one answering "input field -> merged field" and one
//! answering "merged field -> input field". The physical layout of each matrix
//! is picked at compile time through a [`LayoutPolicy`] type parameter.
//!
//! The tables are populated by owners living inside this crate
//! ([`merger::FieldMerger`], [`merger::AlleleMerger`]); construction and
//! resizing are crate-internal, everything that reads or writes a single
//! mapping is public.

pub mod alleles;
pub mod config;
pub mod layout;
mod matrix;
pub mod merger;
pub mod missing;
pub mod table;

pub use alleles::{
    AlleleIndexTable, BoundedAlleleIndexTable, CombineAllelesLut, DEFAULT_INIT_NUM_ALLELES,
};
pub use layout::{DatasetMajor, FieldMajor, LayoutPolicy};
pub use missing::{MISSING_INDEX, is_missing};
pub use table::{BidirectionalIndexTable, MergedIndexTable};
