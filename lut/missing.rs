// ========================================================================================
//                              The "no mapping" sentinel
// ========================================================================================

/// The value stored in every cell that holds no mapping.
///
/// This is the 32-bit integer missing value of the BCF encoding. It must only be
/// compared for equality; never do arithmetic on it.
pub const MISSING_INDEX: i32 = i32::MIN;

/// Returns true if a value read from a table means "no mapping recorded".
#[inline(always)]
pub fn is_missing(value: i32) -> bool {
    value == MISSING_INDEX
}

/// Converts a stored cell into a usable index, or `None` for the sentinel.
#[inline(always)]
pub fn as_index(value: i32) -> Option<usize> {
    if is_missing(value) {
        None
    } else {
        debug_assert!(value >= 0, "Table cell holds a negative index: {value}");
        Some(value as usize)
    }
}

/// Converts an index into a cell value. Indices must fit in a non-negative `i32`.
#[inline(always)]
pub(crate) fn to_cell(index: usize) -> i32 {
    debug_assert!(
        index <= i32::MAX as usize,
        "Index {index} does not fit in a table cell"
    );
    index as i32
}
