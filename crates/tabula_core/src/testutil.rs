//! Assertions for tests.

use crate::arrays::series::Series;
use crate::frame::DataFrame;

/// Assert two series have the same name, type and values.
///
/// Nulls at the same position compare equal.
#[track_caller]
pub fn assert_series_eq(left: &Series, right: &Series) {
    assert_eq!(left.name(), right.name(), "series names differ");
    assert_eq!(left.dtype(), right.dtype(), "series types differ");
    assert_eq!(left.len(), right.len(), "series lengths differ");

    for (idx, (a, b)) in left.scalar_iter().zip(right.scalar_iter()).enumerate() {
        assert_eq!(a, b, "values differ at index {idx} of series '{}'", left.name());
    }
}

/// Assert two frames have the same columns, in the same order.
#[track_caller]
pub fn assert_frames_eq(left: &DataFrame, right: &DataFrame) {
    assert_eq!(
        left.get_column_names(),
        right.get_column_names(),
        "frame columns differ"
    );
    assert_eq!(left.height(), right.height(), "frame heights differ");

    for (a, b) in left.columns().iter().zip(right.columns()) {
        assert_series_eq(a, b);
    }
}
