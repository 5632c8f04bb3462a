use num_traits::NumCast;
use tabula_error::{DbError, Result};

use super::{BooleanChunked, ChunkedArray, ListChunked, PrimitiveChunked, Utf8Chunked};
use crate::arrays::chunk::ChunkValues;
use crate::arrays::native::NativeType;

/// How nulls are replaced by `fill_none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillNoneStrategy {
    /// Last non-null value before the null.
    Forward,
    /// Next non-null value after the null.
    Backward,
    Min,
    Max,
    /// Mean of the non-null values, numeric arrays only.
    Mean,
    /// Zero (or false), numeric and boolean arrays only.
    Zero,
}

impl<V: ChunkValues> ChunkedArray<V> {
    /// Number of non-null values.
    pub fn count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Fill nulls for strategies that only need ordering. Returns None for
    /// strategies that need arithmetic.
    fn fill_none_common(&self, strategy: FillNoneStrategy) -> Option<Self> {
        let filled = match strategy {
            FillNoneStrategy::Forward => self.fill_none_forward(),
            FillNoneStrategy::Backward => self.fill_none_backward(),
            FillNoneStrategy::Min => match self.min_item() {
                Some(v) => self.fill_none_with_value(v),
                None => self.clone(),
            },
            FillNoneStrategy::Max => match self.max_item() {
                Some(v) => self.fill_none_with_value(v),
                None => self.clone(),
            },
            FillNoneStrategy::Mean | FillNoneStrategy::Zero => return None,
        };
        Some(filled)
    }

    fn unsupported_fill(&self, strategy: FillNoneStrategy) -> DbError {
        DbError::invalid_input("Fill strategy not supported for data type")
            .with_field("strategy", format!("{strategy:?}"))
            .with_field("dtype", self.dtype())
    }
}

impl<T: NativeType> PrimitiveChunked<T> {
    /// Wrapping sum of the non-null values, None if there are none.
    pub fn sum(&self) -> Option<T> {
        if self.count() == 0 {
            return None;
        }
        Some(self.iter().flatten().fold(T::zero(), T::wrapping_add))
    }

    pub fn min(&self) -> Option<T> {
        self.min_item()
    }

    pub fn max(&self) -> Option<T> {
        self.max_item()
    }

    pub fn mean(&self) -> Option<f64> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let sum: f64 = self.iter().flatten().filter_map(|v| v.to_f64()).sum();
        Some(sum / count as f64)
    }

    pub fn median(&self) -> Option<f64> {
        quantile_of(self.sorted_f64(), 0.5)
    }

    /// Quantile of the non-null values using linear interpolation between the
    /// closest ranks.
    ///
    /// `q` must be in the range [0, 1].
    pub fn quantile(&self, q: f64) -> Result<Option<f64>> {
        if !(0.0..=1.0).contains(&q) {
            return Err(
                DbError::invalid_input("Quantile must be between 0 and 1").with_field("q", q)
            );
        }
        Ok(quantile_of(self.sorted_f64(), q))
    }

    fn sorted_f64(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.iter().flatten().filter_map(|v| v.to_f64()).collect();
        values.sort_by(f64::total_cmp);
        values
    }

    pub fn fill_none(&self, strategy: FillNoneStrategy) -> Result<Self> {
        if self.null_count() == 0 {
            return Ok(self.clone());
        }
        if let Some(filled) = self.fill_none_common(strategy) {
            return Ok(filled);
        }

        let value = match strategy {
            FillNoneStrategy::Zero => Some(T::zero()),
            _ => self.mean().and_then(<T as NumCast>::from),
        };
        match value {
            Some(value) => Ok(self.fill_none_with_value(value)),
            None => Ok(self.clone()),
        }
    }
}

fn quantile_of(sorted: Vec<f64>, q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

impl BooleanChunked {
    /// Number of true values, None if there are no non-null values.
    pub fn sum(&self) -> Option<u64> {
        if self.count() == 0 {
            return None;
        }
        Some(self.iter().filter(|v| *v == Some(true)).count() as u64)
    }

    pub fn fill_none(&self, strategy: FillNoneStrategy) -> Result<Self> {
        if self.null_count() == 0 {
            return Ok(self.clone());
        }
        match strategy {
            FillNoneStrategy::Zero => Ok(self.fill_none_with_value(false)),
            other => self
                .fill_none_common(other)
                .ok_or_else(|| self.unsupported_fill(other)),
        }
    }
}

impl Utf8Chunked {
    pub fn fill_none(&self, strategy: FillNoneStrategy) -> Result<Self> {
        self.fill_none_common(strategy)
            .ok_or_else(|| self.unsupported_fill(strategy))
    }
}

impl ListChunked {
    pub fn fill_none(&self, strategy: FillNoneStrategy) -> Result<Self> {
        self.fill_none_common(strategy)
            .ok_or_else(|| self.unsupported_fill(strategy))
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::chunked_array::{Float64Chunked, Int32Chunked, UInt8Chunked};

    #[test]
    fn sum_and_mean_skip_nulls() {
        let ca = Int32Chunked::from_options("a", &[Some(1), None, Some(5)]);
        assert_eq!(Some(6), ca.sum());
        assert_eq!(Some(3.0), ca.mean());
        assert_eq!(2, ca.count());
        assert_eq!(Some(1), ca.min());
        assert_eq!(Some(5), ca.max());

        let ca = Int32Chunked::from_options("a", &[None, None]);
        assert_eq!(None, ca.sum());
        assert_eq!(None, ca.mean());
    }

    #[test]
    fn sum_wraps() {
        let ca = UInt8Chunked::from_slice("a", &[200, 100]);
        assert_eq!(Some(44), ca.sum());
    }

    #[test]
    fn median_and_quantile() {
        let ca = Float64Chunked::from_options(
            "a",
            &[Some(4.0), Some(1.0), None, Some(3.0), Some(2.0)],
        );
        assert_eq!(Some(2.5), ca.median());
        assert_eq!(Some(1.0), ca.quantile(0.0).unwrap());
        assert_eq!(Some(4.0), ca.quantile(1.0).unwrap());
        assert_eq!(Some(1.75), ca.quantile(0.25).unwrap());

        let err = ca.quantile(1.5).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn fill_none_numeric() {
        let ca = Int32Chunked::from_options("a", &[Some(1), None, Some(4)]);
        let filled = ca.fill_none(FillNoneStrategy::Mean).unwrap();
        assert_eq!(vec![Some(1), Some(2), Some(4)], filled.iter().collect::<Vec<_>>());

        let filled = ca.fill_none(FillNoneStrategy::Max).unwrap();
        assert_eq!(vec![Some(1), Some(4), Some(4)], filled.iter().collect::<Vec<_>>());

        let filled = ca.fill_none(FillNoneStrategy::Zero).unwrap();
        assert_eq!(vec![Some(1), Some(0), Some(4)], filled.iter().collect::<Vec<_>>());
    }

    #[test]
    fn fill_none_strings() {
        let ca = Utf8Chunked::from_options("s", &[Some("b"), None, Some("a")]);
        let filled = ca.fill_none(FillNoneStrategy::Min).unwrap();
        assert_eq!(
            vec![Some("b"), Some("a"), Some("a")],
            filled.iter().collect::<Vec<_>>()
        );

        let err = ca.fill_none(FillNoneStrategy::Mean).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn boolean_sum() {
        let ca = BooleanChunked::from_options("b", &[Some(true), None, Some(false), Some(true)]);
        assert_eq!(Some(2), ca.sum());

        let filled = ca.fill_none(FillNoneStrategy::Zero).unwrap();
        assert_eq!(0, filled.null_count());
    }
}
