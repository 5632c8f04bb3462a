use tabula_error::{DbError, Result};

use super::{Series, match_numeric, match_series};
use crate::arrays::chunk::ChunkValues;
use crate::arrays::chunked_array::ChunkedArray;
use crate::arrays::native::NativeType;
use crate::arrays::scalar::ScalarValue;

fn into_scalar<T: NativeType>(v: Option<T>) -> ScalarValue {
    v.map(T::into_scalar).unwrap_or(ScalarValue::Null)
}

fn min_scalar<V: ChunkValues>(ca: &ChunkedArray<V>) -> ScalarValue {
    ca.min_item().map(V::to_scalar).unwrap_or(ScalarValue::Null)
}

fn max_scalar<V: ChunkValues>(ca: &ChunkedArray<V>) -> ScalarValue {
    ca.max_item().map(V::to_scalar).unwrap_or(ScalarValue::Null)
}

fn first_scalar<V: ChunkValues>(ca: &ChunkedArray<V>) -> ScalarValue {
    ca.first().map(V::to_scalar).unwrap_or(ScalarValue::Null)
}

fn last_scalar<V: ChunkValues>(ca: &ChunkedArray<V>) -> ScalarValue {
    ca.last().map(V::to_scalar).unwrap_or(ScalarValue::Null)
}

impl Series {
    fn not_numeric(&self, agg: &str) -> DbError {
        DbError::type_mismatch(format!("Cannot compute {agg} of a non-numeric series"))
            .with_field("datatype", self.dtype())
    }

    /// Dates share their physical chunks with integers but have no sum or
    /// average.
    fn check_not_temporal(&self, agg: &str) -> Result<()> {
        if self.dtype().is_temporal() {
            return Err(self.not_numeric(agg));
        }
        Ok(())
    }

    /// Sum of the non-null values. Booleans sum to the number of true values.
    pub fn sum(&self) -> Result<ScalarValue> {
        self.check_not_temporal("sum")?;
        match self {
            Series::Boolean(ca) => Ok(ca.sum().into()),
            other => match_numeric!(other, ca => Ok(into_scalar(ca.sum())), _ => {
                Err(self.not_numeric("sum"))
            }),
        }
    }

    pub fn min(&self) -> ScalarValue {
        match_series!(self, ca => min_scalar(ca))
    }

    pub fn max(&self) -> ScalarValue {
        match_series!(self, ca => max_scalar(ca))
    }

    pub fn mean(&self) -> Result<ScalarValue> {
        self.check_not_temporal("mean")?;
        match_numeric!(self, ca => Ok(ca.mean().into()), _ => Err(self.not_numeric("mean")))
    }

    pub fn median(&self) -> Result<ScalarValue> {
        self.check_not_temporal("median")?;
        match_numeric!(self, ca => Ok(ca.median().into()), _ => {
            Err(self.not_numeric("median"))
        })
    }

    pub fn quantile(&self, q: f64) -> Result<ScalarValue> {
        self.check_not_temporal("quantile")?;
        match_numeric!(self, ca => Ok(ca.quantile(q)?.into()), _ => {
            Err(self.not_numeric("quantile"))
        })
    }

    pub fn first(&self) -> ScalarValue {
        match_series!(self, ca => first_scalar(ca))
    }

    pub fn last(&self) -> ScalarValue {
        match_series!(self, ca => last_scalar(ca))
    }

    /// Number of non-null values.
    pub fn count(&self) -> usize {
        self.len() - self.null_count()
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::arrays::series::NamedFrom;

    #[test]
    fn numeric_aggregates() {
        let s = Series::new("a", &[Some(3i32), None, Some(1), Some(2)]);
        assert_eq!(ScalarValue::Int32(6), s.sum().unwrap());
        assert_eq!(ScalarValue::Int32(1), s.min());
        assert_eq!(ScalarValue::Int32(3), s.max());
        assert_eq!(ScalarValue::Float64(2.0), s.mean().unwrap());
        assert_eq!(ScalarValue::Float64(2.0), s.median().unwrap());
        assert_eq!(ScalarValue::Int32(3), s.first());
        assert_eq!(ScalarValue::Int32(2), s.last());
        assert_eq!(3, s.count());
    }

    #[test]
    fn all_null_aggregates() {
        let s = Series::new("a", &[None::<f64>, None]);
        assert_eq!(ScalarValue::Null, s.sum().unwrap());
        assert_eq!(ScalarValue::Null, s.min());
        assert_eq!(ScalarValue::Null, s.mean().unwrap());
        assert_eq!(0, s.count());
    }

    #[test]
    fn date_aggregates() {
        let s = Series::new("d", &[Some(18500i32), None, Some(18495)])
            .cast(&DataType::Date32)
            .unwrap();
        assert_eq!(ScalarValue::Int32(18495), s.min());
        assert_eq!(ScalarValue::Int32(18495), s.last());
        assert_eq!(ErrorKind::Type, s.sum().unwrap_err().kind());
        assert_eq!(ErrorKind::Type, s.mean().unwrap_err().kind());
        assert_eq!(ErrorKind::Type, s.quantile(0.5).unwrap_err().kind());
    }

    #[test]
    fn string_aggregates() {
        let s = Series::new("s", &["b", "a", "c"]);
        assert_eq!(ScalarValue::from("a"), s.min());
        assert_eq!(ScalarValue::from("c"), s.max());
        assert_eq!(ErrorKind::Type, s.sum().unwrap_err().kind());
        assert_eq!(ErrorKind::Type, s.mean().unwrap_err().kind());
    }

    #[test]
    fn boolean_sum() {
        let s = Series::new("b", &[true, false, true]);
        assert_eq!(ScalarValue::UInt64(2), s.sum().unwrap());
    }
}
