//! Type erased columns.

pub mod aggregate;
pub mod arithmetic;
pub mod cast;
pub mod named_from;
pub mod temporal;

use std::slice;

pub use named_from::NamedFrom;
use num_traits::NumCast;
use tabula_error::{DbError, Result};

use super::chunk::ChunkValues;
use super::chunked_array::{
    BooleanChunked, BooleanChunkedBuilder, ChunkedArray, FillNoneStrategy, Float32Chunked,
    Float64Chunked, Int8Chunked, Int16Chunked, Int32Chunked, Int64Chunked, ListChunked,
    ListChunkedBuilder, PrimitiveChunked, PrimitiveChunkedBuilder, UInt8Chunked, UInt16Chunked,
    UInt32Chunked, UInt64Chunked, Utf8Chunked, Utf8ChunkedBuilder,
};
use super::datatype::DataType;
use super::native::NativeType;
use super::scalar::ScalarValue;

/// Bind the chunked array inside a series and evaluate `$body` for it.
macro_rules! match_series {
    ($series:expr, $ca:ident => $body:expr) => {
        match $series {
            $crate::arrays::series::Series::Boolean($ca) => $body,
            $crate::arrays::series::Series::UInt8($ca) => $body,
            $crate::arrays::series::Series::UInt16($ca) => $body,
            $crate::arrays::series::Series::UInt32($ca) => $body,
            $crate::arrays::series::Series::UInt64($ca) => $body,
            $crate::arrays::series::Series::Int8($ca) => $body,
            $crate::arrays::series::Series::Int16($ca) => $body,
            $crate::arrays::series::Series::Int32($ca) => $body,
            $crate::arrays::series::Series::Int64($ca) => $body,
            $crate::arrays::series::Series::Float32($ca) => $body,
            $crate::arrays::series::Series::Float64($ca) => $body,
            $crate::arrays::series::Series::Utf8($ca) => $body,
            $crate::arrays::series::Series::List($ca) => $body,
        }
    };
}

/// Like `match_series`, wrapping the result back into the same variant.
macro_rules! map_series {
    ($series:expr, $ca:ident => $body:expr) => {
        match $series {
            $crate::arrays::series::Series::Boolean($ca) => {
                $crate::arrays::series::Series::Boolean($body)
            }
            $crate::arrays::series::Series::UInt8($ca) => {
                $crate::arrays::series::Series::UInt8($body)
            }
            $crate::arrays::series::Series::UInt16($ca) => {
                $crate::arrays::series::Series::UInt16($body)
            }
            $crate::arrays::series::Series::UInt32($ca) => {
                $crate::arrays::series::Series::UInt32($body)
            }
            $crate::arrays::series::Series::UInt64($ca) => {
                $crate::arrays::series::Series::UInt64($body)
            }
            $crate::arrays::series::Series::Int8($ca) => {
                $crate::arrays::series::Series::Int8($body)
            }
            $crate::arrays::series::Series::Int16($ca) => {
                $crate::arrays::series::Series::Int16($body)
            }
            $crate::arrays::series::Series::Int32($ca) => {
                $crate::arrays::series::Series::Int32($body)
            }
            $crate::arrays::series::Series::Int64($ca) => {
                $crate::arrays::series::Series::Int64($body)
            }
            $crate::arrays::series::Series::Float32($ca) => {
                $crate::arrays::series::Series::Float32($body)
            }
            $crate::arrays::series::Series::Float64($ca) => {
                $crate::arrays::series::Series::Float64($body)
            }
            $crate::arrays::series::Series::Utf8($ca) => {
                $crate::arrays::series::Series::Utf8($body)
            }
            $crate::arrays::series::Series::List($ca) => {
                $crate::arrays::series::Series::List($body)
            }
        }
    };
}

/// Bind the chunked arrays of two series of the same variant. Falls through
/// to `$fallback` when the variants differ.
macro_rules! match_series_pair {
    ($left:expr, $right:expr, $a:ident, $b:ident => $body:expr, _ => $fallback:expr) => {
        match ($left, $right) {
            (Series::Boolean($a), Series::Boolean($b)) => $body,
            (Series::UInt8($a), Series::UInt8($b)) => $body,
            (Series::UInt16($a), Series::UInt16($b)) => $body,
            (Series::UInt32($a), Series::UInt32($b)) => $body,
            (Series::UInt64($a), Series::UInt64($b)) => $body,
            (Series::Int8($a), Series::Int8($b)) => $body,
            (Series::Int16($a), Series::Int16($b)) => $body,
            (Series::Int32($a), Series::Int32($b)) => $body,
            (Series::Int64($a), Series::Int64($b)) => $body,
            (Series::Float32($a), Series::Float32($b)) => $body,
            (Series::Float64($a), Series::Float64($b)) => $body,
            (Series::Utf8($a), Series::Utf8($b)) => $body,
            (Series::List($a), Series::List($b)) => $body,
            _ => $fallback,
        }
    };
}

/// Bind the chunked array of a numeric series, `$fallback` for all other
/// variants.
macro_rules! match_numeric {
    ($series:expr, $ca:ident => $body:expr, _ => $fallback:expr) => {
        match $series {
            Series::UInt8($ca) => $body,
            Series::UInt16($ca) => $body,
            Series::UInt32($ca) => $body,
            Series::UInt64($ca) => $body,
            Series::Int8($ca) => $body,
            Series::Int16($ca) => $body,
            Series::Int32($ca) => $body,
            Series::Int64($ca) => $body,
            Series::Float32($ca) => $body,
            Series::Float64($ca) => $body,
            _ => $fallback,
        }
    };
}

/// Bind the chunked arrays of two numeric series of the same variant.
macro_rules! match_numeric_pair {
    ($left:expr, $right:expr, $a:ident, $b:ident => $body:expr, _ => $fallback:expr) => {
        match ($left, $right) {
            (Series::UInt8($a), Series::UInt8($b)) => Series::UInt8($body),
            (Series::UInt16($a), Series::UInt16($b)) => Series::UInt16($body),
            (Series::UInt32($a), Series::UInt32($b)) => Series::UInt32($body),
            (Series::UInt64($a), Series::UInt64($b)) => Series::UInt64($body),
            (Series::Int8($a), Series::Int8($b)) => Series::Int8($body),
            (Series::Int16($a), Series::Int16($b)) => Series::Int16($body),
            (Series::Int32($a), Series::Int32($b)) => Series::Int32($body),
            (Series::Int64($a), Series::Int64($b)) => Series::Int64($body),
            (Series::Float32($a), Series::Float32($b)) => Series::Float32($body),
            (Series::Float64($a), Series::Float64($b)) => Series::Float64($body),
            _ => $fallback,
        }
    };
}

/// Evaluate `$body` with `$ty` bound to the native type of a numeric data
/// type, `$fallback` for all other types.
macro_rules! with_native_type {
    ($dtype:expr, $ty:ident => $body:expr, _ => $fallback:expr) => {
        match $dtype {
            DataType::UInt8 => {
                type $ty = u8;
                $body
            }
            DataType::UInt16 => {
                type $ty = u16;
                $body
            }
            DataType::UInt32 => {
                type $ty = u32;
                $body
            }
            DataType::UInt64 => {
                type $ty = u64;
                $body
            }
            DataType::Int8 => {
                type $ty = i8;
                $body
            }
            DataType::Int16 => {
                type $ty = i16;
                $body
            }
            DataType::Int32 => {
                type $ty = i32;
                $body
            }
            DataType::Int64 => {
                type $ty = i64;
                $body
            }
            DataType::Float32 => {
                type $ty = f32;
                $body
            }
            DataType::Float64 => {
                type $ty = f64;
                $body
            }
            _ => $fallback,
        }
    };
}

pub(crate) use {
    match_numeric, match_numeric_pair, match_series, match_series_pair, with_native_type,
};

/// A named column of any element kind.
#[derive(Debug, Clone)]
pub enum Series {
    Boolean(BooleanChunked),
    UInt8(UInt8Chunked),
    UInt16(UInt16Chunked),
    UInt32(UInt32Chunked),
    UInt64(UInt64Chunked),
    Int8(Int8Chunked),
    Int16(Int16Chunked),
    Int32(Int32Chunked),
    Int64(Int64Chunked),
    Float32(Float32Chunked),
    Float64(Float64Chunked),
    Utf8(Utf8Chunked),
    List(ListChunked),
}

impl<T: NativeType> From<PrimitiveChunked<T>> for Series {
    fn from(ca: PrimitiveChunked<T>) -> Self {
        T::into_series(ca)
    }
}

impl From<BooleanChunked> for Series {
    fn from(ca: BooleanChunked) -> Self {
        Series::Boolean(ca)
    }
}

impl From<Utf8Chunked> for Series {
    fn from(ca: Utf8Chunked) -> Self {
        Series::Utf8(ca)
    }
}

impl From<ListChunked> for Series {
    fn from(ca: ListChunked) -> Self {
        Series::List(ca)
    }
}

fn scalars_of<V: ChunkValues>(
    ca: &ChunkedArray<V>,
) -> impl Iterator<Item = ScalarValue> + '_ {
    ca.iter()
        .map(|v| v.map(V::to_scalar).unwrap_or(ScalarValue::Null))
}

fn unexpected_type(expected: &str, got: &DataType) -> DbError {
    DbError::type_mismatch(format!("Expected a {expected} series"))
        .with_field("got", got)
}

impl Series {
    /// Create an empty series of the given type.
    pub fn new_empty(name: &str, dtype: &DataType) -> Self {
        Self::full_null(name, dtype, 0)
    }

    /// Create a series of `len` nulls.
    pub fn full_null(name: &str, dtype: &DataType, len: usize) -> Self {
        let dt = dtype.clone();
        match dtype {
            DataType::Date32 => Int32Chunked::full_null(name, dt, len).into(),
            DataType::Date64 => Int64Chunked::full_null(name, dt, len).into(),
            DataType::Boolean => BooleanChunked::full_null(name, dt, len).into(),
            DataType::Utf8 => Utf8Chunked::full_null(name, dt, len).into(),
            _ => with_native_type!(dtype, T => {
                PrimitiveChunked::<T>::full_null(name, dt, len).into()
            }, _ => ListChunked::full_null(name, dt, len).into()),
        }
    }

    /// Create a series holding `len` copies of a value.
    ///
    /// Errors if the value is an untyped null.
    pub fn full(name: &str, value: &ScalarValue, len: usize) -> Result<Self> {
        let dtype = value
            .datatype()
            .ok_or_else(|| DbError::type_mismatch("Cannot infer the type of a null value"))?;
        let single = Self::from_scalars(name, &dtype, slice::from_ref(value))?;
        // SAFETY: The series has a single value.
        Ok(unsafe { single.take_unchecked(std::iter::repeat_n(0, len), len) })
    }

    /// Create a series of the given type from scalars.
    ///
    /// Every value must be null or of the requested type. Numeric values of
    /// another width are converted when they fit.
    pub fn from_scalars(name: &str, dtype: &DataType, values: &[ScalarValue]) -> Result<Self> {
        if dtype.is_temporal() {
            return Self::from_scalars(name, &dtype.physical(), values)?.with_logical_dtype(dtype);
        }

        let mismatch = |v: &ScalarValue| {
            DbError::type_mismatch("Scalar does not match the series type")
                .with_field("value", v)
                .with_field("datatype", dtype)
        };

        let series: Series = match dtype {
            DataType::Boolean => {
                let mut builder = BooleanChunkedBuilder::with_capacity(name, values.len());
                for v in values {
                    match v {
                        ScalarValue::Null => builder.append_null(),
                        ScalarValue::Boolean(b) => builder.append_value(*b),
                        other => return Err(mismatch(other)),
                    }
                }
                builder.finish().into()
            }
            DataType::Utf8 => {
                let mut builder = Utf8ChunkedBuilder::with_capacity(name, values.len());
                for v in values {
                    match v {
                        ScalarValue::Null => builder.append_null(),
                        ScalarValue::Utf8(s) => builder.append_value(s),
                        other => return Err(mismatch(other)),
                    }
                }
                builder.finish().into()
            }
            _ => with_native_type!(dtype, T => {
                let mut builder =
                    PrimitiveChunkedBuilder::<T>::with_capacity(name, values.len());
                for v in values {
                    if v.is_null() {
                        builder.append_null();
                        continue;
                    }
                    match native_from_scalar::<T>(v) {
                        Some(v) => builder.append_value(v),
                        None => return Err(mismatch(v)),
                    }
                }
                builder.finish().into()
            }, _ => {
                let inner = dtype.try_list_inner()?;
                let mut builder = ListChunkedBuilder::new(name, inner.clone(), values.len());
                for v in values {
                    match v {
                        ScalarValue::Null => builder.append_null(),
                        ScalarValue::List(s) => builder.append_value(s)?,
                        other => return Err(mismatch(other)),
                    }
                }
                builder.finish().into()
            }),
        };

        Ok(series)
    }

    pub fn name(&self) -> &str {
        match_series!(self, ca => ca.name())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        match_series!(self, ca => ca.rename(name))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.rename(name);
        self
    }

    pub fn dtype(&self) -> &DataType {
        match_series!(self, ca => ca.dtype())
    }

    pub fn len(&self) -> usize {
        match_series!(self, ca => ca.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match_series!(self, ca => ca.null_count())
    }

    pub fn n_chunks(&self) -> usize {
        match_series!(self, ca => ca.n_chunks())
    }

    pub fn chunk_lengths(&self) -> Vec<usize> {
        match_series!(self, ca => ca.chunk_lengths())
    }

    /// Iterate over all values as scalars.
    pub fn scalar_iter(&self) -> Box<dyn Iterator<Item = ScalarValue> + '_> {
        match_series!(self, ca => Box::new(scalars_of(ca)))
    }

    /// Get the value at an index.
    pub fn get(&self, idx: usize) -> Result<ScalarValue> {
        match_series!(self, ca => ca.get_scalar(idx))
    }

    pub fn is_null(&self) -> Series {
        Series::Boolean(match_series!(self, ca => ca.is_null()))
    }

    pub fn is_not_null(&self) -> Series {
        Series::Boolean(match_series!(self, ca => ca.is_not_null()))
    }

    pub fn slice(&self, offset: i64, length: usize) -> Series {
        map_series!(self, ca => ca.slice(offset, length))
    }

    pub fn head(&self, n: usize) -> Series {
        map_series!(self, ca => ca.head(n))
    }

    pub fn tail(&self, n: usize) -> Series {
        map_series!(self, ca => ca.tail(n))
    }

    pub fn take(&self, indices: &[usize]) -> Result<Series> {
        Ok(map_series!(self, ca => ca.take(indices)?))
    }

    pub fn take_opt(&self, indices: &[Option<usize>]) -> Result<Series> {
        Ok(map_series!(self, ca => ca.take_opt(indices)?))
    }

    /// # Safety
    ///
    /// Every index must be less than `len`.
    pub(crate) unsafe fn take_unchecked(
        &self,
        indices: impl Iterator<Item = usize>,
        cap: usize,
    ) -> Series {
        unsafe { map_series!(self, ca => ca.take_unchecked(indices, cap)) }
    }

    pub fn filter(&self, mask: &BooleanChunked) -> Result<Series> {
        Ok(map_series!(self, ca => ca.filter(mask)?))
    }

    pub fn shift(&self, periods: i64) -> Series {
        map_series!(self, ca => ca.shift(periods))
    }

    pub fn reverse(&self) -> Series {
        map_series!(self, ca => ca.reverse())
    }

    pub fn sort(&self, descending: bool) -> Series {
        map_series!(self, ca => ca.sort(descending))
    }

    /// Indices that would sort the series, nulls last.
    pub fn sort_indices(&self, descending: bool) -> Vec<usize> {
        match_series!(self, ca => ca.arg_sort(descending))
    }

    /// Like `sort_indices`, returned as a `u32` series.
    pub fn arg_sort(&self, descending: bool) -> Series {
        let indices = self.sort_indices(descending);
        UInt32Chunked::from_values_iter(
            self.name(),
            DataType::UInt32,
            indices.into_iter().map(|idx| idx as u32),
        )
        .into()
    }

    /// Pick values from `self` where the mask is true, from `other`
    /// otherwise.
    pub fn zip_with(&self, mask: &BooleanChunked, other: &Series) -> Result<Series> {
        match_series_pair!(self, other, a, b => Ok(a.zip_with(mask, b)?.into()), _ => {
            Err(DbError::type_mismatch("Cannot zip series with different types")
                .with_field("left", self.dtype())
                .with_field("right", other.dtype()))
        })
    }

    /// Append the chunks of another series of the same type.
    pub fn append(&mut self, other: &Series) -> Result<()> {
        let (left, right) = (self.dtype().clone(), other.dtype().clone());
        match_series_pair!(self, other, a, b => a.append(b), _ => {
            Err(DbError::type_mismatch("Cannot append series with different types")
                .with_field("left", left)
                .with_field("right", right))
        })
    }

    pub fn rechunk(&self) -> Series {
        map_series!(self, ca => ca.rechunk())
    }

    /// Index of the first occurrence of each distinct value.
    pub fn arg_unique(&self) -> Vec<usize> {
        match_series!(self, ca => ca.arg_unique())
    }

    /// Distinct values in first-seen order.
    pub fn unique(&self) -> Series {
        map_series!(self, ca => ca.unique())
    }

    /// Number of distinct values, null counts as one value.
    pub fn n_unique(&self) -> usize {
        match_series!(self, ca => ca.n_unique())
    }

    /// Check if two series hold the same values, ignoring names.
    ///
    /// With `null_equal`, nulls at the same position compare equal, otherwise
    /// any null makes the series unequal.
    pub fn series_equal(&self, other: &Series, null_equal: bool) -> bool {
        if self.dtype() != other.dtype() || self.len() != other.len() {
            return false;
        }
        if !null_equal && (self.null_count() > 0 || other.null_count() > 0) {
            return false;
        }
        self.scalar_iter().zip(other.scalar_iter()).all(|(a, b)| a == b)
    }

    pub fn fill_none(&self, strategy: FillNoneStrategy) -> Result<Series> {
        Ok(map_series!(self, ca => ca.fill_none(strategy)?))
    }

    /// Replace values where the mask is true.
    pub fn set(&self, mask: &BooleanChunked, value: &ScalarValue) -> Result<Series> {
        let value = Self::from_scalars("", self.dtype(), slice::from_ref(value))?;
        match_series_pair!(self, &value, a, b => Ok(a.set(mask, b.get(0)?)?.into()), _ => {
            Err(unexpected_type(&self.dtype().to_string(), value.dtype()))
        })
    }

    /// Replace values at the given indices.
    pub fn set_at_idx(&self, indices: &[usize], value: &ScalarValue) -> Result<Series> {
        let value = Self::from_scalars("", self.dtype(), slice::from_ref(value))?;
        match_series_pair!(self, &value, a, b => {
            Ok(a.set_at_idx(indices, b.get(0)?)?.into())
        }, _ => {
            Err(unexpected_type(&self.dtype().to_string(), value.dtype()))
        })
    }

    /// Get the values of a series of a native type.
    pub fn unpack<T: NativeType>(&self) -> Result<&PrimitiveChunked<T>> {
        T::unpack_series(self)
            .ok_or_else(|| unexpected_type(&T::DATATYPE.to_string(), self.dtype()))
    }

    pub fn bool(&self) -> Result<&BooleanChunked> {
        match self {
            Series::Boolean(ca) => Ok(ca),
            other => Err(unexpected_type("bool", other.dtype())),
        }
    }

    pub fn utf8(&self) -> Result<&Utf8Chunked> {
        match self {
            Series::Utf8(ca) => Ok(ca),
            other => Err(unexpected_type("str", other.dtype())),
        }
    }

    pub fn list(&self) -> Result<&ListChunked> {
        match self {
            Series::List(ca) => Ok(ca),
            other => Err(unexpected_type("list", other.dtype())),
        }
    }

    pub fn u8(&self) -> Result<&UInt8Chunked> {
        self.unpack()
    }

    pub fn u16(&self) -> Result<&UInt16Chunked> {
        self.unpack()
    }

    pub fn u32(&self) -> Result<&UInt32Chunked> {
        self.unpack()
    }

    pub fn u64(&self) -> Result<&UInt64Chunked> {
        self.unpack()
    }

    pub fn i8(&self) -> Result<&Int8Chunked> {
        self.unpack()
    }

    pub fn i16(&self) -> Result<&Int16Chunked> {
        self.unpack()
    }

    pub fn i32(&self) -> Result<&Int32Chunked> {
        self.unpack()
    }

    pub fn i64(&self) -> Result<&Int64Chunked> {
        self.unpack()
    }

    pub fn f32(&self) -> Result<&Float32Chunked> {
        self.unpack()
    }

    pub fn f64(&self) -> Result<&Float64Chunked> {
        self.unpack()
    }
}

/// Get a native value out of a scalar, converting between numeric widths when
/// the value fits.
fn native_from_scalar<T: NativeType>(scalar: &ScalarValue) -> Option<T> {
    if let Some(v) = T::try_from_scalar(scalar) {
        return Some(v);
    }
    match scalar {
        ScalarValue::Float32(v) => <T as NumCast>::from(*v),
        ScalarValue::Float64(v) => <T as NumCast>::from(*v),
        other => other.try_as_i64().ok().and_then(<T as NumCast>::from),
    }
}

/// Nulls compare equal, names are ignored.
impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.series_equal(other, true)
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;

    #[test]
    fn dispatch_basics() {
        let mut s = Series::new("a", &[Some(1i64), None, Some(3)]);
        assert_eq!("a", s.name());
        assert_eq!(&DataType::Int64, s.dtype());
        assert_eq!(3, s.len());
        assert_eq!(1, s.null_count());

        s.rename("b");
        assert_eq!("b", s.name());
        assert_eq!(ScalarValue::Int64(3), s.get(2).unwrap());
        assert_eq!(ScalarValue::Null, s.get(1).unwrap());
        assert_eq!(ErrorKind::OutOfBounds, s.get(3).unwrap_err().kind());
    }

    #[test]
    fn wrong_accessor_is_type_error() {
        let s = Series::new("a", &["x"]);
        assert!(s.utf8().is_ok());
        assert_eq!(ErrorKind::Type, s.i32().unwrap_err().kind());
        assert_eq!(ErrorKind::Type, s.bool().unwrap_err().kind());
    }

    #[test]
    fn from_scalars_with_nulls() {
        let values = [ScalarValue::Int32(1), ScalarValue::Null, ScalarValue::Int64(3)];
        let s = Series::from_scalars("a", &DataType::Int32, &values).unwrap();
        assert_eq!(Series::new("", &[Some(1i32), None, Some(3)]), s);

        let err = Series::from_scalars("a", &DataType::Int32, &[ScalarValue::from("x")])
            .unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());

        let err = Series::from_scalars("a", &DataType::UInt8, &[ScalarValue::Int32(-1)])
            .unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn full_and_full_null() {
        let s = Series::full("a", &ScalarValue::from("x"), 3).unwrap();
        assert_eq!(Series::new("", &["x", "x", "x"]), s);

        let s = Series::full_null("a", &DataType::Float32, 2);
        assert_eq!(2, s.null_count());
        assert_eq!(&DataType::Float32, s.dtype());

        let err = Series::full("a", &ScalarValue::Null, 2).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn append_requires_same_type() {
        let mut a = Series::new("a", &[1i32, 2]);
        a.append(&Series::new("b", &[3i32])).unwrap();
        assert_eq!(2, a.n_chunks());
        assert_eq!(Series::new("", &[1i32, 2, 3]), a);

        let err = a.append(&Series::new("b", &[1i64])).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn series_equal_nulls() {
        let a = Series::new("a", &[Some(1i32), None]);
        let b = Series::new("b", &[Some(1i32), None]);
        assert!(a.series_equal(&b, true));
        assert!(!a.series_equal(&b, false));
        assert_ne!(a, Series::new("a", &[Some(1i64), None]));
    }

    #[test]
    fn unique_values() {
        let s = Series::new("a", &[Some("b"), None, Some("b"), Some("a")]);
        assert_eq!(3, s.n_unique());
        assert_eq!(Series::new("", &[Some("b"), None, Some("a")]), s.unique());
        assert_eq!(vec![0, 1, 3], s.arg_unique());
    }

    #[test]
    fn arg_sort_as_series() {
        let s = Series::new("a", &[3i32, 1, 2]);
        assert_eq!(Series::new("", &[1u32, 2, 0]), s.arg_sort(false));
        assert_eq!(Series::new("", &[1i32, 2, 3]), s.sort(false));
    }

    #[test]
    fn set_values_from_scalars() {
        let s = Series::new("a", &[1i32, 2, 3]);
        let out = s.set_at_idx(&[1], &ScalarValue::Int32(9)).unwrap();
        assert_eq!(Series::new("", &[1i32, 9, 3]), out);

        let mask = BooleanChunked::from_slice("m", &[true, false, false]);
        let out = s.set(&mask, &ScalarValue::Null).unwrap();
        assert_eq!(Series::new("", &[None, Some(2i32), Some(3)]), out);

        let err = s.set_at_idx(&[0], &ScalarValue::from("x")).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn zip_with_type_mismatch() {
        let a = Series::new("a", &[1i32]);
        let b = Series::new("b", &["x"]);
        let mask = BooleanChunked::from_slice("m", &[true]);
        let err = a.zip_with(&mask, &b).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }
}
