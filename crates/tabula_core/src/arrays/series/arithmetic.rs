use std::borrow::Cow;
use std::ops::{Add, Div, Mul, Sub};

use tabula_error::{DbError, Result};

use super::{Series, match_numeric_pair, match_series_pair};
use crate::arrays::datatype::DataType;

fn unsupported(op: &str, lhs: &Series, rhs: &Series) -> DbError {
    DbError::type_mismatch(format!("Unsupported operand types for '{op}'"))
        .with_field("left", lhs.dtype())
        .with_field("right", rhs.dtype())
}

/// Cast numeric operands of different types to their common type.
///
/// Operands that already share a type are passed through. Non-numeric
/// operands of different types are an error, as is a cast that would turn a
/// value into null.
pub(crate) fn coerce_operands<'a>(
    op: &str,
    lhs: &'a Series,
    rhs: &'a Series,
) -> Result<(Cow<'a, Series>, Cow<'a, Series>)> {
    if lhs.dtype() == rhs.dtype() {
        return Ok((Cow::Borrowed(lhs), Cow::Borrowed(rhs)));
    }
    match lhs.dtype().numeric_supertype(rhs.dtype()) {
        Some(dtype) => Ok((
            Cow::Owned(lossless_cast(op, lhs, &dtype)?),
            Cow::Owned(lossless_cast(op, rhs, &dtype)?),
        )),
        None => Err(unsupported(op, lhs, rhs)),
    }
}

fn lossless_cast(op: &str, series: &Series, dtype: &DataType) -> Result<Series> {
    let cast = series.cast(dtype)?;
    if cast.null_count() != series.null_count() {
        return Err(
            DbError::type_mismatch(format!("Operand out of range for '{op}'"))
                .with_field("from", series.dtype())
                .with_field("to", dtype),
        );
    }
    Ok(cast)
}

macro_rules! impl_series_arith {
    ($trait:ident, $fn:ident, $method:ident, $op:literal) => {
        impl $trait for &Series {
            type Output = Result<Series>;

            fn $fn(self, rhs: Self) -> Self::Output {
                if self.dtype().is_temporal() || rhs.dtype().is_temporal() {
                    return Err(unsupported($op, self, rhs));
                }
                let (l, r) = coerce_operands($op, self, rhs)?;
                Ok(match_numeric_pair!(l.as_ref(), r.as_ref(), a, b => a.$method(b)?, _ => {
                    return Err(unsupported($op, self, rhs))
                }))
            }
        }
    };
}

impl_series_arith!(Add, add, wrapping_add, "+");
impl_series_arith!(Sub, sub, wrapping_sub, "-");
impl_series_arith!(Mul, mul, wrapping_mul, "*");
impl_series_arith!(Div, div, wrapping_div, "/");

macro_rules! impl_series_compare {
    ($($name:ident),*) => {
        $(
            pub fn $name(&self, other: &Series) -> Result<Series> {
                let op = stringify!($name);
                let (l, r) = coerce_operands(op, self, other)?;
                match_series_pair!(l.as_ref(), r.as_ref(), a, b => {
                    Ok(Series::Boolean(a.$name(b)?))
                }, _ => Err(unsupported(op, self, other)))
            }
        )*
    };
}

impl Series {
    impl_series_compare!(equal, not_equal, gt, gt_eq, lt, lt_eq);

    pub fn and(&self, other: &Series) -> Result<Series> {
        Ok(Series::Boolean(self.bool()?.and(other.bool()?)?))
    }

    pub fn or(&self, other: &Series) -> Result<Series> {
        Ok(Series::Boolean(self.bool()?.or(other.bool()?)?))
    }

    pub fn not(&self) -> Result<Series> {
        Ok(Series::Boolean(self.bool()?.not()))
    }
}
