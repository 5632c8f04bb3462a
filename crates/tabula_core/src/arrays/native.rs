use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::str::FromStr;

use num_traits::{NumCast, ToPrimitive};

use super::chunked_array::ChunkedArray;
use super::datatype::DataType;
use super::scalar::ScalarValue;
use super::series::Series;
use crate::buffer::AlignedVec;

/// Numeric element types stored directly in an aligned buffer.
pub trait NativeType:
    Copy
    + Default
    + PartialOrd
    + Debug
    + Display
    + FromStr
    + NumCast
    + ToPrimitive
    + Send
    + Sync
    + 'static
{
    const DATATYPE: DataType;

    fn zero() -> Self {
        Self::default()
    }

    /// Total ordering, floats use IEEE total order.
    fn total_cmp(&self, other: &Self) -> Ordering;

    fn wrapping_add(self, other: Self) -> Self;
    fn wrapping_sub(self, other: Self) -> Self;
    fn wrapping_mul(self, other: Self) -> Self;

    /// Division returning None on integer division by zero.
    fn checked_div(self, other: Self) -> Option<Self>;

    fn into_scalar(self) -> ScalarValue;

    /// Get the value out of a scalar of exactly this type.
    fn try_from_scalar(scalar: &ScalarValue) -> Option<Self>;

    fn into_series(ca: ChunkedArray<AlignedVec<Self>>) -> Series;

    fn unpack_series(series: &Series) -> Option<&ChunkedArray<AlignedVec<Self>>>;
}

macro_rules! impl_native_int {
    ($ty:ty, $variant:ident) => {
        impl NativeType for $ty {
            const DATATYPE: DataType = DataType::$variant;

            fn total_cmp(&self, other: &Self) -> Ordering {
                Ord::cmp(self, other)
            }

            fn wrapping_add(self, other: Self) -> Self {
                <$ty>::wrapping_add(self, other)
            }

            fn wrapping_sub(self, other: Self) -> Self {
                <$ty>::wrapping_sub(self, other)
            }

            fn wrapping_mul(self, other: Self) -> Self {
                <$ty>::wrapping_mul(self, other)
            }

            fn checked_div(self, other: Self) -> Option<Self> {
                if other == 0 {
                    None
                } else {
                    Some(<$ty>::wrapping_div(self, other))
                }
            }

            fn into_scalar(self) -> ScalarValue {
                ScalarValue::$variant(self)
            }

            fn try_from_scalar(scalar: &ScalarValue) -> Option<Self> {
                match scalar {
                    ScalarValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_series(ca: ChunkedArray<AlignedVec<Self>>) -> Series {
                Series::$variant(ca)
            }

            fn unpack_series(series: &Series) -> Option<&ChunkedArray<AlignedVec<Self>>> {
                match series {
                    Series::$variant(ca) => Some(ca),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! impl_native_float {
    ($ty:ty, $variant:ident) => {
        impl NativeType for $ty {
            const DATATYPE: DataType = DataType::$variant;

            fn total_cmp(&self, other: &Self) -> Ordering {
                <$ty>::total_cmp(self, other)
            }

            fn wrapping_add(self, other: Self) -> Self {
                self + other
            }

            fn wrapping_sub(self, other: Self) -> Self {
                self - other
            }

            fn wrapping_mul(self, other: Self) -> Self {
                self * other
            }

            fn checked_div(self, other: Self) -> Option<Self> {
                Some(self / other)
            }

            fn into_scalar(self) -> ScalarValue {
                ScalarValue::$variant(self)
            }

            fn try_from_scalar(scalar: &ScalarValue) -> Option<Self> {
                match scalar {
                    ScalarValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_series(ca: ChunkedArray<AlignedVec<Self>>) -> Series {
                Series::$variant(ca)
            }

            fn unpack_series(series: &Series) -> Option<&ChunkedArray<AlignedVec<Self>>> {
                match series {
                    Series::$variant(ca) => Some(ca),
                    _ => None,
                }
            }
        }
    };
}

impl_native_int!(u8, UInt8);
impl_native_int!(u16, UInt16);
impl_native_int!(u32, UInt32);
impl_native_int!(u64, UInt64);
impl_native_int!(i8, Int8);
impl_native_int!(i16, Int16);
impl_native_int!(i32, Int32);
impl_native_int!(i64, Int64);
impl_native_float!(f32, Float32);
impl_native_float!(f64, Float64);
