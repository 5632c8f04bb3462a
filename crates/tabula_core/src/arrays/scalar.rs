use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_traits::ToPrimitive;
use tabula_error::{DbError, Result};

use super::datatype::DataType;
use super::series::Series;

/// A single value of any element kind, or null.
///
/// Floats compare and hash by their bit pattern so that scalars can be used as
/// group and join keys.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    List(Series),
}

impl ScalarValue {
    /// Get the data type of this value, None for an untyped null.
    pub fn datatype(&self) -> Option<DataType> {
        Some(match self {
            ScalarValue::Null => return None,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::UInt8(_) => DataType::UInt8,
            ScalarValue::UInt16(_) => DataType::UInt16,
            ScalarValue::UInt32(_) => DataType::UInt32,
            ScalarValue::UInt64(_) => DataType::UInt64,
            ScalarValue::Int8(_) => DataType::Int8,
            ScalarValue::Int16(_) => DataType::Int16,
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float32(_) => DataType::Float32,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
            ScalarValue::List(s) => DataType::List(Box::new(s.dtype().clone())),
        })
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn try_as_bool(&self) -> Result<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(DbError::type_mismatch("Not a bool").with_field("value", other)),
        }
    }

    pub fn try_as_i64(&self) -> Result<i64> {
        let v = match self {
            Self::UInt8(v) => v.to_i64(),
            Self::UInt16(v) => v.to_i64(),
            Self::UInt32(v) => v.to_i64(),
            Self::UInt64(v) => v.to_i64(),
            Self::Int8(v) => v.to_i64(),
            Self::Int16(v) => v.to_i64(),
            Self::Int32(v) => v.to_i64(),
            Self::Int64(v) => Some(*v),
            _ => None,
        };
        v.ok_or_else(|| DbError::type_mismatch("Not an i64").with_field("value", self))
    }

    pub fn try_as_usize(&self) -> Result<usize> {
        let v = self.try_as_i64()?;
        usize::try_from(v)
            .map_err(|_| DbError::invalid_input("Value cannot be negative").with_field("value", v))
    }

    pub fn try_as_f64(&self) -> Result<f64> {
        match self {
            Self::Float32(v) => Ok(*v as f64),
            Self::Float64(v) => Ok(*v),
            other => other.try_as_i64().map(|v| v as f64),
        }
    }

    pub fn try_as_str(&self) -> Result<&str> {
        match self {
            Self::Utf8(s) => Ok(s.as_str()),
            other => Err(DbError::type_mismatch("Not a string").with_field("value", other)),
        }
    }

    /// Total ordering across scalars.
    ///
    /// Nulls sort after everything, numbers of different widths compare by
    /// value.
    pub fn total_cmp(&self, other: &ScalarValue) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Greater,
            (_, Self::Null) => Ordering::Less,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Utf8(a), Self::Utf8(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => {
                for (a, b) in a.scalar_iter().zip(b.scalar_iter()) {
                    match a.total_cmp(&b) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => match (a.try_as_i64(), b.try_as_i64()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => match (a.try_as_f64(), b.try_as_f64()) {
                    (Ok(a), Ok(b)) => a.total_cmp(&b),
                    _ => a.variant_idx().cmp(&b.variant_idx()),
                },
            },
        }
    }

    const fn variant_idx(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::UInt8(_) => 2,
            Self::UInt16(_) => 3,
            Self::UInt32(_) => 4,
            Self::UInt64(_) => 5,
            Self::Int8(_) => 6,
            Self::Int16(_) => 7,
            Self::Int32(_) => 8,
            Self::Int64(_) => 9,
            Self::Float32(_) => 10,
            Self::Float64(_) => 11,
            Self::Utf8(_) => 12,
            Self::List(_) => 13,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::UInt8(a), Self::UInt8(b)) => a == b,
            (Self::UInt16(a), Self::UInt16(b)) => a == b,
            (Self::UInt32(a), Self::UInt32(b)) => a == b,
            (Self::UInt64(a), Self::UInt64(b)) => a == b,
            (Self::Int8(a), Self::Int8(b)) => a == b,
            (Self::Int16(a), Self::Int16(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_idx().hash(state);
        match self {
            Self::Null => (),
            Self::Boolean(v) => v.hash(state),
            Self::UInt8(v) => v.hash(state),
            Self::UInt16(v) => v.hash(state),
            Self::UInt32(v) => v.hash(state),
            Self::UInt64(v) => v.hash(state),
            Self::Int8(v) => v.hash(state),
            Self::Int16(v) => v.hash(state),
            Self::Int32(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float32(v) => v.to_bits().hash(state),
            Self::Float64(v) => v.to_bits().hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::List(s) => {
                s.len().hash(state);
                for v in s.scalar_iter() {
                    v.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::List(s) => {
                write!(f, "[")?;
                for (idx, v) in s.scalar_iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_scalar_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for ScalarValue {
            fn from(value: $ty) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_scalar_from!(bool, Boolean);
impl_scalar_from!(u8, UInt8);
impl_scalar_from!(u16, UInt16);
impl_scalar_from!(u32, UInt32);
impl_scalar_from!(u64, UInt64);
impl_scalar_from!(i8, Int8);
impl_scalar_from!(i16, Int16);
impl_scalar_from!(i32, Int32);
impl_scalar_from!(i64, Int64);
impl_scalar_from!(f32, Float32);
impl_scalar_from!(f64, Float64);
impl_scalar_from!(String, Utf8);
impl_scalar_from!(Series, List);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => ScalarValue::Null,
        }
    }
}
