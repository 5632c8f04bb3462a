use std::fmt;

use tabula_error::{DbError, Result};

/// Element kind of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    /// Days since the unix epoch, stored as `i32`.
    Date32,
    /// Milliseconds since the unix epoch, stored as `i64`.
    Date64,
    /// A list of values with the given inner type.
    List(Box<DataType>),
}

impl DataType {
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
        )
    }

    pub const fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date32 | DataType::Date64)
    }

    /// Type of the values backing this type.
    ///
    /// Temporal types are stored as integers, every other type is its own
    /// physical type.
    pub fn physical(&self) -> DataType {
        match self {
            DataType::Date32 => DataType::Int32,
            DataType::Date64 => DataType::Int64,
            other => other.clone(),
        }
    }

    /// Width in bits for numeric types.
    const fn bit_width(&self) -> u32 {
        match self {
            DataType::UInt8 | DataType::Int8 => 8,
            DataType::UInt16 | DataType::Int16 => 16,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 32,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 64,
            _ => 0,
        }
    }

    /// Get the inner type of a list.
    pub fn try_list_inner(&self) -> Result<&DataType> {
        match self {
            DataType::List(inner) => Ok(inner),
            other => Err(DbError::type_mismatch("Expected a list type")
                .with_field("datatype", other)),
        }
    }

    /// Find the numeric type both `self` and `other` can be cast to without
    /// going out of range.
    ///
    /// Integers mixed with floats, and `u64` mixed with a signed integer, are
    /// widened to a float, which may lose precision but never range.
    ///
    /// Returns None if either side isn't numeric.
    pub fn numeric_supertype(&self, other: &DataType) -> Option<DataType> {
        if !self.is_numeric() || !other.is_numeric() {
            return None;
        }
        if self == other {
            return Some(self.clone());
        }

        if self.is_float() || other.is_float() {
            let fits_f32 = |dt: &DataType| {
                *dt == DataType::Float32 || (dt.is_integer() && dt.bit_width() <= 16)
            };
            if fits_f32(self) && fits_f32(other) {
                return Some(DataType::Float32);
            }
            return Some(DataType::Float64);
        }

        let width = u32::max(self.bit_width(), other.bit_width());
        // Mixed signedness needs a signed type wider than the unsigned one.
        let (signed, unsigned) = match (self.is_signed_integer(), other.is_signed_integer()) {
            (false, false) => return Some(Self::unsigned_with_width(width)),
            (true, true) => return Some(Self::signed_with_width(width)),
            (true, false) => (self, other),
            (false, true) => (other, self),
        };

        if signed.bit_width() > unsigned.bit_width() {
            Some(signed.clone())
        } else if unsigned.bit_width() < 64 {
            Some(Self::signed_with_width(unsigned.bit_width() * 2))
        } else {
            // No signed integer holds every u64.
            Some(DataType::Float64)
        }
    }

    const fn signed_with_width(width: u32) -> DataType {
        match width {
            8 => DataType::Int8,
            16 => DataType::Int16,
            32 => DataType::Int32,
            _ => DataType::Int64,
        }
    }

    const fn unsigned_with_width(width: u32) -> DataType {
        match width {
            8 => DataType::UInt8,
            16 => DataType::UInt16,
            32 => DataType::UInt32,
            _ => DataType::UInt64,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "bool"),
            Self::UInt8 => write!(f, "u8"),
            Self::UInt16 => write!(f, "u16"),
            Self::UInt32 => write!(f, "u32"),
            Self::UInt64 => write!(f, "u64"),
            Self::Int8 => write!(f, "i8"),
            Self::Int16 => write!(f, "i16"),
            Self::Int32 => write!(f, "i32"),
            Self::Int64 => write!(f, "i64"),
            Self::Float32 => write!(f, "f32"),
            Self::Float64 => write!(f, "f64"),
            Self::Utf8 => write!(f, "str"),
            Self::Date32 => write!(f, "date32"),
            Self::Date64 => write!(f, "date64"),
            Self::List(inner) => write!(f, "list[{inner}]"),
        }
    }
}
