//! Value conversions between chunked array types.
//!
//! Values that can't be represented in the target type become null.

use std::fmt::Write as _;

use num_traits::NumCast;
use tabula_error::Result;

use super::{BooleanChunked, PrimitiveChunked, Utf8Chunked, Utf8ChunkedBuilder};
use crate::arrays::datatype::DataType;
use crate::arrays::native::NativeType;

impl<T: NativeType> PrimitiveChunked<T> {
    pub fn cast_numeric<U: NativeType>(&self) -> PrimitiveChunked<U> {
        PrimitiveChunked::<U>::from_options_iter(
            self.name(),
            U::DATATYPE,
            self.iter().map(|v| v.and_then(<U as NumCast>::from)),
        )
    }

    /// Non-zero values are true.
    pub fn cast_to_bool(&self) -> BooleanChunked {
        BooleanChunked::from_options_iter(
            self.name(),
            DataType::Boolean,
            self.iter().map(|v| v.map(|v| v != T::zero())),
        )
    }

    pub fn cast_to_utf8(&self) -> Result<Utf8Chunked> {
        let mut builder = Utf8ChunkedBuilder::with_capacity(self.name(), self.len());
        let mut buf = String::new();
        for v in self.iter() {
            match v {
                Some(v) => {
                    buf.clear();
                    write!(buf, "{v}")?;
                    builder.append_value(&buf);
                }
                None => builder.append_null(),
            }
        }
        Ok(builder.finish())
    }
}

impl BooleanChunked {
    pub fn cast_numeric<U: NativeType>(&self) -> PrimitiveChunked<U> {
        PrimitiveChunked::<U>::from_options_iter(
            self.name(),
            U::DATATYPE,
            self.iter().map(|v| v.and_then(|v| <U as NumCast>::from(v as u8))),
        )
    }

    pub fn cast_to_utf8(&self) -> Utf8Chunked {
        Utf8Chunked::from_options_iter(
            self.name(),
            DataType::Utf8,
            self.iter()
                .map(|v| v.map(|v| if v { "true" } else { "false" })),
        )
    }
}

impl Utf8Chunked {
    /// Parse strings as numbers, unparseable strings become null.
    pub fn cast_numeric<U: NativeType>(&self) -> PrimitiveChunked<U> {
        PrimitiveChunked::<U>::from_options_iter(
            self.name(),
            U::DATATYPE,
            self.iter().map(|v| v.and_then(|s| s.parse::<U>().ok())),
        )
    }

    /// Parse "true" and "false", anything else becomes null.
    pub fn cast_to_bool(&self) -> BooleanChunked {
        BooleanChunked::from_options_iter(
            self.name(),
            DataType::Boolean,
            self.iter().map(|v| match v {
                Some("true") => Some(true),
                Some("false") => Some(false),
                _ => None,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::chunked_array::{Float64Chunked, Int32Chunked, Int64Chunked, UInt8Chunked};

    #[test]
    fn numeric_out_of_range_is_null() {
        let ca = Int32Chunked::from_options("a", &[Some(1), Some(-1), Some(300), None]);
        let out: UInt8Chunked = ca.cast_numeric();
        assert_eq!(&DataType::UInt8, out.dtype());
        assert_eq!(
            vec![Some(1), None, None, None],
            out.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn float_to_int_truncates() {
        let ca = Float64Chunked::from_slice("a", &[1.9, -2.5, f64::NAN]);
        let out: Int32Chunked = ca.cast_numeric();
        assert_eq!(
            vec![Some(1), Some(-2), None],
            out.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn primitive_to_bool_and_utf8() {
        let ca = Int32Chunked::from_options("a", &[Some(0), Some(5), None]);
        assert_eq!(
            vec![Some(false), Some(true), None],
            ca.cast_to_bool().iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some("0"), Some("5"), None],
            ca.cast_to_utf8().unwrap().iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn utf8_parsing() {
        let ca = Utf8Chunked::from_options("s", &[Some("12"), Some("x"), None]);
        let out: Int64Chunked = ca.cast_numeric();
        assert_eq!(vec![Some(12), None, None], out.iter().collect::<Vec<_>>());

        let ca = Utf8Chunked::from_slice("s", &["true", "false", "yes"]);
        assert_eq!(
            vec![Some(true), Some(false), None],
            ca.cast_to_bool().iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn bool_to_numeric() {
        let ca = BooleanChunked::from_options("b", &[Some(true), Some(false), None]);
        let out: Float64Chunked = ca.cast_numeric();
        assert_eq!(
            vec![Some(1.0), Some(0.0), None],
            out.iter().collect::<Vec<_>>()
        );
        assert_eq!(
            vec![Some("true"), Some("false"), None],
            ca.cast_to_utf8().iter().collect::<Vec<_>>()
        );
    }
}
