use chrono::{NaiveDate, NaiveDateTime};
use tabula_error::Result;

use super::Series;
use super::temporal::{naive_date_to_date32, naive_datetime_to_date64};
use crate::arrays::chunked_array::{
    BooleanChunked, Int32Chunked, Int64Chunked, ListChunkedBuilder, PrimitiveChunked,
    Utf8Chunked,
};
use crate::arrays::datatype::DataType;

/// Construct a named series from native values.
///
/// The `Phantom` parameter only disambiguates the element type so that a
/// single `Series::new` works for slices, arrays and vecs of every supported
/// kind.
pub trait NamedFrom<T, Phantom: ?Sized> {
    fn new(name: &str, values: T) -> Self;
}

macro_rules! impl_named_from_native {
    ($($native:ty),*) => {
        $(
            impl<T: AsRef<[$native]>> NamedFrom<T, [$native]> for Series {
                fn new(name: &str, values: T) -> Self {
                    PrimitiveChunked::<$native>::from_slice(name, values.as_ref()).into()
                }
            }

            impl<T: AsRef<[Option<$native>]>> NamedFrom<T, [Option<$native>]> for Series {
                fn new(name: &str, values: T) -> Self {
                    PrimitiveChunked::<$native>::from_options(name, values.as_ref()).into()
                }
            }
        )*
    };
}

impl_named_from_native!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl<T: AsRef<[bool]>> NamedFrom<T, [bool]> for Series {
    fn new(name: &str, values: T) -> Self {
        BooleanChunked::from_slice(name, values.as_ref()).into()
    }
}

impl<T: AsRef<[Option<bool>]>> NamedFrom<T, [Option<bool>]> for Series {
    fn new(name: &str, values: T) -> Self {
        BooleanChunked::from_options(name, values.as_ref()).into()
    }
}

impl<'a, T: AsRef<[&'a str]>> NamedFrom<T, [&'a str]> for Series {
    fn new(name: &str, values: T) -> Self {
        Utf8Chunked::from_slice(name, values.as_ref()).into()
    }
}

impl<'a, T: AsRef<[Option<&'a str>]>> NamedFrom<T, [Option<&'a str>]> for Series {
    fn new(name: &str, values: T) -> Self {
        Utf8Chunked::from_options(name, values.as_ref()).into()
    }
}

impl<T: AsRef<[String]>> NamedFrom<T, [String]> for Series {
    fn new(name: &str, values: T) -> Self {
        Utf8Chunked::from_slice(name, values.as_ref()).into()
    }
}

impl<T: AsRef<[Option<String>]>> NamedFrom<T, [Option<String>]> for Series {
    fn new(name: &str, values: T) -> Self {
        Utf8Chunked::from_options(name, values.as_ref()).into()
    }
}

impl<T: AsRef<[NaiveDate]>> NamedFrom<T, [NaiveDate]> for Series {
    fn new(name: &str, values: T) -> Self {
        let days = values.as_ref().iter().copied().map(naive_date_to_date32);
        Int32Chunked::from_values_iter(name, DataType::Date32, days).into()
    }
}

impl<T: AsRef<[Option<NaiveDate>]>> NamedFrom<T, [Option<NaiveDate>]> for Series {
    fn new(name: &str, values: T) -> Self {
        let days = values.as_ref().iter().map(|v| v.map(naive_date_to_date32));
        Int32Chunked::from_options_iter(name, DataType::Date32, days).into()
    }
}

impl<T: AsRef<[NaiveDateTime]>> NamedFrom<T, [NaiveDateTime]> for Series {
    fn new(name: &str, values: T) -> Self {
        let millis = values.as_ref().iter().copied().map(naive_datetime_to_date64);
        Int64Chunked::from_values_iter(name, DataType::Date64, millis).into()
    }
}

impl<T: AsRef<[Option<NaiveDateTime>]>> NamedFrom<T, [Option<NaiveDateTime>]> for Series {
    fn new(name: &str, values: T) -> Self {
        let millis = values.as_ref().iter().map(|v| v.map(naive_datetime_to_date64));
        Int64Chunked::from_options_iter(name, DataType::Date64, millis).into()
    }
}

impl Series {
    /// Create a list series, one list per input series.
    ///
    /// The inner type is taken from the first series, an empty input creates
    /// a list of booleans. Errors if the series don't all have the same type.
    pub fn try_new_list(name: &str, values: &[Series]) -> Result<Series> {
        let inner = values
            .first()
            .map(|s| s.dtype().clone())
            .unwrap_or(DataType::Boolean);

        let mut builder = ListChunkedBuilder::new(name, inner, values.len());
        for series in values {
            builder.append_value(series)?;
        }
        Ok(builder.finish().into())
    }
}

/// Create a list series, see [`Series::try_new_list`].
///
/// # Panics
///
/// Panics if the series don't all have the same type.
impl<T: AsRef<[Series]>> NamedFrom<T, [Series]> for Series {
    fn new(name: &str, values: T) -> Self {
        match Series::try_new_list(name, values.as_ref()) {
            Ok(series) => series,
            Err(e) => panic!("Cannot create list series: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::scalar::ScalarValue;

    #[test]
    fn native_slices_and_vecs() {
        let s = Series::new("a", &[1u16, 2]);
        assert_eq!(&DataType::UInt16, s.dtype());

        let s = Series::new("a", vec![Some(1.5f32), None]);
        assert_eq!(&DataType::Float32, s.dtype());
        assert_eq!(1, s.null_count());
    }

    #[test]
    fn strings() {
        let s = Series::new("s", &["a", "b"]);
        assert_eq!(&DataType::Utf8, s.dtype());

        let owned = vec![Some("a".to_string()), None];
        let s = Series::new("s", &owned);
        assert_eq!(ScalarValue::Null, s.get(1).unwrap());
        assert_eq!(ScalarValue::from("a"), s.get(0).unwrap());
    }

    #[test]
    fn bools() {
        let s = Series::new("b", &[Some(true), None]);
        assert_eq!(&DataType::Boolean, s.dtype());
        assert_eq!(1, s.null_count());
    }

    #[test]
    fn list_of_mixed_series_errors() {
        let err = Series::try_new_list(
            "l",
            &[Series::new("", &[1i32]), Series::new("", &["a"])],
        )
        .unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());

        let empty = Series::try_new_list("l", &[]).unwrap();
        assert_eq!(&DataType::List(Box::new(DataType::Boolean)), empty.dtype());
        assert_eq!(0, empty.len());
    }

    #[test]
    fn list_of_series() {
        let s = Series::new(
            "l",
            &[Series::new("", &[1i32, 2]), Series::new("", &[3i32])],
        );
        assert_eq!(&DataType::List(Box::new(DataType::Int32)), s.dtype());
        assert_eq!(
            ScalarValue::List(Series::new("", &[3i32])),
            s.get(1).unwrap()
        );
    }
}
