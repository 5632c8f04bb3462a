use tabula_error::{DbError, Result};

use super::{Series, match_numeric, with_native_type};
use crate::arrays::chunked_array::ListChunkedBuilder;
use crate::arrays::datatype::DataType;

impl Series {
    /// Cast the series to another type.
    ///
    /// Numbers cast between each other, to and from bools, and to strings.
    /// Strings parse to numbers and bools. Lists cast their inner values.
    /// Values that don't fit or don't parse become null.
    pub fn cast(&self, dtype: &DataType) -> Result<Series> {
        if self.dtype() == dtype {
            return Ok(self.clone());
        }
        if self.dtype().is_temporal() || dtype.is_temporal() {
            return self.cast_temporal(dtype);
        }

        let unsupported = || {
            DbError::type_mismatch("Unsupported cast")
                .with_field("from", self.dtype())
                .with_field("to", dtype)
        };

        let series: Series = match (self, dtype) {
            (Series::List(ca), DataType::List(inner)) => {
                let mut builder =
                    ListChunkedBuilder::new(ca.name(), inner.as_ref().clone(), ca.len());
                for v in ca.iter() {
                    match v {
                        Some(v) => builder.append_value(&v.cast(inner)?)?,
                        None => builder.append_null(),
                    }
                }
                builder.finish().into()
            }
            (Series::List(_), _) | (_, DataType::List(_)) => return Err(unsupported()),
            (Series::Boolean(ca), DataType::Utf8) => ca.cast_to_utf8().into(),
            (Series::Boolean(ca), dtype) => with_native_type!(dtype, T => {
                ca.cast_numeric::<T>().into()
            }, _ => return Err(unsupported())),
            (Series::Utf8(ca), DataType::Boolean) => ca.cast_to_bool().into(),
            (Series::Utf8(ca), dtype) => with_native_type!(dtype, T => {
                ca.cast_numeric::<T>().into()
            }, _ => return Err(unsupported())),
            (numeric, DataType::Boolean) => match_numeric!(numeric, ca => {
                ca.cast_to_bool().into()
            }, _ => return Err(unsupported())),
            (numeric, DataType::Utf8) => match_numeric!(numeric, ca => {
                ca.cast_to_utf8()?.into()
            }, _ => return Err(unsupported())),
            (numeric, dtype) => match_numeric!(numeric, ca => {
                with_native_type!(dtype, T => {
                    ca.cast_numeric::<T>().into()
                }, _ => return Err(unsupported()))
            }, _ => return Err(unsupported())),
        };

        Ok(series)
    }
}
