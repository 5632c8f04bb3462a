use tabula_error::{DbError, Result};

use super::ChunkedArray;
use crate::arrays::bitmap::Bitmap;
use crate::arrays::chunk::{Chunk, ChunkValues, ListValues, Utf8Values};
use crate::arrays::datatype::DataType;
use crate::arrays::native::NativeType;
use crate::arrays::series::Series;
use crate::buffer::AlignedVec;

/// Incrementally builds a single chunk array.
///
/// The validity bitmap is only allocated once the first null is appended.
#[derive(Debug)]
pub struct ChunkedBuilder<V: ChunkValues> {
    name: String,
    dtype: DataType,
    values: V,
    validity: Option<Bitmap>,
}

pub type PrimitiveChunkedBuilder<T> = ChunkedBuilder<AlignedVec<T>>;
pub type BooleanChunkedBuilder = ChunkedBuilder<Bitmap>;
pub type Utf8ChunkedBuilder = ChunkedBuilder<Utf8Values>;

impl<V: ChunkValues> ChunkedBuilder<V> {
    pub fn new(name: impl Into<String>, dtype: DataType, capacity: usize) -> Self {
        let values = V::with_capacity(&dtype, capacity);
        ChunkedBuilder {
            name: name.into(),
            dtype,
            values,
            validity: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn append_value(&mut self, value: V::Item<'_>) {
        self.values.push_value(value);
        if let Some(validity) = &mut self.validity {
            validity.push(true);
        }
    }

    #[inline]
    pub fn append_null(&mut self) {
        let len = self.values.len();
        let validity = self
            .validity
            .get_or_insert_with(|| Bitmap::new_with_all_true(len));
        validity.push(false);
        self.values.push_null();
    }

    #[inline]
    pub fn append_option(&mut self, value: Option<V::Item<'_>>) {
        match value {
            Some(value) => self.append_value(value),
            None => self.append_null(),
        }
    }

    pub fn append_values<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = V::Item<'a>>,
    {
        for value in values {
            self.append_value(value);
        }
    }

    /// Seal the builder into a single chunk array.
    pub fn finish(self) -> ChunkedArray<V> {
        let chunk = Chunk::from_parts(self.values, self.validity);
        ChunkedArray::from_chunk(self.name, self.dtype, chunk)
    }
}

impl<T: NativeType> PrimitiveChunkedBuilder<T> {
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, T::DATATYPE, capacity)
    }

    pub fn append_slice(&mut self, values: &[T]) {
        self.values.extend_from_slice(values);
        if let Some(validity) = &mut self.validity {
            validity.extend(std::iter::repeat_n(true, values.len()));
        }
    }
}

impl BooleanChunkedBuilder {
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, DataType::Boolean, capacity)
    }
}

impl Utf8ChunkedBuilder {
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self::new(name, DataType::Utf8, capacity)
    }
}

/// Builder for list arrays, checks that every appended series has the
/// expected inner type.
#[derive(Debug)]
pub struct ListChunkedBuilder {
    inner_dtype: DataType,
    builder: ChunkedBuilder<ListValues>,
}

impl ListChunkedBuilder {
    pub fn new(name: impl Into<String>, inner_dtype: DataType, capacity: usize) -> Self {
        let dtype = DataType::List(Box::new(inner_dtype.clone()));
        ListChunkedBuilder {
            inner_dtype,
            builder: ChunkedBuilder::new(name, dtype, capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.builder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builder.is_empty()
    }

    pub fn append_value(&mut self, series: &Series) -> Result<()> {
        if series.dtype() != &self.inner_dtype {
            return Err(
                DbError::type_mismatch("List value has unexpected type")
                    .with_field("expected", &self.inner_dtype)
                    .with_field("got", series.dtype()),
            );
        }
        self.builder.append_value(series);
        Ok(())
    }

    pub fn append_null(&mut self) {
        self.builder.append_null()
    }

    pub fn append_option(&mut self, series: Option<&Series>) -> Result<()> {
        match series {
            Some(series) => self.append_value(series),
            None => {
                self.append_null();
                Ok(())
            }
        }
    }

    pub fn finish(self) -> ChunkedArray<ListValues> {
        self.builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::series::NamedFrom;

    #[test]
    fn primitive_round_trip_with_nulls() {
        let mut builder = PrimitiveChunkedBuilder::<i32>::with_capacity("a", 4);
        builder.append_value(1);
        builder.append_null();
        builder.append_option(Some(3));
        builder.append_slice(&[4, 5]);

        let ca = builder.finish();
        assert_eq!(1, ca.n_chunks());
        assert_eq!(1, ca.null_count());
        assert_eq!(
            vec![Some(1), None, Some(3), Some(4), Some(5)],
            ca.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn no_nulls_has_no_bitmap() {
        let mut builder = BooleanChunkedBuilder::with_capacity("b", 2);
        builder.append_values([true, false]);
        let ca = builder.finish();

        assert_eq!(vec![(0, None)], ca.get_bitmap());
    }

    #[test]
    fn utf8_round_trip() {
        let mut builder = Utf8ChunkedBuilder::with_capacity("s", 3);
        builder.append_value("a");
        builder.append_null();
        builder.append_value("ccc");

        let ca = builder.finish();
        assert_eq!(
            vec![Some("a"), None, Some("ccc")],
            ca.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn list_checks_inner_type() {
        let mut builder = ListChunkedBuilder::new("l", DataType::Int32, 2);
        builder
            .append_value(&Series::new("", &[1i32, 2]))
            .unwrap();
        builder.append_null();

        let err = builder
            .append_value(&Series::new("", &["a"]))
            .unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());

        let ca = builder.finish();
        assert_eq!(2, ca.len());
        assert_eq!(1, ca.null_count());
        assert_eq!(&DataType::Int32, ca.inner_dtype());
    }
}
