//! Ordered collections of equal length, uniquely named series.

pub mod groupby;
pub mod join;

use std::collections::HashSet;

use tabula_error::{DbError, Result};

use crate::arrays::series::Series;
use crate::lazy::LazyFrame;

#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    columns: Vec<Series>,
}

impl DataFrame {
    /// Create a frame from columns.
    ///
    /// Errors if the columns differ in length or share a name.
    pub fn new(columns: Vec<Series>) -> Result<Self> {
        if let Some(first) = columns.first() {
            for column in &columns[1..] {
                if column.len() != first.len() {
                    return Err(DbError::construction("Columns have different lengths")
                        .with_field(first.name().to_string(), first.len())
                        .with_field(column.name().to_string(), column.len()));
                }
            }
        }

        let mut names = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !names.insert(column.name()) {
                return Err(DbError::construction("Duplicate column name")
                    .with_field("name", column.name()));
            }
        }

        Ok(DataFrame { columns })
    }

    pub fn empty() -> Self {
        DataFrame::default()
    }

    pub fn height(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.column_index(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| DbError::resolution(name))
    }

    /// Create a frame from a subset of the columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<DataFrame> {
        let columns = names
            .iter()
            .map(|name| self.column(name.as_ref()).cloned())
            .collect::<Result<Vec<_>>>()?;
        DataFrame::new(columns)
    }

    /// Create a frame without the named column.
    pub fn drop(&self, name: &str) -> Result<DataFrame> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DbError::resolution(name))?;
        let mut columns = self.columns.clone();
        columns.remove(idx);
        Ok(DataFrame { columns })
    }

    /// Replace the column with the same name, or append it.
    pub fn with_column(&self, column: Series) -> Result<DataFrame> {
        if !self.columns.is_empty() && column.len() != self.height() {
            return Err(DbError::construction("Column length does not match frame height")
                .with_field("name", column.name())
                .with_field("len", column.len())
                .with_field("height", self.height()));
        }

        let mut columns = self.columns.clone();
        match self.column_index(column.name()) {
            Some(idx) => columns[idx] = column,
            None => columns.push(column),
        }
        Ok(DataFrame { columns })
    }

    /// Add columns to the right of the frame.
    pub fn hstack(&self, columns: &[Series]) -> Result<DataFrame> {
        let mut all = self.columns.clone();
        all.extend_from_slice(columns);
        DataFrame::new(all)
    }

    /// Append the rows of another frame.
    ///
    /// Columns are matched by position and must agree in name and type. The
    /// other frame's chunks are shared, not copied.
    pub fn vstack(&self, other: &DataFrame) -> Result<DataFrame> {
        if self.width() != other.width() {
            return Err(DbError::construction("Cannot stack frames of different widths")
                .with_field("left", self.width())
                .with_field("right", other.width()));
        }

        let mut columns = self.columns.clone();
        for (left, right) in columns.iter_mut().zip(&other.columns) {
            if left.name() != right.name() {
                return Err(DbError::construction("Cannot stack frames with different columns")
                    .with_field("left", left.name())
                    .with_field("right", right.name()));
            }
            left.append(right)?;
        }
        Ok(DataFrame { columns })
    }

    /// Keep the rows where the mask is true. Null counts as false.
    pub fn filter(&self, mask: &Series) -> Result<DataFrame> {
        let mask = mask.bool()?;
        let columns = self
            .columns
            .iter()
            .map(|c| c.filter(mask))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataFrame { columns })
    }

    pub fn take(&self, indices: &[usize]) -> Result<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.take(indices))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataFrame { columns })
    }

    /// Take rows by index, a `None` index produces a row of nulls.
    pub fn take_opt(&self, indices: &[Option<usize>]) -> Result<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.take_opt(indices))
            .collect::<Result<Vec<_>>>()?;
        Ok(DataFrame { columns })
    }

    /// Slice every column. A negative offset counts from the end.
    pub fn slice(&self, offset: i64, length: usize) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|c| c.slice(offset, length)).collect(),
        }
    }

    pub fn head(&self, n: usize) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|c| c.head(n)).collect(),
        }
    }

    pub fn tail(&self, n: usize) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|c| c.tail(n)).collect(),
        }
    }

    /// Sort all rows by a single column. Nulls sort last.
    pub fn sort(&self, by: &str, descending: bool) -> Result<DataFrame> {
        let indices = self.column(by)?.sort_indices(descending);
        let columns = self
            .columns
            .iter()
            // SAFETY: Sort indices are a permutation of the frame rows.
            .map(|c| unsafe { c.take_unchecked(indices.iter().copied(), indices.len()) })
            .collect();
        Ok(DataFrame { columns })
    }

    pub fn rechunk(&self) -> DataFrame {
        DataFrame {
            columns: self.columns.iter().map(|c| c.rechunk()).collect(),
        }
    }

    /// Check if both frames have the same columns with the same values.
    ///
    /// Nulls never compare equal, see `frame_equal_missing`.
    pub fn frame_equal(&self, other: &DataFrame) -> bool {
        self.frame_equal_inner(other, false)
    }

    /// Like `frame_equal`, with nulls at the same position comparing equal.
    pub fn frame_equal_missing(&self, other: &DataFrame) -> bool {
        self.frame_equal_inner(other, true)
    }

    fn frame_equal_inner(&self, other: &DataFrame, null_equal: bool) -> bool {
        self.shape() == other.shape()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.name() == b.name() && a.series_equal(b, null_equal))
    }

    pub fn lazy(self) -> LazyFrame {
        LazyFrame::new(self)
    }
}
