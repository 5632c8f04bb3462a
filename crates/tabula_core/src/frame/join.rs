use std::fmt;

use hashbrown::HashMap;
use tabula_error::Result;
use tracing::trace;

use super::DataFrame;
use crate::arrays::HASH_RANDOM_STATE;
use crate::arrays::bitmap::Bitmap;
use crate::arrays::chunked_array::BooleanChunked;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::arrays::series::arithmetic::coerce_operands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Rows with a match on both sides.
    Inner,
    /// Every left row, with nulls where the right side has no match.
    Left,
    /// Every row of both sides. Unmatched right rows follow the left rows
    /// with nulls in the left columns.
    Outer,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Outer => write!(f, "OUTER"),
        }
    }
}

impl DataFrame {
    /// Hash join on a single key column per side.
    ///
    /// The right side is hashed, left rows look it up in row order. Null
    /// keys never match. The right key column is dropped from the output,
    /// other right columns whose name clashes with a left column get a
    /// `_right` suffix.
    ///
    /// For an outer join the left key column holds the right key for rows
    /// only found on the right side.
    pub fn join(
        &self,
        other: &DataFrame,
        left_on: &str,
        right_on: &str,
        how: JoinType,
    ) -> Result<DataFrame> {
        let left_key = self.column(left_on)?;
        let right_key = other.column(right_on)?;
        let (left_key, right_key) = coerce_operands("join", left_key, right_key)?;

        let mut table: HashMap<ScalarValue, Vec<usize>, _> =
            HashMap::with_hasher(HASH_RANDOM_STATE);
        for (idx, key) in right_key.scalar_iter().enumerate() {
            if key.is_null() {
                continue;
            }
            table.entry(key).or_default().push(idx);
        }

        let mut matched: Bitmap = std::iter::repeat_n(false, other.height()).collect();
        let mut left_indices = Vec::with_capacity(self.height());
        let mut right_indices = Vec::with_capacity(self.height());
        for (idx, key) in left_key.scalar_iter().enumerate() {
            let matches = if key.is_null() { None } else { table.get(&key) };
            match matches {
                Some(rows) => {
                    for &row in rows {
                        left_indices.push(Some(idx));
                        right_indices.push(Some(row));
                        matched.set_unchecked(row, true);
                    }
                }
                None if how != JoinType::Inner => {
                    left_indices.push(Some(idx));
                    right_indices.push(None);
                }
                None => (),
            }
        }

        if how == JoinType::Outer {
            matched.bit_negate();
            for row in matched.index_iter() {
                left_indices.push(None);
                right_indices.push(Some(row));
            }
        }

        trace!(
            %how,
            build_rows = other.height(),
            lookup_rows = self.height(),
            output_rows = left_indices.len(),
            "hash join"
        );

        let mut columns = Vec::with_capacity(self.width() + other.width());
        for column in self.columns() {
            if how == JoinType::Outer && column.name() == left_on {
                let from_left = BooleanChunked::from_values_iter(
                    "",
                    DataType::Boolean,
                    left_indices.iter().map(Option::is_some),
                );
                let left = left_key.take_opt(&left_indices)?;
                let right = right_key.take_opt(&right_indices)?;
                columns.push(left.zip_with(&from_left, &right)?);
                continue;
            }
            columns.push(column.take_opt(&left_indices)?);
        }
        for column in other.columns() {
            if column.name() == right_on {
                continue;
            }
            let mut taken = column.take_opt(&right_indices)?;
            if self.column_index(column.name()).is_some() {
                taken.rename(format!("{}_right", column.name()));
            }
            columns.push(taken);
        }

        DataFrame::new(columns)
    }
}
