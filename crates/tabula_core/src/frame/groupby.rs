use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use tabula_error::{DbError, Result};
use tracing::trace;

use super::DataFrame;
use crate::arrays::HASH_RANDOM_STATE;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::arrays::series::Series;
use crate::config::DEFAULT_MAX_GROUP_COUNT;
use crate::expr::eval::evaluate_grouped;
use crate::expr::{AggKind, Expr};

/// Rows of a frame partitioned by the values of one or more key columns.
///
/// Groups are kept in the order their key first appears in the frame.
#[derive(Debug, Clone)]
pub struct GroupBy<'a> {
    df: &'a DataFrame,
    keys: Vec<String>,
    /// (first row index, all row indices) for each group.
    groups: Vec<(usize, Vec<usize>)>,
}

impl DataFrame {
    pub fn groupby<S: AsRef<str>>(&self, keys: &[S]) -> Result<GroupBy<'_>> {
        self.groupby_with_limit(keys, DEFAULT_MAX_GROUP_COUNT)
    }

    /// Group rows, erroring if more than `max_groups` distinct keys are found.
    pub fn groupby_with_limit<S: AsRef<str>>(
        &self,
        keys: &[S],
        max_groups: usize,
    ) -> Result<GroupBy<'_>> {
        let key_columns = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                self.column(key).map_err(|_| {
                    DbError::context("Missing group by key").with_field("key", key)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut table: IndexMap<Vec<ScalarValue>, Vec<usize>, _> =
            IndexMap::with_hasher(HASH_RANDOM_STATE);
        let mut iters: Vec<_> = key_columns.iter().map(|c| c.scalar_iter()).collect();

        for row in 0..self.height() {
            let key: Vec<ScalarValue> = iters
                .iter_mut()
                .map(|iter| iter.next().unwrap_or(ScalarValue::Null))
                .collect();

            let num_groups = table.len();
            match table.entry(key) {
                Entry::Occupied(mut ent) => ent.get_mut().push(row),
                Entry::Vacant(ent) => {
                    if num_groups >= max_groups {
                        return Err(DbError::invalid_input("Too many groups")
                            .with_field("max_group_count", max_groups));
                    }
                    ent.insert(vec![row]);
                }
            }
        }

        trace!(rows = self.height(), groups = table.len(), "computed groups");

        let groups = table
            .into_values()
            .map(|rows| (rows[0], rows))
            .collect();

        Ok(GroupBy {
            df: self,
            keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
            groups,
        })
    }
}

impl GroupBy<'_> {
    /// (first row index, all row indices) for each group.
    pub fn groups(&self) -> &[(usize, Vec<usize>)] {
        &self.groups
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// One row per group holding the key values.
    pub fn key_frame(&self) -> Result<DataFrame> {
        let first: Vec<_> = self.groups.iter().map(|(first, _)| *first).collect();
        let columns = self
            .keys
            .iter()
            .map(|key| {
                let column = self.df.column(key)?;
                // SAFETY: First indices are rows of the frame.
                Ok(unsafe { column.take_unchecked(first.iter().copied(), first.len()) })
            })
            .collect::<Result<Vec<_>>>()?;
        DataFrame::new(columns)
    }

    /// Evaluate expressions per group.
    ///
    /// The output holds the key columns followed by one column per
    /// expression. A key referenced without an aggregate produces a list
    /// column named `{key}_list`.
    pub fn agg(&self, exprs: &[Expr]) -> Result<DataFrame> {
        self.agg_with_parallelism(exprs, false)
    }

    pub(crate) fn agg_with_parallelism(&self, exprs: &[Expr], parallel: bool) -> Result<DataFrame> {
        let evaluated = if parallel {
            exprs
                .par_iter()
                .map(|expr| evaluate_grouped(expr, self.df, &self.groups))
                .collect::<Result<Vec<_>>>()?
        } else {
            exprs
                .iter()
                .map(|expr| evaluate_grouped(expr, self.df, &self.groups))
                .collect::<Result<Vec<_>>>()?
        };

        let columns: Vec<_> = exprs
            .iter()
            .zip(evaluated)
            .map(|(expr, mut column)| {
                let is_key = self.keys.iter().any(|key| key == column.name());
                if is_key && !expr.has_aggregation() && !matches!(expr, Expr::Alias(..)) {
                    let name = format!("{}_list", column.name());
                    column.rename(name);
                }
                column
            })
            .collect();

        self.key_frame()?.hstack(&columns)
    }

    /// Spread the values of `values_column` into one column per distinct
    /// value of `pivot_column`.
    pub fn pivot(&self, pivot_column: &str, values_column: &str) -> Result<Pivot<'_>> {
        self.df.column(pivot_column)?;
        self.df.column(values_column)?;
        Ok(Pivot {
            groupby: self,
            pivot_column: pivot_column.to_string(),
            values_column: values_column.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Pivot<'a> {
    groupby: &'a GroupBy<'a>,
    pivot_column: String,
    values_column: String,
}

impl Pivot<'_> {
    pub fn sum(&self) -> Result<DataFrame> {
        self.execute(AggKind::Sum)
    }

    pub fn min(&self) -> Result<DataFrame> {
        self.execute(AggKind::Min)
    }

    pub fn max(&self) -> Result<DataFrame> {
        self.execute(AggKind::Max)
    }

    pub fn mean(&self) -> Result<DataFrame> {
        self.execute(AggKind::Mean)
    }

    pub fn median(&self) -> Result<DataFrame> {
        self.execute(AggKind::Median)
    }

    pub fn first(&self) -> Result<DataFrame> {
        self.execute(AggKind::First)
    }

    pub fn last(&self) -> Result<DataFrame> {
        self.execute(AggKind::Last)
    }

    pub fn count(&self) -> Result<DataFrame> {
        self.execute(AggKind::Count)
    }

    fn execute(&self, kind: AggKind) -> Result<DataFrame> {
        let df = self.groupby.df;
        let pivot = df.column(&self.pivot_column)?;
        let values = df.column(&self.values_column)?;
        let dtype: DataType = kind.output_dtype(values.dtype())?;

        let pivot_values: Vec<ScalarValue> = pivot.scalar_iter().collect();
        let mut distinct: IndexSet<&ScalarValue, _> = IndexSet::with_hasher(HASH_RANDOM_STATE);
        for value in &pivot_values {
            distinct.insert(value);
        }

        let mut outputs: Vec<Vec<ScalarValue>> =
            vec![Vec::with_capacity(self.groupby.groups.len()); distinct.len()];
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); distinct.len()];

        for (_, rows) in &self.groupby.groups {
            for bucket in buckets.iter_mut() {
                bucket.clear();
            }
            for &row in rows {
                if let Some(idx) = distinct.get_index_of(&pivot_values[row]) {
                    buckets[idx].push(row);
                }
            }

            for (bucket, output) in buckets.iter().zip(outputs.iter_mut()) {
                if bucket.is_empty() {
                    output.push(ScalarValue::Null);
                    continue;
                }
                // SAFETY: Bucket indices are rows of the frame.
                let part = unsafe { values.take_unchecked(bucket.iter().copied(), bucket.len()) };
                output.push(kind.apply(&part)?);
            }
        }

        trace!(
            groups = self.groupby.groups.len(),
            pivot_values = distinct.len(),
            agg = %kind,
            "computed pivot"
        );

        let columns = distinct
            .iter()
            .zip(&outputs)
            .map(|(name, values)| Series::from_scalars(&name.to_string(), &dtype, values))
            .collect::<Result<Vec<_>>>()?;

        self.groupby.key_frame()?.hstack(&columns)
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::series::NamedFrom;
    use crate::expr::col;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("k", &["x", "y", "x", "z", "y"]),
            Series::new("p", &["a", "a", "b", "b", "a"]),
            Series::new("v", &[1i64, 2, 3, 4, 5]),
        ])
        .unwrap()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let df = frame();
        let gb = df.groupby(&["k"]).unwrap();
        assert_eq!(
            &[(0, vec![0, 2]), (1, vec![1, 4]), (3, vec![3])],
            gb.groups()
        );

        let keys = gb.key_frame().unwrap();
        assert_eq!(&Series::new("k", &["x", "y", "z"]), keys.column("k").unwrap());
    }

    #[test]
    fn multi_column_keys() {
        let df = frame();
        let gb = df.groupby(&["k", "p"]).unwrap();
        assert_eq!(4, gb.groups().len());
    }

    #[test]
    fn missing_key() {
        let err = frame().groupby(&["nope"]).unwrap_err();
        assert_eq!(ErrorKind::Context, err.kind());
    }

    #[test]
    fn group_limit() {
        let err = frame().groupby_with_limit(&["k"], 2).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
        assert!(frame().groupby_with_limit(&["k"], 3).is_ok());
    }

    #[test]
    fn agg_keys_first() {
        let df = frame();
        let out = df
            .groupby(&["k"])
            .unwrap()
            .agg(&[col("v").sum(), col("v").count().alias("n")])
            .unwrap();
        assert_eq!(vec!["k", "v_sum", "n"], out.get_column_names());
        assert_eq!(&Series::new("", &[4i64, 7, 4]), out.column("v_sum").unwrap());
        assert_eq!(&Series::new("", &[2u32, 2, 1]), out.column("n").unwrap());
    }

    #[test]
    fn agg_key_without_aggregate() {
        let df = frame();
        let gb = df.groupby(&["k"]).unwrap();
        let out = gb.agg(&[col("k"), col("v").first()]).unwrap();
        assert_eq!(vec!["k", "k_list", "v_first"], out.get_column_names());
        assert_eq!(
            ScalarValue::List(Series::new("", &["x", "x"])),
            out.column("k_list").unwrap().get(0).unwrap()
        );

        // An explicit alias onto a key name still clashes.
        let err = gb.agg(&[col("v").sum().alias("k")]).unwrap_err();
        assert_eq!(ErrorKind::Construction, err.kind());
    }

    #[test]
    fn pivot_sum() {
        let df = frame();
        let gb = df.groupby(&["k"]).unwrap();
        let out = gb.pivot("p", "v").unwrap().sum().unwrap();
        assert_eq!(vec!["k", "a", "b"], out.get_column_names());
        assert_eq!(
            &Series::new("", &[Some(1i64), Some(7), None]),
            out.column("a").unwrap()
        );
        assert_eq!(
            &Series::new("", &[Some(3i64), None, Some(4)]),
            out.column("b").unwrap()
        );

        let out = gb.pivot("p", "v").unwrap().count().unwrap();
        assert_eq!(
            &Series::new("", &[Some(1u32), Some(2), None]),
            out.column("a").unwrap()
        );
    }

    #[test]
    fn pivot_missing_column() {
        let df = frame();
        let gb = df.groupby(&["k"]).unwrap();
        let err = gb.pivot("p", "missing").unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());
    }
}
