//! Deferred frame operations.
//!
//! A `LazyFrame` records operations and only runs them on `collect`. The
//! source frame and recorded operations are left untouched, collecting twice
//! produces the same result.

use std::fmt::{self, Write as _};

use rayon::prelude::*;
use tabula_error::Result;
use tracing::debug;

use crate::arrays::series::Series;
use crate::config::ExecutionConfig;
use crate::expr::Expr;
use crate::expr::eval::evaluate;
use crate::frame::DataFrame;
use crate::frame::join::JoinType;

#[derive(Debug, Clone)]
enum LazyOp {
    Select(Vec<Expr>),
    Filter(Expr),
    WithColumns(Vec<Expr>),
    Sort {
        by: String,
        descending: bool,
    },
    GroupByAgg {
        keys: Vec<String>,
        aggs: Vec<Expr>,
    },
    Join {
        other: Box<LazyFrame>,
        left_on: String,
        right_on: String,
        how: JoinType,
    },
    Slice {
        offset: i64,
        length: usize,
    },
    Drop(Vec<String>),
}

fn write_exprs(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (idx, expr) in exprs.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

impl fmt::Display for LazyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(exprs) => {
                write!(f, "SELECT [")?;
                write_exprs(f, exprs)?;
                write!(f, "]")
            }
            Self::Filter(expr) => write!(f, "FILTER {expr}"),
            Self::WithColumns(exprs) => {
                write!(f, "WITH COLUMNS [")?;
                write_exprs(f, exprs)?;
                write!(f, "]")
            }
            Self::Sort { by, descending } => {
                let dir = if *descending { "DESC" } else { "ASC" };
                write!(f, "SORT BY {by} {dir}")
            }
            Self::GroupByAgg { keys, aggs } => {
                write!(f, "AGGREGATE [")?;
                write_exprs(f, aggs)?;
                write!(f, "] BY [{}]", keys.join(", "))
            }
            Self::Join {
                left_on,
                right_on,
                how,
                ..
            } => write!(f, "{how} JOIN ON {left_on} = {right_on}"),
            Self::Slice { offset, length } => write!(f, "SLICE offset={offset} len={length}"),
            Self::Drop(names) => write!(f, "DROP [{}]", names.join(", ")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LazyFrame {
    source: DataFrame,
    ops: Vec<LazyOp>,
    config: ExecutionConfig,
}

impl LazyFrame {
    pub fn new(source: DataFrame) -> Self {
        LazyFrame {
            source,
            ops: Vec::new(),
            config: ExecutionConfig::default(),
        }
    }

    fn push(mut self, op: LazyOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Replace the columns with the result of the expressions.
    pub fn select(self, exprs: &[Expr]) -> Self {
        self.push(LazyOp::Select(exprs.to_vec()))
    }

    /// Keep rows where the predicate is true. Null counts as false.
    pub fn filter(self, predicate: Expr) -> Self {
        self.push(LazyOp::Filter(predicate))
    }

    pub fn with_column(self, expr: Expr) -> Self {
        self.push(LazyOp::WithColumns(vec![expr]))
    }

    /// Add or replace columns. All expressions see the frame as it was
    /// before this operation.
    pub fn with_columns(self, exprs: &[Expr]) -> Self {
        self.push(LazyOp::WithColumns(exprs.to_vec()))
    }

    pub fn sort(self, by: &str, descending: bool) -> Self {
        self.push(LazyOp::Sort {
            by: by.to_string(),
            descending,
        })
    }

    pub fn groupby<S: AsRef<str>>(self, keys: &[S]) -> LazyGroupBy {
        LazyGroupBy {
            frame: self,
            keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
        }
    }

    pub fn join(self, other: LazyFrame, left_on: &str, right_on: &str, how: JoinType) -> Self {
        self.push(LazyOp::Join {
            other: Box::new(other),
            left_on: left_on.to_string(),
            right_on: right_on.to_string(),
            how,
        })
    }

    pub fn inner_join(self, other: LazyFrame, left_on: &str, right_on: &str) -> Self {
        self.join(other, left_on, right_on, JoinType::Inner)
    }

    pub fn left_join(self, other: LazyFrame, left_on: &str, right_on: &str) -> Self {
        self.join(other, left_on, right_on, JoinType::Left)
    }

    pub fn outer_join(self, other: LazyFrame, left_on: &str, right_on: &str) -> Self {
        self.join(other, left_on, right_on, JoinType::Outer)
    }

    pub fn slice(self, offset: i64, length: usize) -> Self {
        self.push(LazyOp::Slice { offset, length })
    }

    pub fn limit(self, n: usize) -> Self {
        self.slice(0, n)
    }

    pub fn drop_columns<S: AsRef<str>>(self, names: &[S]) -> Self {
        let names = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.push(LazyOp::Drop(names))
    }

    /// Describe the recorded operations, one per line, starting with the
    /// source.
    pub fn describe_plan(&self) -> String {
        let (height, width) = self.source.shape();
        let mut plan = format!("SOURCE [{height} rows x {width} columns]");
        for op in &self.ops {
            // Writing to a string can't fail.
            let _ = write!(plan, "\n{op}");
        }
        plan
    }

    /// Execute the recorded operations in order.
    pub fn collect(&self) -> Result<DataFrame> {
        let mut df = self.source.clone();
        for op in &self.ops {
            df = self.execute(op, df)?;
            debug!(%op, rows = df.height(), columns = df.width(), "executed lazy operation");
        }

        if self.config.rechunk_output {
            df = df.rechunk();
        }
        Ok(df)
    }

    fn evaluate_all(&self, exprs: &[Expr], df: &DataFrame) -> Result<Vec<Series>> {
        if self.config.parallel_expressions && exprs.len() > 1 {
            exprs.par_iter().map(|expr| evaluate(expr, df)).collect()
        } else {
            exprs.iter().map(|expr| evaluate(expr, df)).collect()
        }
    }

    fn execute(&self, op: &LazyOp, df: DataFrame) -> Result<DataFrame> {
        match op {
            LazyOp::Select(exprs) => DataFrame::new(self.evaluate_all(exprs, &df)?),
            LazyOp::Filter(predicate) => df.filter(&evaluate(predicate, &df)?),
            LazyOp::WithColumns(exprs) => {
                let mut out = df.clone();
                for column in self.evaluate_all(exprs, &df)? {
                    out = out.with_column(column)?;
                }
                Ok(out)
            }
            LazyOp::Sort { by, descending } => df.sort(by, *descending),
            LazyOp::GroupByAgg { keys, aggs } => df
                .groupby_with_limit(keys.as_slice(), self.config.max_group_count)?
                .agg_with_parallelism(aggs, self.config.parallel_expressions),
            LazyOp::Join {
                other,
                left_on,
                right_on,
                how,
            } => {
                let other = other.collect()?;
                df.join(&other, left_on, right_on, *how)
            }
            LazyOp::Slice { offset, length } => Ok(df.slice(*offset, *length)),
            LazyOp::Drop(names) => {
                let mut out = df;
                for name in names {
                    out = out.drop(name)?;
                }
                Ok(out)
            }
        }
    }
}

/// A lazy frame waiting for the aggregates of a group by.
#[derive(Debug, Clone)]
pub struct LazyGroupBy {
    frame: LazyFrame,
    keys: Vec<String>,
}

impl LazyGroupBy {
    pub fn agg(self, aggs: &[Expr]) -> LazyFrame {
        self.frame.push(LazyOp::GroupByAgg {
            keys: self.keys,
            aggs: aggs.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::datatype::DataType;
    use crate::arrays::scalar::ScalarValue;
    use crate::arrays::series::NamedFrom;
    use crate::expr::{col, lit};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("k", &["x", "y", "x"]),
            Series::new("v", &[1i32, 2, 3]),
        ])
        .unwrap()
    }

    #[test]
    fn select_and_filter() {
        let out = frame()
            .lazy()
            .filter(col("v").gt(lit(1)))
            .select(&[col("k"), (col("v") * lit(10)).alias("v10")])
            .collect()
            .unwrap();
        assert_eq!(vec!["k", "v10"], out.get_column_names());
        assert_eq!(&Series::new("", &[20i32, 30]), out.column("v10").unwrap());
    }

    #[test]
    fn with_columns_replaces_and_appends() {
        let out = frame()
            .lazy()
            .with_columns(&[
                col("v").cast(DataType::Float64),
                (col("v") + lit(1)).alias("w"),
            ])
            .collect()
            .unwrap();
        assert_eq!(vec!["k", "v", "w"], out.get_column_names());
        assert_eq!(&DataType::Float64, out.column("v").unwrap().dtype());
        assert_eq!(&DataType::Int32, out.column("w").unwrap().dtype());
    }

    #[test]
    fn groupby_sort_limit() {
        let out = frame()
            .lazy()
            .groupby(&["k"])
            .agg(&[col("v").sum()])
            .sort("v_sum", true)
            .limit(1)
            .collect()
            .unwrap();
        assert_eq!((1, 2), out.shape());
        assert_eq!(ScalarValue::from("x"), out.column("k").unwrap().get(0).unwrap());
    }

    #[test]
    fn join_and_drop() {
        let other = DataFrame::new(vec![
            Series::new("k", &["x", "y"]),
            Series::new("label", &["ex", "why"]),
        ])
        .unwrap();
        let out = frame()
            .lazy()
            .left_join(other.lazy(), "k", "k")
            .drop_columns(&["v"])
            .collect()
            .unwrap();
        assert_eq!(vec!["k", "label"], out.get_column_names());
        assert_eq!(
            &Series::new("", &["ex", "why", "ex"]),
            out.column("label").unwrap()
        );
    }

    #[test]
    fn outer_join_keeps_both_sides() {
        let other = DataFrame::new(vec![
            Series::new("k", &["y", "w"]),
            Series::new("label", &["why", "double-u"]),
        ])
        .unwrap();
        let lf = frame().lazy().outer_join(other.lazy(), "k", "k");
        assert!(lf.describe_plan().ends_with("OUTER JOIN ON k = k"));

        let out = lf.collect().unwrap();
        assert_eq!(vec!["k", "v", "label"], out.get_column_names());
        assert_eq!(&Series::new("", &["x", "y", "x", "w"]), out.column("k").unwrap());
        assert_eq!(
            &Series::new("", &[Some(1i32), Some(2), Some(3), None]),
            out.column("v").unwrap()
        );
        assert_eq!(
            &Series::new("", &[None, Some("why"), None, Some("double-u")]),
            out.column("label").unwrap()
        );
    }

    #[test]
    fn collect_twice() {
        let lf = frame()
            .lazy()
            .filter(col("v").lt_eq(lit(2)))
            .with_column(lit(true).alias("t"));
        let first = lf.collect().unwrap();
        let second = lf.collect().unwrap();
        assert!(first.frame_equal(&second));
        assert_eq!(2, first.height());
    }

    #[test]
    fn errors_surface_on_collect() {
        let lf = frame().lazy().select(&[col("missing")]);
        assert_eq!(ErrorKind::Resolution, lf.collect().unwrap_err().kind());

        let lf = frame().lazy().select(&[col("v").sum()]);
        assert_eq!(ErrorKind::Context, lf.collect().unwrap_err().kind());
    }

    #[test]
    fn sequential_config_matches_parallel() {
        let exprs = [
            (col("v") + lit(1)).alias("a"),
            (col("v") * col("v")).alias("b"),
            col("k").is_null(),
        ];
        let parallel = frame().lazy().select(&exprs).collect().unwrap();
        let config = ExecutionConfig {
            parallel_expressions: false,
            rechunk_output: true,
            ..Default::default()
        };
        let sequential = frame().lazy().with_config(config).select(&exprs).collect().unwrap();
        assert!(parallel.frame_equal(&sequential));
    }

    #[test]
    fn plan_description() {
        let plan = frame()
            .lazy()
            .filter(col("v").gt(lit(1)))
            .sort("v", false)
            .limit(5)
            .describe_plan();
        let expected = [
            "SOURCE [3 rows x 2 columns]",
            "FILTER [(col(\"v\")) > (lit(1))]",
            "SORT BY v ASC",
            "SLICE offset=0 len=5",
        ];
        assert_eq!(expected.join("\n"), plan);
    }
}
