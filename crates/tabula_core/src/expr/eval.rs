//! Evaluation of expressions against a frame, row-wise or per group.

use tabula_error::{DbError, Result};

use super::{AggKind, Expr, Operator};
use crate::arrays::chunked_array::{ListChunkedBuilder, UInt32Chunked};
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::arrays::series::Series;
use crate::arrays::series::arithmetic::coerce_operands;
use crate::frame::DataFrame;

/// Groups as (first row index, all row indices).
pub type GroupIndices = [(usize, Vec<usize>)];

/// Evaluate an expression producing one value per row of `df`.
///
/// Aggregates are not valid here.
pub fn evaluate(expr: &Expr, df: &DataFrame) -> Result<Series> {
    let out = eval_node(expr, &EvalContext::Rows(df))?;
    Ok(out.with_name(expr.output_name()))
}

/// Evaluate an expression producing one value per group.
///
/// Expressions without an aggregate produce a list of values for each group.
pub fn evaluate_grouped(expr: &Expr, df: &DataFrame, groups: &GroupIndices) -> Result<Series> {
    let out = eval_node(expr, &EvalContext::Groups { df, groups })?;
    Ok(out.with_name(expr.output_name()))
}

#[derive(Debug, Clone, Copy)]
enum EvalContext<'a> {
    Rows(&'a DataFrame),
    Groups {
        df: &'a DataFrame,
        groups: &'a GroupIndices,
    },
}

impl EvalContext<'_> {
    /// Number of values an expression evaluates to.
    fn len(&self) -> usize {
        match self {
            Self::Rows(df) => df.height(),
            Self::Groups { groups, .. } => groups.len(),
        }
    }
}

fn untyped_null() -> DbError {
    DbError::type_mismatch("Cannot infer the type of a null literal")
}

fn eval_node(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Series> {
    if let EvalContext::Groups { df, groups } = ctx {
        match expr {
            Expr::Literal(_) | Expr::Agg { .. } => (),
            expr if !expr.has_aggregation() => return eval_list(expr, df, groups),
            _ => (),
        }
    }

    match expr {
        Expr::Column(name) => match ctx {
            EvalContext::Rows(df) => df.column(name).cloned(),
            // Columns without an aggregate are handled as lists above.
            EvalContext::Groups { .. } => Err(DbError::context("Column outside of aggregate")
                .with_field("column", name)),
        },
        Expr::Literal(ScalarValue::Null) => Err(untyped_null()),
        Expr::Literal(value) => Series::full("literal", value, ctx.len()),
        Expr::BinaryExpr { left, op, right } => {
            let (l, r) = eval_pair(left, right, ctx)?;
            apply_binary(&l, *op, &r)
        }
        Expr::Not(e) => eval_node(e, ctx)?.not(),
        Expr::IsNull(e) => Ok(eval_node(e, ctx)?.is_null()),
        Expr::IsNotNull(e) => Ok(eval_node(e, ctx)?.is_not_null()),
        Expr::Alias(e, name) => Ok(eval_node(e, ctx)?.with_name(name.as_str())),
        Expr::Cast { expr, dtype } => {
            if expr.is_null_literal() {
                return Ok(Series::full_null("literal", dtype, ctx.len()));
            }
            eval_node(expr, ctx)?.cast(dtype)
        }
        Expr::Sort { expr, descending } => Ok(eval_node(expr, ctx)?.sort(*descending)),
        Expr::Shift { expr, periods } => Ok(eval_node(expr, ctx)?.shift(*periods)),
        Expr::Agg { kind, expr: input } => match ctx {
            EvalContext::Rows(_) => {
                Err(DbError::context("Aggregate used outside of a group by")
                    .with_field("expr", expr))
            }
            EvalContext::Groups { df, groups } => eval_agg(*kind, input, df, groups),
        },
        Expr::Ternary {
            predicate,
            truthy,
            falsy,
        } => {
            let mask = eval_node(predicate, ctx)?;
            let (t, f) = eval_pair(truthy, falsy, ctx)?;
            let (t, f) = coerce_operands("when", &t, &f)?;
            t.zip_with(mask.bool()?, &f)
        }
    }
}

/// Evaluate two sibling expressions. An untyped null literal on one side
/// takes the type of the other side.
fn eval_pair(left: &Expr, right: &Expr, ctx: &EvalContext<'_>) -> Result<(Series, Series)> {
    match (left.is_null_literal(), right.is_null_literal()) {
        (true, true) => Err(untyped_null()),
        (true, false) => {
            let r = eval_node(right, ctx)?;
            let l = Series::full_null("literal", r.dtype(), r.len());
            Ok((l, r))
        }
        (false, true) => {
            let l = eval_node(left, ctx)?;
            let r = Series::full_null("literal", l.dtype(), l.len());
            Ok((l, r))
        }
        (false, false) => Ok((eval_node(left, ctx)?, eval_node(right, ctx)?)),
    }
}

fn apply_binary(left: &Series, op: Operator, right: &Series) -> Result<Series> {
    match op {
        Operator::Plus => left + right,
        Operator::Minus => left - right,
        Operator::Multiply => left * right,
        Operator::Divide => left / right,
        Operator::Eq => left.equal(right),
        Operator::NotEq => left.not_equal(right),
        Operator::Lt => left.lt(right),
        Operator::LtEq => left.lt_eq(right),
        Operator::Gt => left.gt(right),
        Operator::GtEq => left.gt_eq(right),
        Operator::And => left.and(right),
        Operator::Or => left.or(right),
    }
}

/// Evaluate `input` over the rows of each group.
///
/// Elementwise inputs are evaluated once over the whole frame and gathered
/// per group. Anything else is evaluated on a frame holding only the group's
/// rows.
fn for_each_group<F>(input: &Expr, df: &DataFrame, groups: &GroupIndices, mut f: F) -> Result<()>
where
    F: FnMut(Series) -> Result<()>,
{
    if input.is_elementwise() {
        let full = evaluate(input, df)?;
        for (_, rows) in groups {
            // SAFETY: Group indices are rows of `df`, which `full` has the
            // height of.
            let part = unsafe { full.take_unchecked(rows.iter().copied(), rows.len()) };
            f(part)?;
        }
    } else {
        for (_, rows) in groups {
            let part = evaluate(input, &df.take(rows)?)?;
            f(part)?;
        }
    }
    Ok(())
}

/// Data type of `input` evaluated on an empty frame.
fn empty_dtype(input: &Expr, df: &DataFrame) -> Result<DataType> {
    Ok(evaluate(input, &df.head(0))?.dtype().clone())
}

fn eval_agg(kind: AggKind, input: &Expr, df: &DataFrame, groups: &GroupIndices) -> Result<Series> {
    if input.has_aggregation() {
        return Err(DbError::context("Nested aggregates are not supported")
            .with_field("expr", input));
    }

    if kind == AggKind::Groups {
        let mut builder = ListChunkedBuilder::new("", DataType::UInt32, groups.len());
        for (_, rows) in groups {
            let indices = UInt32Chunked::from_values_iter(
                "",
                DataType::UInt32,
                rows.iter().map(|&idx| idx as u32),
            );
            builder.append_value(&indices.into())?;
        }
        return Ok(builder.finish().into());
    }

    let mut values = Vec::with_capacity(groups.len());
    let mut input_dtype = None;
    for_each_group(input, df, groups, |part| {
        if input_dtype.is_none() {
            input_dtype = Some(part.dtype().clone());
        }
        values.push(kind.apply(&part)?);
        Ok(())
    })?;

    let input_dtype = match input_dtype {
        Some(dtype) => dtype,
        None => empty_dtype(input, df)?,
    };
    let dtype = kind.output_dtype(&input_dtype)?;
    Series::from_scalars("", &dtype, &values)
}

/// Collect the values of an aggregate free expression into one list per
/// group.
fn eval_list(expr: &Expr, df: &DataFrame, groups: &GroupIndices) -> Result<Series> {
    let mut parts = Vec::with_capacity(groups.len());
    for_each_group(expr, df, groups, |part| {
        parts.push(part);
        Ok(())
    })?;

    let inner = match parts.first() {
        Some(part) => part.dtype().clone(),
        None => empty_dtype(expr, df)?,
    };
    let mut builder = ListChunkedBuilder::new("", inner, parts.len());
    for part in &parts {
        builder.append_value(part)?;
    }
    Ok(builder.finish().into())
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;
    use crate::arrays::series::NamedFrom;
    use crate::expr::{col, lit, lit_null, when};

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("k", &["x", "y", "x", "x"]),
            Series::new("v", &[Some(1i32), Some(2), None, Some(3)]),
        ])
        .unwrap()
    }

    fn groups() -> Vec<(usize, Vec<usize>)> {
        vec![(0, vec![0, 2, 3]), (1, vec![1])]
    }

    #[test]
    fn column_and_literal() {
        let df = frame();
        let out = evaluate(&(lit(10) + col("v")), &df).unwrap();
        assert_eq!("v", out.name());
        assert_eq!(Series::new("", &[Some(11i32), Some(12), None, Some(13)]), out);

        let out = evaluate(&lit("a"), &df).unwrap();
        assert_eq!(4, out.len());

        let err = evaluate(&col("missing"), &df).unwrap_err();
        assert_eq!(ErrorKind::Resolution, err.kind());
    }

    #[test]
    fn null_literal_takes_sibling_type() {
        let df = frame();
        let out = evaluate(&(col("v") + lit_null()), &df).unwrap();
        assert_eq!(&DataType::Int32, out.dtype());
        assert_eq!(4, out.null_count());

        let out = evaluate(&lit_null().cast(DataType::Utf8), &df).unwrap();
        assert_eq!(&DataType::Utf8, out.dtype());

        let err = evaluate(&lit_null(), &df).unwrap_err();
        assert_eq!(ErrorKind::Type, err.kind());
    }

    #[test]
    fn ternary_null_condition_is_false() {
        let df = frame();
        let expr = when(col("v").gt(lit(1)))
            .then(lit("hi"))
            .otherwise(lit("lo"));
        let out = evaluate(&expr, &df).unwrap();
        assert_eq!(Series::new("", &["lo", "hi", "lo", "hi"]), out);

        let expr = when(col("v").gt(lit(1))).then(col("v")).otherwise(lit(0.5));
        let out = evaluate(&expr, &df).unwrap();
        assert_eq!(&DataType::Float64, out.dtype());
    }

    #[test]
    fn aggregate_needs_groups() {
        let err = evaluate(&col("v").sum(), &frame()).unwrap_err();
        assert_eq!(ErrorKind::Context, err.kind());
    }

    #[test]
    fn grouped_aggregates() {
        let df = frame();
        let groups = groups();

        let out = evaluate_grouped(&col("v").sum(), &df, &groups).unwrap();
        assert_eq!("v_sum", out.name());
        assert_eq!(Series::new("", &[4i32, 2]), out);

        let out = evaluate_grouped(&col("v").count(), &df, &groups).unwrap();
        assert_eq!(Series::new("", &[2u32, 1]), out);

        let out = evaluate_grouped(&(col("v").max() * lit(2)), &df, &groups).unwrap();
        assert_eq!("v_max", out.name());
        assert_eq!(Series::new("", &[6i32, 4]), out);

        let out = evaluate_grouped(&col("v").sort(true).first(), &df, &groups).unwrap();
        assert_eq!(Series::new("", &[3i32, 2]), out);

        let out = evaluate_grouped(&col("v").mean(), &df, &groups).unwrap();
        assert_eq!(Series::new("", &[2.0f64, 2.0]), out);
    }

    #[test]
    fn grouped_order_statistics() {
        let df = DataFrame::new(vec![
            Series::new("k", &["a", "b", "a", "a", "b", "a", "b", "c"]),
            Series::new(
                "v",
                &[Some(4i64), Some(10), None, Some(1), Some(10), Some(3), None, None],
            ),
        ])
        .unwrap();
        let groups = vec![(0, vec![0, 2, 3, 5]), (1, vec![1, 4, 6]), (7, vec![7])];

        let out = evaluate_grouped(&col("v").min(), &df, &groups).unwrap();
        assert_eq!("v_min", out.name());
        assert_eq!(Series::new("", &[Some(1i64), Some(10), None]), out);

        let out = evaluate_grouped(&col("v").last(), &df, &groups).unwrap();
        assert_eq!("v_last", out.name());
        assert_eq!(Series::new("", &[Some(3i64), None, None]), out);

        let out = evaluate_grouped(&col("v").median(), &df, &groups).unwrap();
        assert_eq!("v_median", out.name());
        assert_eq!(Series::new("", &[Some(3.0f64), Some(10.0), None]), out);

        // Linear interpolation between the closest ranks of each group.
        let out = evaluate_grouped(&col("v").quantile(0.25), &df, &groups).unwrap();
        assert_eq!("v_quantile", out.name());
        assert_eq!(Series::new("", &[Some(2.0f64), Some(10.0), None]), out);
        let out = evaluate_grouped(&col("v").quantile(0.75), &df, &groups).unwrap();
        assert_eq!(Series::new("", &[Some(3.5f64), Some(10.0), None]), out);

        // Null counts as one distinct value.
        let out = evaluate_grouped(&col("v").n_unique(), &df, &groups).unwrap();
        assert_eq!("v_n_unique", out.name());
        assert_eq!(Series::new("", &[4u32, 2, 1]), out);

        let err = evaluate_grouped(&col("v").quantile(1.5), &df, &groups).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn grouped_lists_and_indices() {
        let df = frame();
        let groups = groups();

        let out = evaluate_grouped(&col("v"), &df, &groups).unwrap();
        assert_eq!(&DataType::List(Box::new(DataType::Int32)), out.dtype());
        assert_eq!(
            ScalarValue::List(Series::new("", &[Some(1i32), None, Some(3)])),
            out.get(0).unwrap()
        );

        let out = evaluate_grouped(&col("k").agg_groups(), &df, &groups).unwrap();
        assert_eq!(
            ScalarValue::List(Series::new("", &[0u32, 2, 3])),
            out.get(0).unwrap()
        );
    }

    #[test]
    fn nested_aggregate_errors() {
        let err = evaluate_grouped(&col("v").sum().max(), &frame(), &groups()).unwrap_err();
        assert_eq!(ErrorKind::Context, err.kind());
    }

    #[test]
    fn empty_groups_keep_types() {
        let df = frame();
        let out = evaluate_grouped(&col("v").mean(), &df, &[]).unwrap();
        assert_eq!(&DataType::Float64, out.dtype());
        assert!(out.is_empty());
    }
}
