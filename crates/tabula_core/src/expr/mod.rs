//! Lazy column expressions.

pub mod eval;

use std::fmt;
use std::ops::{Add, Div, Mul, Not, Sub};
use std::sync::Arc;

use tabula_error::{DbError, Result};

use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::arrays::series::Series;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Multiply,
    Divide,
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::And => "AND",
            Self::Or => "OR",
        };
        write!(f, "{s}")
    }
}

/// Reduction applied to each group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggKind {
    Min,
    Max,
    Mean,
    Median,
    Sum,
    NUnique,
    First,
    Last,
    Quantile(f64),
    /// Row indices of each group.
    Groups,
    /// Number of non-null values.
    Count,
}

impl AggKind {
    /// Suffix appended to the input name to name the output.
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Sum => "sum",
            Self::NUnique => "n_unique",
            Self::First => "first",
            Self::Last => "last",
            Self::Quantile(_) => "quantile",
            Self::Groups => "agg_groups",
            Self::Count => "count",
        }
    }

    /// Data type produced when aggregating values of `input`.
    pub fn output_dtype(&self, input: &DataType) -> Result<DataType> {
        let not_numeric = || {
            let msg = format!("Cannot compute {} of a non-numeric input", self.suffix());
            DbError::type_mismatch(msg).with_field("datatype", input)
        };

        Ok(match self {
            Self::Min | Self::Max | Self::First | Self::Last => input.clone(),
            Self::Mean | Self::Median | Self::Quantile(_) => {
                if !input.is_numeric() {
                    return Err(not_numeric());
                }
                DataType::Float64
            }
            Self::Sum => match input {
                DataType::Boolean => DataType::UInt64,
                dtype if dtype.is_numeric() => dtype.clone(),
                _ => return Err(not_numeric()),
            },
            Self::NUnique | Self::Count => DataType::UInt32,
            Self::Groups => DataType::List(Box::new(DataType::UInt32)),
        })
    }

    /// Reduce a series to a single value.
    ///
    /// `Groups` depends on row positions rather than values and can't be
    /// computed from a series alone.
    pub fn apply(&self, series: &Series) -> Result<ScalarValue> {
        Ok(match self {
            Self::Min => series.min(),
            Self::Max => series.max(),
            Self::Mean => series.mean()?,
            Self::Median => series.median()?,
            Self::Sum => series.sum()?,
            Self::NUnique => ScalarValue::UInt32(series.n_unique() as u32),
            Self::First => series.first(),
            Self::Last => series.last(),
            Self::Quantile(q) => series.quantile(*q)?,
            Self::Count => ScalarValue::UInt32(series.count() as u32),
            Self::Groups => {
                return Err(DbError::context("Group indices require a grouped context"));
            }
        })
    }
}

impl fmt::Display for AggKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantile(q) => write!(f, "quantile({q})"),
            other => write!(f, "{}()", other.suffix()),
        }
    }
}

/// An expression over the columns of a frame.
///
/// Expressions are immutable, children are shared behind `Arc` so cloning is
/// cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(ScalarValue),
    BinaryExpr {
        left: Arc<Expr>,
        op: Operator,
        right: Arc<Expr>,
    },
    Not(Arc<Expr>),
    IsNull(Arc<Expr>),
    IsNotNull(Arc<Expr>),
    Alias(Arc<Expr>, String),
    Cast {
        expr: Arc<Expr>,
        dtype: DataType,
    },
    Sort {
        expr: Arc<Expr>,
        descending: bool,
    },
    Shift {
        expr: Arc<Expr>,
        periods: i64,
    },
    Agg {
        kind: AggKind,
        expr: Arc<Expr>,
    },
    /// `when(predicate).then(truthy).otherwise(falsy)`
    Ternary {
        predicate: Arc<Expr>,
        truthy: Arc<Expr>,
        falsy: Arc<Expr>,
    },
}

pub fn col(name: &str) -> Expr {
    Expr::Column(name.to_string())
}

pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    Expr::Literal(value.into())
}

/// An untyped null literal, takes the type of the expression it's combined
/// with.
pub fn lit_null() -> Expr {
    Expr::Literal(ScalarValue::Null)
}

pub fn when(predicate: Expr) -> When {
    When { predicate }
}

#[derive(Debug, Clone)]
pub struct When {
    predicate: Expr,
}

impl When {
    pub fn then(self, expr: Expr) -> WhenThen {
        WhenThen {
            predicate: self.predicate,
            truthy: expr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhenThen {
    predicate: Expr,
    truthy: Expr,
}

impl WhenThen {
    pub fn otherwise(self, expr: Expr) -> Expr {
        Expr::Ternary {
            predicate: Arc::new(self.predicate),
            truthy: Arc::new(self.truthy),
            falsy: Arc::new(expr),
        }
    }
}

impl Expr {
    fn binary(self, op: Operator, other: Expr) -> Expr {
        Expr::BinaryExpr {
            left: Arc::new(self),
            op,
            right: Arc::new(other),
        }
    }

    fn agg(self, kind: AggKind) -> Expr {
        Expr::Agg {
            kind,
            expr: Arc::new(self),
        }
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.binary(Operator::Eq, other)
    }

    pub fn neq(self, other: Expr) -> Expr {
        self.binary(Operator::NotEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(Operator::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.binary(Operator::GtEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(Operator::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.binary(Operator::LtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(Operator::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(Operator::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Not(Arc::new(self))
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull(Arc::new(self))
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNotNull(Arc::new(self))
    }

    pub fn alias(self, name: &str) -> Expr {
        Expr::Alias(Arc::new(self), name.to_string())
    }

    pub fn cast(self, dtype: DataType) -> Expr {
        Expr::Cast {
            expr: Arc::new(self),
            dtype,
        }
    }

    pub fn sort(self, descending: bool) -> Expr {
        Expr::Sort {
            expr: Arc::new(self),
            descending,
        }
    }

    pub fn shift(self, periods: i64) -> Expr {
        Expr::Shift {
            expr: Arc::new(self),
            periods,
        }
    }

    pub fn min(self) -> Expr {
        self.agg(AggKind::Min)
    }

    pub fn max(self) -> Expr {
        self.agg(AggKind::Max)
    }

    pub fn mean(self) -> Expr {
        self.agg(AggKind::Mean)
    }

    pub fn median(self) -> Expr {
        self.agg(AggKind::Median)
    }

    pub fn sum(self) -> Expr {
        self.agg(AggKind::Sum)
    }

    pub fn n_unique(self) -> Expr {
        self.agg(AggKind::NUnique)
    }

    pub fn first(self) -> Expr {
        self.agg(AggKind::First)
    }

    pub fn last(self) -> Expr {
        self.agg(AggKind::Last)
    }

    pub fn quantile(self, q: f64) -> Expr {
        self.agg(AggKind::Quantile(q))
    }

    pub fn agg_groups(self) -> Expr {
        self.agg(AggKind::Groups)
    }

    pub fn count(self) -> Expr {
        self.agg(AggKind::Count)
    }

    pub(crate) fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal(ScalarValue::Null))
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Column(_) | Expr::Literal(_) => Vec::new(),
            Expr::BinaryExpr { left, right, .. } => vec![&**left, &**right],
            Expr::Not(e)
            | Expr::IsNull(e)
            | Expr::IsNotNull(e)
            | Expr::Alias(e, _)
            | Expr::Cast { expr: e, .. }
            | Expr::Sort { expr: e, .. }
            | Expr::Shift { expr: e, .. }
            | Expr::Agg { expr: e, .. } => vec![&**e],
            Expr::Ternary {
                predicate,
                truthy,
                falsy,
            } => vec![&**predicate, &**truthy, &**falsy],
        }
    }

    /// Name of the column this expression produces.
    ///
    /// A column keeps its name and an alias sets it. Aggregates append their
    /// suffix to the input's name. Everything else is named after its
    /// leftmost input referencing a column.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Column(name) => name.clone(),
            Expr::Alias(_, name) => name.clone(),
            Expr::Literal(_) => "literal".to_string(),
            Expr::Agg { kind, expr } => format!("{}_{}", expr.output_name(), kind.suffix()),
            other => {
                let children = other.children();
                children
                    .iter()
                    .find(|c| c.has_column())
                    .or(children.first())
                    .map(|c| c.output_name())
                    .unwrap_or_else(|| "literal".to_string())
            }
        }
    }

    fn has_column(&self) -> bool {
        matches!(self, Expr::Column(_)) || self.children().iter().any(|c| c.has_column())
    }

    /// Check if this expression contains an aggregate anywhere.
    pub fn has_aggregation(&self) -> bool {
        matches!(self, Expr::Agg { .. }) || self.children().iter().any(|c| c.has_aggregation())
    }

    /// Check if every output row depends only on the same input row.
    ///
    /// Sorts, shifts and aggregates look at other rows.
    pub fn is_elementwise(&self) -> bool {
        match self {
            Expr::Sort { .. } | Expr::Shift { .. } | Expr::Agg { .. } => false,
            other => other.children().iter().all(|c| c.is_elementwise()),
        }
    }

    /// Names of the columns this expression reads, in first-seen order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_columns(&mut names);
        names
    }

    fn collect_columns<'a>(&'a self, names: &mut Vec<&'a str>) {
        if let Expr::Column(name) = self {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
            return;
        }
        for child in self.children() {
            child.collect_columns(names);
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "col(\"{name}\")"),
            Expr::Literal(ScalarValue::Utf8(s)) => write!(f, "lit(\"{s}\")"),
            Expr::Literal(value) => write!(f, "lit({value})"),
            Expr::BinaryExpr { left, op, right } => write!(f, "[({left}) {op} ({right})]"),
            Expr::Not(e) => write!(f, "{e}.not()"),
            Expr::IsNull(e) => write!(f, "{e}.is_null()"),
            Expr::IsNotNull(e) => write!(f, "{e}.is_not_null()"),
            Expr::Alias(e, name) => write!(f, "{e}.alias(\"{name}\")"),
            Expr::Cast { expr, dtype } => write!(f, "{expr}.cast({dtype})"),
            Expr::Sort { expr, descending } => write!(f, "{expr}.sort(descending={descending})"),
            Expr::Shift { expr, periods } => write!(f, "{expr}.shift({periods})"),
            Expr::Agg { kind, expr } => write!(f, "{expr}.{kind}"),
            Expr::Ternary {
                predicate,
                truthy,
                falsy,
            } => write!(f, "when({predicate}).then({truthy}).otherwise({falsy})"),
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Arc::new(self))
    }
}

macro_rules! impl_expr_arith {
    ($trait:ident, $fn:ident, $op:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $fn(self, rhs: Expr) -> Expr {
                self.binary(Operator::$op, rhs)
            }
        }
    };
}

impl_expr_arith!(Add, add, Plus);
impl_expr_arith!(Sub, sub, Minus);
impl_expr_arith!(Mul, mul, Multiply);
impl_expr_arith!(Div, div, Divide);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names() {
        assert_eq!("a", col("a").output_name());
        assert_eq!("b", col("a").alias("b").output_name());
        assert_eq!("a", (lit(1) + col("a")).output_name());
        assert_eq!("v_sum", col("v").sum().output_name());
        assert_eq!("v_sum", (col("v").sum() * lit(2)).output_name());
        assert_eq!("total", col("v").sum().alias("total").output_name());
        assert_eq!("literal", (lit(1) + lit(2)).output_name());
        assert_eq!(
            "a",
            when(col("a").gt(lit(1)))
                .then(lit("hi"))
                .otherwise(lit("lo"))
                .output_name()
        );
    }

    #[test]
    fn aggregation_checks() {
        assert!(!col("a").has_aggregation());
        assert!((col("a").sum() + lit(1)).has_aggregation());
        assert!((col("a") + lit(1)).not().is_elementwise());
        assert!(!col("a").shift(1).is_elementwise());
        assert!(!col("a").sort(false).is_null().is_elementwise());
    }

    #[test]
    fn referenced_columns_in_order() {
        let expr = when(col("b").is_null())
            .then(col("a"))
            .otherwise(col("b") * col("c"));
        assert_eq!(vec!["b", "a", "c"], expr.referenced_columns());
    }

    #[test]
    fn display() {
        let expr = col("a").gt(lit(1)).and(col("s").eq(lit("x")));
        assert_eq!(
            "[([(col(\"a\")) > (lit(1))]) AND ([(col(\"s\")) = (lit(\"x\"))])]",
            expr.to_string()
        );
        assert_eq!("col(\"v\").quantile(0.5)", col("v").quantile(0.5).to_string());
        assert_eq!("col(\"v\").n_unique()", col("v").n_unique().to_string());
    }

    #[test]
    fn output_dtypes() {
        assert_eq!(DataType::Float64, AggKind::Mean.output_dtype(&DataType::Int8).unwrap());
        assert_eq!(DataType::UInt64, AggKind::Sum.output_dtype(&DataType::Boolean).unwrap());
        assert_eq!(DataType::UInt32, AggKind::Count.output_dtype(&DataType::Utf8).unwrap());
        assert!(AggKind::Sum.output_dtype(&DataType::Utf8).is_err());
    }
}
