//! The environment handed to `filter`, `mutate` and `summarize` expressions.

use crate::bitmap::BitVec;
use crate::column::Column;
use crate::error::{FrameError, FrameResult};
use crate::group::GroupKey;
use crate::table::{RowView, Table};
use crate::types::{ColumnType, Opaque, Value};

/// Read-only view of the table (or group sub-table) an expression is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct EvalContext<'a> {
    table: &'a Table,
    key: Option<&'a GroupKey>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(table: &'a Table, key: Option<&'a GroupKey>) -> Self {
        Self { table, key }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn col(&self, name: &str) -> FrameResult<&'a Column> {
        self.table.column(name)
    }

    pub fn nrow(&self) -> usize {
        self.table.nrow()
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.table.names()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'a>> + 'a {
        self.table.rows()
    }

    pub fn row(&self, row: usize) -> FrameResult<RowView<'a>> {
        self.table.row(row)
    }

    /// Key of the group being evaluated; `None` for ungrouped tables.
    pub fn group_key(&self) -> Option<&'a GroupKey> {
        self.key
    }
}

/// Result of a `mutate`/`summarize` expression.
#[derive(Clone, Debug)]
pub enum Evaluated {
    Scalar(Value),
    Column(Column),
    Values(Vec<Value>),
    Mask(BitVec),
}

impl Evaluated {
    pub fn sequence<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Evaluated::Values(values.into_iter().map(Into::into).collect())
    }

    /// Number of values, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Evaluated::Scalar(_) => None,
            Evaluated::Column(c) => Some(c.len()),
            Evaluated::Values(v) => Some(v.len()),
            Evaluated::Mask(m) => Some(m.len()),
        }
    }

    /// Materialise as a column of `nrow` values, broadcasting scalars.
    pub(crate) fn into_column(
        self,
        name: &str,
        nrow: usize,
        fallback: ColumnType,
    ) -> FrameResult<Column> {
        if let Some(len) = self.len() {
            if len != nrow {
                return Err(FrameError::dimension(format!("mutate {name}"), nrow, len));
            }
        }
        Ok(match self {
            Evaluated::Scalar(value) => Column::broadcast(name, &value, nrow, fallback),
            Evaluated::Column(column) => column.with_name(name),
            Evaluated::Values(values) => Column::from_values_or(name, values, fallback)?,
            Evaluated::Mask(mask) => Column::booleans(name, mask.iter()),
        })
    }

    /// Reduce to a single value; sequences must hold exactly one element.
    pub(crate) fn into_scalar(self, name: &str) -> FrameResult<Value> {
        match self {
            Evaluated::Scalar(value) => Ok(value),
            Evaluated::Column(c) if c.len() == 1 => Ok(c.get(0)),
            Evaluated::Values(mut v) if v.len() == 1 => Ok(v.remove(0)),
            Evaluated::Mask(m) if m.len() == 1 => Ok(Value::Boolean(m.get(0))),
            other => Err(FrameError::NonScalarValue {
                column: name.to_string(),
                len: other.len().unwrap_or_default(),
            }),
        }
    }
}

impl From<Value> for Evaluated {
    fn from(v: Value) -> Self {
        Evaluated::Scalar(v)
    }
}

impl From<Column> for Evaluated {
    fn from(c: Column) -> Self {
        Evaluated::Column(c)
    }
}

impl From<&Column> for Evaluated {
    fn from(c: &Column) -> Self {
        Evaluated::Column(c.clone())
    }
}

impl From<Vec<Value>> for Evaluated {
    fn from(v: Vec<Value>) -> Self {
        Evaluated::Values(v)
    }
}

impl From<BitVec> for Evaluated {
    fn from(m: BitVec) -> Self {
        Evaluated::Mask(m)
    }
}

impl From<Vec<bool>> for Evaluated {
    fn from(m: Vec<bool>) -> Self {
        Evaluated::Mask(m.into())
    }
}

macro_rules! scalar_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Evaluated {
            fn from(v: $t) -> Self {
                Evaluated::Scalar(v.into())
            }
        })*
    };
}

scalar_from!(i64, i32, usize, f64, bool, &str, String, Opaque);

impl<T: Into<Value>> From<Option<T>> for Evaluated {
    fn from(v: Option<T>) -> Self {
        Evaluated::Scalar(v.into())
    }
}

/// A `mutate`/`summarize` expression.
pub type ExprFn<'f> = dyn Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync + 'f;

/// An expression paired with the column it produces.
pub struct NamedExpr<'f> {
    pub(crate) name: String,
    pub(crate) expr: Box<ExprFn<'f>>,
}

impl NamedExpr<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Pair an output column name with an expression.
pub fn expr<'f, F>(name: impl Into<String>, f: F) -> NamedExpr<'f>
where
    F: Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync + 'f,
{
    NamedExpr {
        name: name.into(),
        expr: Box::new(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_broadcast_and_sequences_must_fit() {
        let col = Evaluated::from("bar")
            .into_column("foo", 3, ColumnType::String)
            .unwrap();
        assert_eq!(col.len(), 3);
        assert_eq!(col.get(2), Value::from("bar"));

        let err = Evaluated::sequence([1i64, 2])
            .into_column("foo", 3, ColumnType::Int)
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn single_element_sequences_unwrap() {
        assert_eq!(
            Evaluated::sequence(["only"]).into_scalar("x").unwrap(),
            Value::from("only")
        );
        let err = Evaluated::from(vec![false; 12]).into_scalar("x").unwrap_err();
        assert!(matches!(err, FrameError::NonScalarValue { len: 12, .. }));
    }
}
