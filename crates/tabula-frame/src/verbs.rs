//! Table verbs.
//!
//! Every verb takes `&self` and returns a new [`Table`]; inputs are never modified.

use crate::bitmap::BitVec;
use crate::column::Column;
use crate::context::{expr, EvalContext, Evaluated, NamedExpr};
use crate::error::{FrameError, FrameResult, StructuralWarning};
use crate::group::{partition, GroupKey};
use crate::select::{self, Selector};
use crate::table::Table;
use crate::types::{ColumnType, Value};
use std::cmp::Ordering;

/// Rows returned by [`Table::head_default`] and [`Table::tail_default`].
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

impl From<&str> for SortKey {
    fn from(column: &str) -> Self {
        SortKey::asc(column)
    }
}

impl Table {
    pub fn select(&self, terms: &[Selector]) -> FrameResult<Table> {
        Ok(self.select_with_warnings(terms)?.0)
    }

    /// [`Table::select`] that also hands back the non-fatal diagnostics it logged.
    pub fn select_with_warnings(
        &self,
        terms: &[Selector],
    ) -> FrameResult<(Table, Vec<StructuralWarning>)> {
        let resolution = select::resolve(&self.names(), terms)?;
        log::trace!("select resolved {:?}", resolution.names);
        Ok((self.project(&resolution.names)?, resolution.warnings))
    }

    /// Keep the rows whose mask bit is set.
    pub fn filter<F>(&self, predicate: F) -> FrameResult<Table>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<BitVec>,
    {
        self.filter_in(&predicate, None)
    }

    pub(crate) fn filter_in<F>(&self, predicate: &F, key: Option<&GroupKey>) -> FrameResult<Table>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<BitVec>,
    {
        let mask = predicate(&EvalContext::new(self, key))?;
        if mask.len() != self.nrow() {
            return Err(FrameError::dimension("filter mask", self.nrow(), mask.len()));
        }
        let rows: Vec<usize> = mask.iter_ones().collect();
        log::trace!("filter kept {} of {} rows", rows.len(), self.nrow());
        Ok(self.take_rows(&rows))
    }

    pub fn mutate<F>(&self, name: &str, f: F) -> FrameResult<Table>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync,
    {
        self.mutate_many(&[expr(name, f)])
    }

    /// Evaluate expressions in order; each sees the columns produced before it.
    pub fn mutate_many(&self, exprs: &[NamedExpr<'_>]) -> FrameResult<Table> {
        self.mutate_in(exprs, None)
    }

    pub(crate) fn mutate_in(
        &self,
        exprs: &[NamedExpr<'_>],
        key: Option<&GroupKey>,
    ) -> FrameResult<Table> {
        let mut table = self.clone();
        for e in exprs {
            let result = (e.expr)(&EvalContext::new(&table, key))?;
            let fallback = table
                .get_column(&e.name)
                .map(Column::column_type)
                .unwrap_or_default();
            let column = result.into_column(&e.name, table.nrow(), fallback)?;
            table = table.with_column(column)?;
        }
        Ok(table)
    }

    pub fn summarize<F>(&self, name: &str, f: F) -> FrameResult<Table>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync,
    {
        self.summarize_many(&[expr(name, f)])
    }

    /// One-row table with one column per expression.
    pub fn summarize_many(&self, exprs: &[NamedExpr<'_>]) -> FrameResult<Table> {
        let ctx = EvalContext::new(self, None);
        let columns = exprs
            .iter()
            .map(|e| {
                let value = (e.expr)(&ctx)?.into_scalar(&e.name)?;
                Column::from_values_or(e.name.as_str(), vec![value], ColumnType::default())
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Table::with_row_count(columns, 1)
    }

    /// Stable multi-key sort. Nulls go last whatever the direction.
    pub fn arrange(&self, keys: &[SortKey]) -> FrameResult<Table> {
        if keys.is_empty() {
            return Ok(self.clone());
        }
        let sort_columns = keys
            .iter()
            .map(|k| Ok((self.column(&k.column)?.values(), k.descending)))
            .collect::<FrameResult<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..self.nrow()).collect();
        order.sort_by(|&a, &b| {
            for (values, descending) in &sort_columns {
                let ord = match (&values[a], &values[b]) {
                    (Value::Null, Value::Null) => Ordering::Equal,
                    (Value::Null, _) => Ordering::Greater,
                    (_, Value::Null) => Ordering::Less,
                    (x, y) if *descending => y.sort_cmp(x),
                    (x, y) => x.sort_cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(self.take_rows(&order))
    }

    /// Rename columns in place; `pairs` are `(old, new)`.
    pub fn rename(&self, pairs: &[(&str, &str)]) -> FrameResult<Table> {
        let mut columns = self.columns().to_vec();
        for (old, new) in pairs {
            let idx = self
                .column_idx(old)
                .ok_or_else(|| FrameError::unknown_column(*old))?;
            columns[idx] = columns[idx].with_name(*new);
        }
        Table::with_row_count(columns, self.nrow())
    }

    /// First `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..n.min(self.nrow())).collect();
        self.take_rows(&rows)
    }

    /// Last `n` rows, in their original order.
    pub fn tail(&self, n: usize) -> Table {
        let start = self.nrow().saturating_sub(n);
        let rows: Vec<usize> = (start..self.nrow()).collect();
        self.take_rows(&rows)
    }

    pub fn head_default(&self) -> Table {
        self.head(DEFAULT_PREVIEW_ROWS)
    }

    pub fn tail_default(&self) -> Table {
        self.tail(DEFAULT_PREVIEW_ROWS)
    }

    /// Rows at the given 1-based positions, in the order given. Repeats are allowed.
    pub fn slice(&self, indices: &[usize]) -> FrameResult<Table> {
        let rows = indices
            .iter()
            .map(|&i| {
                if i == 0 || i > self.nrow() {
                    Err(FrameError::IndexOutOfRange {
                        index: i,
                        nrow: self.nrow(),
                    })
                } else {
                    Ok(i - 1)
                }
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Ok(self.take_rows(&rows))
    }

    /// First row of every distinct combination of `columns` (all columns when empty).
    pub fn distinct<S: AsRef<str>>(&self, columns: &[S]) -> FrameResult<Table> {
        let groups = if columns.is_empty() {
            partition(self, &self.names())?
        } else {
            partition(self, columns)?
        };
        let rows: Vec<usize> = groups.iter().map(|(_, rows)| rows[0]).collect();
        log::debug!("distinct kept {} of {} rows", rows.len(), self.nrow());
        Ok(self.take_rows(&rows))
    }

    /// Grouping columns plus the Int row count `n` per group.
    pub fn count<S: AsRef<str>>(&self, columns: &[S]) -> FrameResult<Table> {
        self.group_by(columns)?.count()
    }
}
