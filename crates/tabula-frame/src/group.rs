//! Hash-based grouping.
//!
//! A [`GroupKey`] stores its `(column, value)` pairs sorted by column name, so two keys built
//! from the same columns in a different order hash and compare equal. Joins reuse the same keys,
//! which is what makes join results independent of either input's column order.
//!
//! Nulls are ordinary key components: rows whose key columns are null form their own group.

use crate::bitmap::BitVec;
use crate::column::Column;
use crate::context::{EvalContext, Evaluated, NamedExpr};
use crate::error::{FrameError, FrameResult};
use crate::select::{self, Selector};
use crate::table::Table;
use crate::types::{ColumnType, Value};
use crate::verbs::SortKey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GroupKey {
    entries: Vec<(Arc<str>, Value)>,
}

impl GroupKey {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<Arc<str>>,
    {
        let mut entries: Vec<(Arc<str>, Value)> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .binary_search_by(|(name, _)| name.as_ref().cmp(column))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// `(column, value)` pairs sorted by column name.
    pub fn entries(&self) -> &[(Arc<str>, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Key columns of a table, sorted by name, ready for per-row key extraction.
pub(crate) struct KeyColumns<'t> {
    columns: Vec<(Arc<str>, &'t Column)>,
}

impl<'t> KeyColumns<'t> {
    pub(crate) fn new<S: AsRef<str>>(table: &'t Table, names: &[S]) -> FrameResult<Self> {
        let mut columns = names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                Ok((Arc::<str>::from(name), table.column(name)?))
            })
            .collect::<FrameResult<Vec<_>>>()?;
        columns.sort_by(|a, b| a.0.cmp(&b.0));
        columns.dedup_by(|a, b| a.0 == b.0);
        Ok(Self { columns })
    }

    pub(crate) fn key(&self, row: usize) -> GroupKey {
        GroupKey {
            entries: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.get(row)))
                .collect(),
        }
    }
}

/// Row indices per distinct key, in order of first appearance.
pub(crate) fn partition<S: AsRef<str>>(
    table: &Table,
    names: &[S],
) -> FrameResult<Vec<(GroupKey, Vec<usize>)>> {
    let keys = KeyColumns::new(table, names)?;
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut out: Vec<(GroupKey, Vec<usize>)> = Vec::new();
    for row in 0..table.nrow() {
        let key = keys.key(row);
        match slots.get(&key) {
            Some(&slot) => out[slot].1.push(row),
            None => {
                slots.insert(key.clone(), out.len());
                out.push((key, vec![row]));
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    key: GroupKey,
    table: Table,
}

impl Group {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// A table partitioned by the values of its key columns.
///
/// `template` is a zero-row table carrying the full schema, so that grouped verbs still know
/// the column set when there are no groups at all.
#[derive(Clone, Debug, PartialEq)]
pub struct Grouping {
    key_columns: Vec<String>,
    groups: Vec<Group>,
    template: Table,
}

impl Table {
    pub fn group_by<S: AsRef<str>>(&self, columns: &[S]) -> FrameResult<Grouping> {
        let mut key_columns: Vec<String> = Vec::with_capacity(columns.len());
        for name in columns {
            let name = name.as_ref();
            if !key_columns.iter().any(|k| k == name) {
                key_columns.push(name.to_string());
            }
        }

        let groups: Vec<Group> = partition(self, &key_columns)?
            .into_iter()
            .map(|(key, rows)| Group {
                key,
                table: self.take_rows(&rows),
            })
            .collect();
        log::debug!(
            "grouped {} rows by {:?} into {} groups",
            self.nrow(),
            key_columns,
            groups.len()
        );

        Ok(Grouping {
            key_columns,
            groups,
            template: self.take_rows(&[]),
        })
    }
}

impl Grouping {
    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.template.names()
    }

    pub fn ncol(&self) -> usize {
        self.template.ncol()
    }

    pub fn nrow(&self) -> usize {
        self.groups.iter().map(|g| g.table.nrow()).sum()
    }

    pub fn group(&self, key: &GroupKey) -> Option<&Table> {
        self.groups.iter().find(|g| &g.key == key).map(|g| &g.table)
    }

    /// One row per group holding only the key columns.
    pub fn keys(&self) -> FrameResult<Table> {
        let columns = self
            .key_columns
            .iter()
            .map(|name| {
                let kind = self.template.column(name)?.column_type();
                let values = self
                    .groups
                    .iter()
                    .map(|g| g.key.get(name).cloned().unwrap_or(Value::Null))
                    .collect();
                Column::new(name.as_str(), kind, values)
            })
            .collect::<FrameResult<Vec<_>>>()?;
        Table::with_row_count(columns, self.groups.len())
    }

    /// Concatenate the groups back into one table, in group emission order.
    pub fn ungroup(&self) -> FrameResult<Table> {
        if self.groups.is_empty() {
            return Ok(self.template.clone());
        }
        let tables: Vec<Table> = self.groups.iter().map(|g| g.table.clone()).collect();
        Table::bind_rows(&tables)
    }

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    fn map_groups<T, F>(&self, f: F) -> FrameResult<Vec<T>>
    where
        T: Send,
        F: Fn(&Group) -> FrameResult<T> + Send + Sync,
    {
        use rayon::prelude::*;
        self.groups.par_iter().map(f).collect()
    }

    #[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
    fn map_groups<T, F>(&self, f: F) -> FrameResult<Vec<T>>
    where
        T: Send,
        F: Fn(&Group) -> FrameResult<T> + Send + Sync,
    {
        self.groups.iter().map(f).collect()
    }

    /// Rebuild with per-group tables; groups left without rows are dropped.
    fn with_tables(&self, tables: Vec<Table>, template: Table) -> Grouping {
        let groups = self
            .groups
            .iter()
            .zip(tables)
            .filter(|(_, table)| table.nrow() > 0)
            .map(|(g, table)| Group {
                key: g.key.clone(),
                table,
            })
            .collect();
        Grouping {
            key_columns: self.key_columns.clone(),
            groups,
            template,
        }
    }

    /// Selection that always keeps the key columns; keys the selection left out come first.
    pub fn select(&self, terms: &[Selector]) -> FrameResult<Grouping> {
        let resolved = select::resolve(&self.template.names(), terms)?;
        let mut names: Vec<String> = self
            .key_columns
            .iter()
            .filter(|k| !resolved.names.contains(k))
            .cloned()
            .collect();
        names.extend(resolved.names);

        let tables = self.map_groups(|g| g.table.project(&names))?;
        Ok(self.with_tables(tables, self.template.project(&names)?))
    }

    pub fn filter<F>(&self, predicate: F) -> FrameResult<Grouping>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<BitVec> + Send + Sync,
    {
        let tables = self.map_groups(|g| g.table.filter_in(&predicate, Some(&g.key)))?;
        Ok(self.with_tables(tables, self.template.clone()))
    }

    pub fn mutate<F>(&self, name: &str, f: F) -> FrameResult<Grouping>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync,
    {
        self.mutate_many(&[crate::context::expr(name, f)])
    }

    /// Per-group mutate. Key columns cannot be reassigned.
    pub fn mutate_many(&self, exprs: &[NamedExpr<'_>]) -> FrameResult<Grouping> {
        if let Some(e) = exprs.iter().find(|e| self.key_columns.contains(&e.name)) {
            return Err(FrameError::GroupingColumn {
                column: e.name.clone(),
            });
        }
        let tables = self.map_groups(|g| g.table.mutate_in(exprs, Some(&g.key)))?;
        let tables = reconcile_kinds(tables)?;
        let template = match tables.first() {
            Some(first) => first.take_rows(&[]),
            None => self.template.mutate_in(exprs, None)?,
        };
        Ok(self.with_tables(tables, template))
    }

    pub fn summarize<F>(&self, name: &str, f: F) -> FrameResult<Table>
    where
        F: Fn(&EvalContext<'_>) -> FrameResult<Evaluated> + Send + Sync,
    {
        self.summarize_many(&[crate::context::expr(name, f)])
    }

    /// One row per group: key columns followed by one column per expression.
    pub fn summarize_many(&self, exprs: &[NamedExpr<'_>]) -> FrameResult<Table> {
        let rows: Vec<Vec<Value>> = self.map_groups(|g| {
            let ctx = EvalContext::new(&g.table, Some(&g.key));
            exprs
                .iter()
                .map(|e| (e.expr)(&ctx)?.into_scalar(&e.name))
                .collect()
        })?;

        let mut columns = self.keys()?.into_columns();
        for (idx, e) in exprs.iter().enumerate() {
            let values: Vec<Value> = rows.iter().map(|r| r[idx].clone()).collect();
            let fallback = if rows.is_empty() {
                // No groups to learn the kind from; probe the empty template instead.
                let ctx = EvalContext::new(&self.template, None);
                (e.expr)(&ctx)
                    .and_then(|v| v.into_scalar(&e.name))
                    .ok()
                    .and_then(|v| v.column_type())
                    .unwrap_or_default()
            } else {
                ColumnType::default()
            };
            columns.push(Column::from_values_or(e.name.as_str(), values, fallback)?);
        }
        Table::with_row_count(columns, self.groups.len())
    }

    /// Sort rows within each group; group order is unchanged.
    pub fn arrange(&self, keys: &[SortKey]) -> FrameResult<Grouping> {
        let tables = self.map_groups(|g| g.table.arrange(keys))?;
        Ok(self.with_tables(tables, self.template.clone()))
    }

    pub fn head(&self, n: usize) -> FrameResult<Grouping> {
        let tables = self.map_groups(|g| Ok(g.table.head(n)))?;
        Ok(self.with_tables(tables, self.template.clone()))
    }

    pub fn tail(&self, n: usize) -> FrameResult<Grouping> {
        let tables = self.map_groups(|g| Ok(g.table.tail(n)))?;
        Ok(self.with_tables(tables, self.template.clone()))
    }

    /// 1-based positional slice applied to every group. Positions past the end of a smaller
    /// group are skipped for that group; position 0 is still an error.
    pub fn slice(&self, indices: &[usize]) -> FrameResult<Grouping> {
        if indices.contains(&0) {
            return Err(FrameError::IndexOutOfRange {
                index: 0,
                nrow: self.nrow(),
            });
        }
        let tables = self.map_groups(|g| {
            let within: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| i <= g.table.nrow())
                .collect();
            g.table.slice(&within)
        })?;
        Ok(self.with_tables(tables, self.template.clone()))
    }

    /// Key columns plus the Int row count `n` of each group.
    pub fn count(&self) -> FrameResult<Table> {
        let counts = Column::ints(
            "n",
            self.groups.iter().map(|g| g.table.nrow() as i64),
        );
        let mut columns = self.keys()?.into_columns();
        columns.push(counts);
        Table::with_row_count(columns, self.groups.len())
    }
}

/// Bring per-group results to one kind per column. A column holding only nulls takes the kind
/// the other groups produced; two different non-null kinds are a `TypeMismatch`.
fn reconcile_kinds(tables: Vec<Table>) -> FrameResult<Vec<Table>> {
    let Some(first) = tables.first() else {
        return Ok(tables);
    };
    let mut kinds: Vec<Option<ColumnType>> = vec![None; first.ncol()];
    for table in &tables {
        for (slot, column) in kinds.iter_mut().zip(table.columns()) {
            if column.null_count() == column.len() {
                continue;
            }
            match slot {
                None => *slot = Some(column.column_type()),
                Some(kind) if *kind != column.column_type() => {
                    return Err(FrameError::TypeMismatch {
                        column: column.name().to_string(),
                        expected: *kind,
                        actual: column.column_type(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    tables
        .into_iter()
        .map(|table| {
            let rows = table.nrow();
            let columns = table
                .into_columns()
                .into_iter()
                .zip(&kinds)
                .map(|(column, kind)| match kind {
                    Some(kind) if column.column_type() != *kind => {
                        Column::nulls(column.name(), *kind, column.len())
                    }
                    _ => column,
                })
                .collect();
            Table::with_row_count(columns, rows)
        })
        .collect()
}
