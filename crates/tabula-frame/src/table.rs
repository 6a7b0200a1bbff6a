#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::{FrameError, FrameResult};
use crate::types::{ColumnType, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

/// An ordered set of equally long, uniquely named columns.
///
/// The row count is stored rather than derived so that a zero-column projection of an `n`-row
/// table still reports `n` rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
    rows: usize,
}

impl Default for Table {
    fn default() -> Self {
        Self::empty()
    }
}

impl Table {
    /// The degenerate 0×0 table.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            column_index: HashMap::new(),
            rows: 0,
        }
    }

    /// Build a table from columns. All columns must have the same length and distinct names.
    pub fn new(columns: Vec<Column>) -> FrameResult<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_row_count(columns, rows)
    }

    pub(crate) fn with_row_count(columns: Vec<Column>, rows: usize) -> FrameResult<Self> {
        let mut column_index = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(FrameError::dimension(
                    format!("column {}", column.name()),
                    rows,
                    column.len(),
                ));
            }
            if column_index.insert(column.name().to_string(), idx).is_some() {
                return Err(FrameError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
        }
        Ok(Self {
            columns,
            column_index,
            rows,
        })
    }

    /// Build a table row by row, inferring each column's kind from its first non-null value.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> FrameResult<Self> {
        let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(FrameError::dimension(
                    format!("row {}", idx + 1),
                    names.len(),
                    row.len(),
                ));
            }
            for (col, value) in row.into_iter().enumerate() {
                cells[col].push(value);
            }
        }
        let columns = names
            .iter()
            .zip(cells)
            .map(|(name, values)| Column::from_values(name.as_ref(), values))
            .collect::<FrameResult<Vec<_>>>()?;
        Self::new(columns)
    }

    pub fn nrow(&self) -> usize {
        self.rows
    }

    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn schema(&self) -> Vec<ColumnSchema> {
        self.columns
            .iter()
            .map(|c| ColumnSchema {
                name: c.name().to_string(),
                column_type: c.column_type(),
            })
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    pub(crate) fn column_idx(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.column_idx(name).map(|idx| &self.columns[idx])
    }

    pub fn column(&self, name: &str) -> FrameResult<&Column> {
        self.get_column(name)
            .ok_or_else(|| FrameError::unknown_column(name))
    }

    pub fn value(&self, row: usize, name: &str) -> FrameResult<Value> {
        self.column(name)?.try_get(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> + '_ {
        (0..self.rows).map(move |row| RowView { table: self, row })
    }

    /// Row view for a 0-based index.
    pub fn row(&self, row: usize) -> FrameResult<RowView<'_>> {
        if row >= self.rows {
            return Err(FrameError::IndexOutOfRange {
                index: row + 1,
                nrow: self.rows,
            });
        }
        Ok(RowView { table: self, row })
    }

    /// Gather rows by 0-based index, keeping every column.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            column_index: self.column_index.clone(),
            rows: rows.len(),
        }
    }

    /// Projection onto existing column names, in the order given.
    pub(crate) fn project(&self, names: &[String]) -> FrameResult<Table> {
        let columns = names
            .iter()
            .map(|n| self.column(n).cloned())
            .collect::<FrameResult<Vec<_>>>()?;
        Self::with_row_count(columns, self.rows)
    }

    /// Add a column, or replace the same-named column in place.
    pub(crate) fn with_column(&self, column: Column) -> FrameResult<Table> {
        if column.len() != self.rows && !self.columns.is_empty() {
            return Err(FrameError::dimension(
                format!("column {}", column.name()),
                self.rows,
                column.len(),
            ));
        }
        let rows = column.len();
        let mut columns = self.columns.clone();
        match self.column_idx(column.name()) {
            Some(idx) => columns[idx] = column,
            None => columns.push(column),
        }
        Self::with_row_count(columns, rows)
    }

    /// Vertically concatenate tables that share one schema.
    ///
    /// An empty input yields the 0×0 table; column-empty tables contribute only their rows.
    pub fn bind_rows(tables: &[Table]) -> FrameResult<Table> {
        let Some((first, rest)) = tables.split_first() else {
            return Ok(Table::empty());
        };
        let mut columns = first.columns.clone();
        let mut rows = first.rows;
        for table in rest {
            if table.ncol() != columns.len() {
                return Err(FrameError::dimension(
                    "bind_rows column count",
                    columns.len(),
                    table.ncol(),
                ));
            }
            for column in columns.iter_mut() {
                let other = table.column(column.name())?;
                *column = column.concat(other)?;
            }
            rows += table.rows;
        }
        Self::with_row_count(columns, rows)
    }
}

/// Read-only view of one row.
#[derive(Clone, Copy, Debug)]
pub struct RowView<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowView<'a> {
    /// 0-based position within the table.
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, name: &str) -> FrameResult<Value> {
        Ok(self.table.column(name)?.get(self.row))
    }

    pub fn get_int(&self, name: &str) -> FrameResult<Option<i64>> {
        Ok(self.table.column(name)?.as_ints()?[self.row])
    }

    pub fn get_double(&self, name: &str) -> FrameResult<Option<f64>> {
        Ok(self.table.column(name)?.as_doubles()?[self.row])
    }

    pub fn get_string(&self, name: &str) -> FrameResult<Option<Arc<str>>> {
        Ok(self.table.column(name)?.as_strings()?[self.row].clone())
    }

    pub fn get_boolean(&self, name: &str) -> FrameResult<Option<bool>> {
        Ok(self.table.column(name)?.as_booleans()?[self.row])
    }

    pub fn values(&self) -> Vec<Value> {
        self.table.columns.iter().map(|c| c.get(self.row)).collect()
    }
}

/// Row-oriented construction against a fixed schema.
pub struct TableBuilder {
    schema: Vec<ColumnSchema>,
    cells: Vec<Vec<Value>>,
    rows: usize,
}

impl TableBuilder {
    pub fn new(schema: Vec<ColumnSchema>) -> Self {
        let cells = vec![Vec::new(); schema.len()];
        Self {
            schema,
            cells,
            rows: 0,
        }
    }

    pub fn append_row(&mut self, row: &[Value]) -> FrameResult<()> {
        if row.len() != self.schema.len() {
            return Err(FrameError::dimension(
                format!("row {}", self.rows + 1),
                self.schema.len(),
                row.len(),
            ));
        }
        for (schema, value) in self.schema.iter().zip(row) {
            if let Some(actual) = value.column_type() {
                if actual != schema.column_type {
                    return Err(FrameError::TypeMismatch {
                        column: schema.name.clone(),
                        expected: schema.column_type,
                        actual,
                    });
                }
            }
        }
        for (cells, value) in self.cells.iter_mut().zip(row) {
            cells.push(value.clone());
        }
        self.rows += 1;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn finalize(self) -> FrameResult<Table> {
        let rows = self.rows;
        let columns = self
            .schema
            .into_iter()
            .zip(self.cells)
            .map(|(schema, values)| Column::new(schema.name, schema.column_type, values))
            .collect::<FrameResult<Vec<_>>>()?;
        Table::with_row_count(columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unequal_column_lengths_are_rejected() {
        let err = Table::new(vec![
            Column::ints("a", [1i64, 2]),
            Column::ints("b", [1i64]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            FrameError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Table::new(vec![Column::ints("a", [1i64]), Column::ints("a", [2i64])]).unwrap_err();
        assert!(matches!(err, FrameError::DuplicateColumn { .. }));
    }

    #[test]
    fn builder_checks_kinds() {
        let mut builder = TableBuilder::new(vec![ColumnSchema {
            name: "n".to_string(),
            column_type: ColumnType::Int,
        }]);
        builder.append_row(&[Value::Int(1)]).unwrap();
        builder.append_row(&[Value::Null]).unwrap();
        assert!(builder.append_row(&[Value::from("x")]).is_err());
        let table = builder.finalize().unwrap();
        assert_eq!(table.nrow(), 2);
        assert_eq!(table.value(1, "n").unwrap(), Value::Null);
    }

    #[test]
    fn bind_rows_concatenates_in_order() {
        let a = Table::new(vec![Column::ints("x", [1i64, 2])]).unwrap();
        let b = Table::new(vec![Column::ints("x", [3i64])]).unwrap();
        let both = Table::bind_rows(&[a, b]).unwrap();
        assert_eq!(
            both.column("x").unwrap().values(),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn row_view_typed_access() {
        let table = Table::from_rows(
            &["name", "age"],
            vec![vec!["Max".into(), 23.into()], vec!["Horst".into(), Value::Null]],
        )
        .unwrap();
        let row = table.row(1).unwrap();
        assert_eq!(row.get_int("age").unwrap(), None);
        assert_eq!(row.get_string("name").unwrap().as_deref(), Some("Horst"));
        assert!(row.get_double("age").is_err());
        assert!(table.row(2).is_err());
    }
}
