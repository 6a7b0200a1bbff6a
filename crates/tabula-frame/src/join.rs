//! Key-based joins.
//!
//! Matching uses [`GroupKey`] equality, so a null key matches a null key and the order in which
//! key columns appear in either table has no effect on the result.

use crate::column::Column;
use crate::error::{FrameError, FrameResult};
use crate::group::{partition, GroupKey, KeyColumns};
use crate::table::Table;
use crate::types::Value;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinKind {
    fn keeps_unmatched_left(self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Outer)
    }

    fn keeps_unmatched_right(self) -> bool {
        matches!(self, JoinKind::Right | JoinKind::Outer)
    }
}

/// Suffixes appended to clashing non-key column names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinSuffixes {
    pub left: String,
    pub right: String,
}

impl Default for JoinSuffixes {
    fn default() -> Self {
        Self {
            left: ".x".to_string(),
            right: ".y".to_string(),
        }
    }
}

pub fn join<S: AsRef<str>>(
    left: &Table,
    right: &Table,
    by: &[S],
    kind: JoinKind,
) -> FrameResult<Table> {
    join_with(left, right, by, kind, &JoinSuffixes::default())
}

/// Join on the columns `by`. An empty `by` pairs every left row with every right row.
pub fn join_with<S: AsRef<str>>(
    left: &Table,
    right: &Table,
    by: &[S],
    kind: JoinKind,
    suffixes: &JoinSuffixes,
) -> FrameResult<Table> {
    let by = key_names(left, right, by)?;
    let pairs = match_rows(left, right, &by, kind)?;

    let left_rows: Vec<Option<usize>> = pairs.iter().map(|(l, _)| *l).collect();
    let right_rows: Vec<Option<usize>> = pairs.iter().map(|(_, r)| *r).collect();

    let is_key = |name: &str| by.iter().any(|k| k == name);
    let clashes = |name: &str| !is_key(name) && left.has_column(name) && right.has_column(name);

    let mut columns: Vec<Column> = Vec::with_capacity(left.ncol() + right.ncol());
    for column in left.columns() {
        let name = column.name();
        if is_key(name) {
            columns.push(coalesce_key(column, right.column(name)?, &pairs)?);
        } else if clashes(name) {
            columns.push(
                column
                    .take_opt(&left_rows)
                    .with_name(format!("{name}{}", suffixes.left)),
            );
        } else {
            columns.push(column.take_opt(&left_rows));
        }
    }
    for column in right.columns() {
        let name = column.name();
        if is_key(name) {
            continue;
        }
        let gathered = column.take_opt(&right_rows);
        if clashes(name) {
            columns.push(gathered.with_name(format!("{name}{}", suffixes.right)));
        } else {
            columns.push(gathered);
        }
    }

    log::debug!(
        "{kind:?} join on {by:?}: {} x {} rows -> {} rows",
        left.nrow(),
        right.nrow(),
        pairs.len()
    );
    Table::with_row_count(columns, pairs.len())
}

/// Validate the key list: every key on both sides, same kind on both sides, no repeats.
fn key_names<S: AsRef<str>>(left: &Table, right: &Table, by: &[S]) -> FrameResult<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(by.len());
    for key in by {
        let key = key.as_ref();
        let l = left.column(key)?;
        let r = right.column(key)?;
        if l.column_type() != r.column_type() {
            return Err(FrameError::TypeMismatch {
                column: key.to_string(),
                expected: l.column_type(),
                actual: r.column_type(),
            });
        }
        if !names.iter().any(|n| n == key) {
            names.push(key.to_string());
        }
    }
    Ok(names)
}

/// Row pairs in output order: each left row followed by its matches in right order, then the
/// unmatched right rows when `kind` keeps them.
fn match_rows(
    left: &Table,
    right: &Table,
    by: &[String],
    kind: JoinKind,
) -> FrameResult<Vec<(Option<usize>, Option<usize>)>> {
    let index: HashMap<GroupKey, Vec<usize>> = partition(right, by)?.into_iter().collect();
    let left_keys = KeyColumns::new(left, by)?;

    let mut matched_right = vec![false; right.nrow()];
    let mut pairs = Vec::new();
    for row in 0..left.nrow() {
        match index.get(&left_keys.key(row)) {
            Some(matches) => {
                for &r in matches {
                    matched_right[r] = true;
                    pairs.push((Some(row), Some(r)));
                }
            }
            None if kind.keeps_unmatched_left() => pairs.push((Some(row), None)),
            None => {}
        }
    }
    if kind.keeps_unmatched_right() {
        pairs.extend(
            matched_right
                .iter()
                .enumerate()
                .filter(|(_, matched)| !**matched)
                .map(|(r, _)| (None, Some(r))),
        );
    }
    Ok(pairs)
}

/// Key column values come from the left row, or from the right row when there is no left row.
fn coalesce_key(
    left: &Column,
    right: &Column,
    pairs: &[(Option<usize>, Option<usize>)],
) -> FrameResult<Column> {
    let values = pairs
        .iter()
        .map(|pair| match pair {
            (Some(l), _) => left.get(*l),
            (None, Some(r)) => right.get(*r),
            (None, None) => Value::Null,
        })
        .collect();
    Column::new(left.name(), left.column_type(), values)
}

fn filter_by_match<S: AsRef<str>>(
    left: &Table,
    right: &Table,
    by: &[S],
    keep_matched: bool,
) -> FrameResult<Table> {
    let by = key_names(left, right, by)?;
    let index: HashMap<GroupKey, Vec<usize>> = partition(right, &by)?.into_iter().collect();
    let left_keys = KeyColumns::new(left, &by)?;
    let rows: Vec<usize> = (0..left.nrow())
        .filter(|&row| index.contains_key(&left_keys.key(row)) == keep_matched)
        .collect();
    Ok(left.take_rows(&rows))
}

impl Table {
    pub fn inner_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        join(self, right, by, JoinKind::Inner)
    }

    pub fn left_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        join(self, right, by, JoinKind::Left)
    }

    pub fn right_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        join(self, right, by, JoinKind::Right)
    }

    pub fn outer_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        join(self, right, by, JoinKind::Outer)
    }

    /// Rows of `self` that have at least one match in `right`; only `self`'s columns are kept.
    pub fn semi_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        filter_by_match(self, right, by, true)
    }

    /// Rows of `self` without a match in `right`.
    pub fn anti_join<S: AsRef<str>>(&self, right: &Table, by: &[S]) -> FrameResult<Table> {
        filter_by_match(self, right, by, false)
    }
}
