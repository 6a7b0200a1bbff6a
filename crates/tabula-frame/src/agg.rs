//! Null-aware column reductions used inside `summarize` expressions.
//!
//! Every reduction takes a [`NullPolicy`]. With [`NullPolicy::Propagate`] (the default) a single
//! null input makes the result null; [`NullPolicy::Exclude`] drops nulls first.

use crate::column::{Column, ColumnData};
use crate::error::{FrameError, FrameResult};
use crate::types::{ColumnType, Value};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NullPolicy {
    #[default]
    Propagate,
    Exclude,
}

impl NullPolicy {
    pub fn excludes_nulls(self) -> bool {
        self == NullPolicy::Exclude
    }
}

impl Column {
    /// Non-null numeric values, or `None` when a null must propagate.
    fn numeric_inputs(&self, policy: NullPolicy) -> FrameResult<Option<Vec<f64>>> {
        let values = self.numbers()?;
        if policy == NullPolicy::Propagate && values.iter().any(Option::is_none) {
            return Ok(None);
        }
        Ok(Some(values.into_iter().flatten().collect()))
    }

    /// Sum of a numeric column. Int columns sum to Int (null on overflow); an empty input sums
    /// to zero.
    pub fn sum(&self, policy: NullPolicy) -> FrameResult<Value> {
        if let ColumnData::Int(values) = self.data() {
            if policy == NullPolicy::Propagate && values.iter().any(Option::is_none) {
                return Ok(Value::Null);
            }
            let total = values
                .iter()
                .flatten()
                .try_fold(0i64, |acc, v| acc.checked_add(*v));
            return Ok(total.into());
        }
        Ok(self
            .numeric_inputs(policy)?
            .map(|v| Value::Double(v.iter().sum()))
            .unwrap_or(Value::Null))
    }

    pub fn mean(&self, policy: NullPolicy) -> FrameResult<Value> {
        Ok(match self.numeric_inputs(policy)? {
            Some(v) if !v.is_empty() => Value::Double(v.iter().sum::<f64>() / v.len() as f64),
            _ => Value::Null,
        })
    }

    pub fn median(&self, policy: NullPolicy) -> FrameResult<Value> {
        let Some(mut v) = self.numeric_inputs(policy)? else {
            return Ok(Value::Null);
        };
        if v.is_empty() {
            return Ok(Value::Null);
        }
        v.sort_by(f64::total_cmp);
        let mid = v.len() / 2;
        let median = if v.len() % 2 == 0 {
            (v[mid - 1] + v[mid]) / 2.0
        } else {
            v[mid]
        };
        Ok(Value::Double(median))
    }

    /// Sample standard deviation (`n - 1` denominator); fewer than two values yield null.
    pub fn sd(&self, policy: NullPolicy) -> FrameResult<Value> {
        let Some(v) = self.numeric_inputs(policy)? else {
            return Ok(Value::Null);
        };
        if v.len() < 2 {
            return Ok(Value::Null);
        }
        let n = v.len() as f64;
        let mean = v.iter().sum::<f64>() / n;
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Ok(Value::Double(var.sqrt()))
    }

    pub fn min(&self, policy: NullPolicy) -> FrameResult<Value> {
        self.extreme(policy, std::cmp::Ordering::Less)
    }

    pub fn max(&self, policy: NullPolicy) -> FrameResult<Value> {
        self.extreme(policy, std::cmp::Ordering::Greater)
    }

    fn extreme(&self, policy: NullPolicy, keep: std::cmp::Ordering) -> FrameResult<Value> {
        if self.column_type() == ColumnType::Object {
            return Err(FrameError::TypeMismatch {
                column: self.name().to_string(),
                expected: ColumnType::Double,
                actual: ColumnType::Object,
            });
        }
        let mut best: Option<Value> = None;
        for value in self.iter() {
            if value.is_null() {
                if policy == NullPolicy::Propagate {
                    return Ok(Value::Null);
                }
                continue;
            }
            best = match best {
                Some(current) if value.sort_cmp(&current) != keep => Some(current),
                _ => Some(value),
            };
        }
        Ok(best.unwrap_or(Value::Null))
    }

    /// Number of distinct values. Under [`NullPolicy::Propagate`] null counts as one value.
    pub fn n_distinct(&self, policy: NullPolicy) -> usize {
        self.iter()
            .filter(|v| !(policy.excludes_nulls() && v.is_null()))
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn count_non_null(&self) -> usize {
        self.len() - self.null_count()
    }

    pub fn first(&self) -> Value {
        self.get(0)
    }

    pub fn last(&self) -> Value {
        self.len()
            .checked_sub(1)
            .map(|i| self.get(i))
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_propagate_by_default() {
        let col = Column::doubles("x", [Some(1.0), None, Some(3.0)]);
        assert_eq!(col.mean(NullPolicy::Propagate).unwrap(), Value::Null);
        assert_eq!(col.mean(NullPolicy::Exclude).unwrap(), Value::Double(2.0));
        assert_eq!(col.sum(NullPolicy::Exclude).unwrap(), Value::Double(4.0));
    }

    #[test]
    fn int_sum_stays_int() {
        let col = Column::ints("x", [Some(2i64), Some(5), None]);
        assert_eq!(col.sum(NullPolicy::Exclude).unwrap(), Value::Int(7));
        assert_eq!(col.sum(NullPolicy::Propagate).unwrap(), Value::Null);
        assert_eq!(Column::ints("e", Vec::<i64>::new()).sum(NullPolicy::Propagate).unwrap(), Value::Int(0));
    }

    #[test]
    fn extremes_and_spread() {
        let col = Column::ints("x", [Some(4i64), None, Some(1), Some(7)]);
        assert_eq!(col.min(NullPolicy::Exclude).unwrap(), Value::Int(1));
        assert_eq!(col.max(NullPolicy::Exclude).unwrap(), Value::Int(7));
        assert_eq!(col.min(NullPolicy::Propagate).unwrap(), Value::Null);
        assert_eq!(col.median(NullPolicy::Exclude).unwrap(), Value::Double(4.0));

        let sd = Column::doubles("y", [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .sd(NullPolicy::Propagate)
            .unwrap()
            .as_f64()
            .unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn distinct_counts_null_only_when_propagating() {
        let col = Column::strings("s", [Some("a"), None, Some("a"), None, Some("b")]);
        assert_eq!(col.n_distinct(NullPolicy::Propagate), 3);
        assert_eq!(col.n_distinct(NullPolicy::Exclude), 2);
        assert_eq!(col.count_non_null(), 3);
    }

    #[test]
    fn strings_order_lexicographically() {
        let col = Column::strings("s", [Some("pear"), Some("apple")]);
        assert_eq!(col.min(NullPolicy::Propagate).unwrap(), Value::from("apple"));
        assert_eq!(col.last(), Value::from("apple"));
    }
}
