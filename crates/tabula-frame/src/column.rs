#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::error::{FrameError, FrameResult};
use crate::types::{ColumnType, Opaque, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// Typed storage backing a [`Column`]. `None` marks a null cell.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
    String(Vec<Option<Arc<str>>>),
    Boolean(Vec<Option<bool>>),
    Object(Vec<Option<Opaque>>),
}

macro_rules! for_each_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int($v) => $body,
            ColumnData::Double($v) => $body,
            ColumnData::String($v) => $body,
            ColumnData::Boolean($v) => $body,
            ColumnData::Object($v) => $body,
        }
    };
}

macro_rules! map_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int($v) => ColumnData::Int($body),
            ColumnData::Double($v) => ColumnData::Double($body),
            ColumnData::String($v) => ColumnData::String($body),
            ColumnData::Boolean($v) => ColumnData::Boolean($body),
            ColumnData::Object($v) => ColumnData::Object($body),
        }
    };
}

impl ColumnData {
    fn with_capacity(kind: ColumnType, capacity: usize) -> Self {
        match kind {
            ColumnType::Int => ColumnData::Int(Vec::with_capacity(capacity)),
            ColumnType::Double => ColumnData::Double(Vec::with_capacity(capacity)),
            ColumnType::String => ColumnData::String(Vec::with_capacity(capacity)),
            ColumnType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            ColumnType::Object => ColumnData::Object(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int(_) => ColumnType::Int,
            ColumnData::Double(_) => ColumnType::Double,
            ColumnData::String(_) => ColumnType::String,
            ColumnData::Boolean(_) => ColumnType::Boolean,
            ColumnData::Object(_) => ColumnType::Object,
        }
    }

    pub fn len(&self) -> usize {
        for_each_data!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, row: usize) -> Value {
        match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().into(),
            ColumnData::Double(v) => v.get(row).copied().flatten().into(),
            ColumnData::String(v) => v.get(row).cloned().flatten().into(),
            ColumnData::Boolean(v) => v.get(row).copied().flatten().into(),
            ColumnData::Object(v) => v.get(row).cloned().flatten().into(),
        }
    }

    fn is_null_at(&self, row: usize) -> bool {
        for_each_data!(self, v => v.get(row).map_or(true, |x| x.is_none()))
    }

    /// Append a value whose kind has already been checked (or is null).
    fn push(&mut self, value: Value) -> Result<(), Value> {
        match (self, value) {
            (ColumnData::Int(v), Value::Null) => v.push(None),
            (ColumnData::Double(v), Value::Null) => v.push(None),
            (ColumnData::String(v), Value::Null) => v.push(None),
            (ColumnData::Boolean(v), Value::Null) => v.push(None),
            (ColumnData::Object(v), Value::Null) => v.push(None),
            (ColumnData::Int(v), Value::Int(x)) => v.push(Some(x)),
            (ColumnData::Double(v), Value::Double(x)) => v.push(Some(x)),
            (ColumnData::String(v), Value::String(x)) => v.push(Some(x)),
            (ColumnData::Boolean(v), Value::Boolean(x)) => v.push(Some(x)),
            (ColumnData::Object(v), Value::Object(x)) => v.push(Some(x)),
            (_, other) => return Err(other),
        }
        Ok(())
    }
}

/// A named, homogeneous, nullable sequence of values.
///
/// Columns are immutable once built: every transformation returns a new column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn from_data(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Build a column of a declared kind. Every non-null value must match `kind`.
    pub fn new(name: impl Into<String>, kind: ColumnType, values: Vec<Value>) -> FrameResult<Self> {
        let name = name.into();
        let mut data = ColumnData::with_capacity(kind, values.len());
        for value in values {
            if let Err(rejected) = data.push(value) {
                return Err(FrameError::TypeMismatch {
                    column: name,
                    expected: kind,
                    actual: rejected.column_type().unwrap_or(kind),
                });
            }
        }
        Ok(Self { name, data })
    }

    /// Build a column, inferring the kind from the first non-null value.
    ///
    /// An all-null (or empty) input becomes a `String` column.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> FrameResult<Self> {
        Self::from_values_or(name, values, ColumnType::String)
    }

    pub(crate) fn from_values_or(
        name: impl Into<String>,
        values: Vec<Value>,
        fallback: ColumnType,
    ) -> FrameResult<Self> {
        let kind = values
            .iter()
            .find_map(Value::column_type)
            .unwrap_or(fallback);
        Self::new(name, kind, values)
    }

    pub fn ints<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<i64>>,
    {
        Self::from_data(
            name,
            ColumnData::Int(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn doubles<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<f64>>,
    {
        Self::from_data(
            name,
            ColumnData::Double(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn strings<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
        T: AsRef<str>,
    {
        Self::from_data(
            name,
            ColumnData::String(
                values
                    .into_iter()
                    .map(|v| v.map(|s| Arc::<str>::from(s.as_ref())))
                    .collect(),
            ),
        )
    }

    pub fn booleans<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<bool>>,
    {
        Self::from_data(
            name,
            ColumnData::Boolean(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn objects<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<Opaque>>,
    {
        Self::from_data(name, ColumnData::Object(values.into_iter().collect()))
    }

    /// A column of `len` nulls.
    pub fn nulls(name: impl Into<String>, kind: ColumnType, len: usize) -> Self {
        let data = match kind {
            ColumnType::Int => ColumnData::Int(vec![None; len]),
            ColumnType::Double => ColumnData::Double(vec![None; len]),
            ColumnType::String => ColumnData::String(vec![None; len]),
            ColumnType::Boolean => ColumnData::Boolean(vec![None; len]),
            ColumnType::Object => ColumnData::Object(vec![None; len]),
        };
        Self::from_data(name, data)
    }

    /// Repeat a scalar `len` times. A null scalar produces a column of `fallback` kind.
    pub fn broadcast(
        name: impl Into<String>,
        value: &Value,
        len: usize,
        fallback: ColumnType,
    ) -> Self {
        let name = name.into();
        match value {
            Value::Null => Self::nulls(name, fallback, len),
            Value::Int(v) => Self::ints(name, std::iter::repeat(*v).take(len)),
            Value::Double(v) => Self::doubles(name, std::iter::repeat(*v).take(len)),
            Value::String(v) => Self::from_data(name, ColumnData::String(vec![Some(v.clone()); len])),
            Value::Boolean(v) => Self::booleans(name, std::iter::repeat(*v).take(len)),
            Value::Object(v) => Self::from_data(name, ColumnData::Object(vec![Some(v.clone()); len])),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn null_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.data.is_null_at(i)).count()
    }

    pub fn is_null_at(&self, row: usize) -> bool {
        self.data.is_null_at(row)
    }

    /// Value at a 0-based row; out-of-range rows read as null.
    pub fn get(&self, row: usize) -> Value {
        self.data.get(row)
    }

    /// Checked access; `row` is 0-based but the error reports the 1-based index.
    pub fn try_get(&self, row: usize) -> FrameResult<Value> {
        if row >= self.len() {
            return Err(FrameError::IndexOutOfRange {
                index: row + 1,
                nrow: self.len(),
            });
        }
        Ok(self.data.get(row))
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.data.get(i))
    }

    pub fn values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: self.data.clone(),
        }
    }

    fn mismatch(&self, expected: ColumnType) -> FrameError {
        FrameError::TypeMismatch {
            column: self.name.clone(),
            expected,
            actual: self.column_type(),
        }
    }

    pub fn as_ints(&self) -> FrameResult<&[Option<i64>]> {
        match &self.data {
            ColumnData::Int(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Int)),
        }
    }

    pub fn as_doubles(&self) -> FrameResult<&[Option<f64>]> {
        match &self.data {
            ColumnData::Double(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Double)),
        }
    }

    pub fn as_strings(&self) -> FrameResult<&[Option<Arc<str>>]> {
        match &self.data {
            ColumnData::String(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::String)),
        }
    }

    pub fn as_booleans(&self) -> FrameResult<&[Option<bool>]> {
        match &self.data {
            ColumnData::Boolean(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Boolean)),
        }
    }

    pub fn as_objects(&self) -> FrameResult<&[Option<Opaque>]> {
        match &self.data {
            ColumnData::Object(v) => Ok(v),
            _ => Err(self.mismatch(ColumnType::Object)),
        }
    }

    /// Numeric view of an Int or Double column.
    pub fn numbers(&self) -> FrameResult<Vec<Option<f64>>> {
        match &self.data {
            ColumnData::Int(v) => Ok(v.iter().map(|x| x.map(|x| x as f64)).collect()),
            ColumnData::Double(v) => Ok(v.clone()),
            _ => Err(self.mismatch(ColumnType::Double)),
        }
    }

    /// Apply `f` to every non-null value. Null rows stay null and never reach `f`.
    ///
    /// The result kind is inferred from the produced values; an all-null result keeps this
    /// column's kind.
    pub fn map<T, F>(&self, f: F) -> FrameResult<Column>
    where
        T: Into<Value>,
        F: Fn(&Value) -> T,
    {
        let values = self
            .iter()
            .map(|v| if v.is_null() { Value::Null } else { f(&v).into() })
            .collect();
        Self::from_values_or(self.name.clone(), values, self.column_type())
    }

    /// Like [`Column::map`] but `f` also sees null rows and may turn them into values.
    pub fn map_nullable<T, F>(&self, f: F) -> FrameResult<Column>
    where
        T: Into<Value>,
        F: Fn(&Value) -> T,
    {
        let values = self.iter().map(|v| f(&v).into()).collect();
        Self::from_values_or(self.name.clone(), values, self.column_type())
    }

    /// Keep rows whose mask bit is set.
    pub fn filter(&self, mask: &BitVec) -> FrameResult<Column> {
        if mask.len() != self.len() {
            return Err(FrameError::dimension(
                format!("filter mask for {}", self.name),
                self.len(),
                mask.len(),
            ));
        }
        let rows: Vec<usize> = mask.iter_ones().collect();
        Ok(self.take(&rows))
    }

    /// Gather rows by 0-based index. Callers guarantee the indices are in range.
    pub(crate) fn take(&self, rows: &[usize]) -> Column {
        let data = map_data!(&self.data, v => rows.iter().map(|&r| v[r].clone()).collect());
        Self::from_data(self.name.clone(), data)
    }

    /// Gather rows where `None` produces a null cell (used for unmatched join rows).
    pub(crate) fn take_opt(&self, rows: &[Option<usize>]) -> Column {
        let data = map_data!(&self.data, v => rows
            .iter()
            .map(|r| r.and_then(|r| v[r].clone()))
            .collect());
        Self::from_data(self.name.clone(), data)
    }

    /// Append `other` to a copy of this column. Kinds must match, except that a side holding
    /// only nulls takes on the other side's kind.
    pub(crate) fn concat(&self, other: &Column) -> FrameResult<Column> {
        if self.column_type() != other.column_type() {
            if self.null_count() == self.len() {
                let lhs = Self::nulls(self.name.clone(), other.column_type(), self.len());
                return lhs.concat(other);
            }
            if other.null_count() == other.len() {
                let rhs = Self::nulls(other.name.clone(), self.column_type(), other.len());
                return self.concat(&rhs);
            }
        }
        let data = match (&self.data, &other.data) {
            (ColumnData::Int(a), ColumnData::Int(b)) => ColumnData::Int([&a[..], &b[..]].concat()),
            (ColumnData::Double(a), ColumnData::Double(b)) => {
                ColumnData::Double([&a[..], &b[..]].concat())
            }
            (ColumnData::String(a), ColumnData::String(b)) => {
                ColumnData::String([&a[..], &b[..]].concat())
            }
            (ColumnData::Boolean(a), ColumnData::Boolean(b)) => {
                ColumnData::Boolean([&a[..], &b[..]].concat())
            }
            (ColumnData::Object(a), ColumnData::Object(b)) => {
                ColumnData::Object([&a[..], &b[..]].concat())
            }
            _ => return Err(self.mismatch_with(other)),
        };
        Ok(Self::from_data(self.name.clone(), data))
    }

    fn mismatch_with(&self, other: &Column) -> FrameError {
        FrameError::TypeMismatch {
            column: other.name.clone(),
            expected: self.column_type(),
            actual: other.column_type(),
        }
    }

    fn compare_mask(&self, rhs: &Value, accept: impl Fn(Ordering) -> bool) -> BitVec {
        self.iter()
            .map(|v| compare_values(&v, rhs).is_some_and(&accept))
            .collect()
    }

    /// Rows equal to `value`. Nulls never match; ints and doubles compare numerically.
    pub fn equals(&self, value: impl Into<Value>) -> BitVec {
        self.compare_mask(&value.into(), |o| o == Ordering::Equal)
    }

    /// Rows that are non-null and differ from `value`.
    pub fn not_equals(&self, value: impl Into<Value>) -> BitVec {
        let value = value.into();
        self.iter()
            .map(|v| !v.is_null() && compare_values(&v, &value) != Some(Ordering::Equal))
            .collect()
    }

    pub fn gt(&self, value: impl Into<Value>) -> BitVec {
        self.compare_mask(&value.into(), |o| o == Ordering::Greater)
    }

    pub fn ge(&self, value: impl Into<Value>) -> BitVec {
        self.compare_mask(&value.into(), |o| o != Ordering::Less)
    }

    pub fn lt(&self, value: impl Into<Value>) -> BitVec {
        self.compare_mask(&value.into(), |o| o == Ordering::Less)
    }

    pub fn le(&self, value: impl Into<Value>) -> BitVec {
        self.compare_mask(&value.into(), |o| o != Ordering::Greater)
    }

    pub fn is_null(&self) -> BitVec {
        (0..self.len()).map(|i| self.data.is_null_at(i)).collect()
    }

    pub fn is_not_null(&self) -> BitVec {
        self.is_null().not()
    }

    pub fn is_in<I, T>(&self, values: I) -> BitVec
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let wanted: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.iter()
            .map(|v| {
                wanted
                    .iter()
                    .any(|w| compare_values(&v, w) == Some(Ordering::Equal))
            })
            .collect()
    }

    /// Truthiness of a Boolean column as a mask; nulls are false.
    pub fn as_mask(&self) -> FrameResult<BitVec> {
        Ok(self
            .as_booleans()?
            .iter()
            .map(|b| b.unwrap_or(false))
            .collect())
    }
}

/// Comparison used by the mask helpers. `None` when either side is null or the kinds are not
/// comparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Object(x), Value::Object(y)) => (x == y).then_some(Ordering::Equal),
        _ => None,
    }
}

/// Right-hand side of column arithmetic.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    Column(&'a Column),
    Int(i64),
    Double(f64),
}

impl<'a> From<&'a Column> for Operand<'a> {
    fn from(c: &'a Column) -> Self {
        Operand::Column(c)
    }
}

impl From<i64> for Operand<'_> {
    fn from(v: i64) -> Self {
        Operand::Int(v)
    }
}

impl From<f64> for Operand<'_> {
    fn from(v: f64) -> Self {
        Operand::Double(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Column {
    pub fn add<'a>(&self, rhs: impl Into<Operand<'a>>) -> FrameResult<Column> {
        self.arith(rhs.into(), ArithOp::Add)
    }

    pub fn sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> FrameResult<Column> {
        self.arith(rhs.into(), ArithOp::Sub)
    }

    pub fn mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> FrameResult<Column> {
        self.arith(rhs.into(), ArithOp::Mul)
    }

    /// Division always yields a Double column.
    pub fn div<'a>(&self, rhs: impl Into<Operand<'a>>) -> FrameResult<Column> {
        self.arith(rhs.into(), ArithOp::Div)
    }

    /// Element-wise arithmetic with null propagation. Int ⊕ Int stays Int (overflow yields
    /// null) except for division.
    fn arith(&self, rhs: Operand<'_>, op: ArithOp) -> FrameResult<Column> {
        if !self.column_type().is_numeric() {
            return Err(self.mismatch(ColumnType::Double));
        }
        let rhs_values: Vec<Value> = match rhs {
            Operand::Column(c) => {
                if !c.column_type().is_numeric() {
                    return Err(c.mismatch(ColumnType::Double));
                }
                if c.len() != self.len() {
                    return Err(FrameError::dimension(
                        format!("arithmetic on {}", self.name),
                        self.len(),
                        c.len(),
                    ));
                }
                c.values()
            }
            Operand::Int(v) => vec![Value::Int(v); self.len()],
            Operand::Double(v) => vec![Value::Double(v); self.len()],
        };

        let all_int = op != ArithOp::Div
            && self.column_type() == ColumnType::Int
            && rhs_values.iter().all(|v| matches!(v, Value::Int(_) | Value::Null));

        if all_int {
            let out = self
                .iter()
                .zip(&rhs_values)
                .map(|(a, b)| match (a.as_i64(), b.as_i64()) {
                    (Some(a), Some(b)) => match op {
                        ArithOp::Add => a.checked_add(b),
                        ArithOp::Sub => a.checked_sub(b),
                        ArithOp::Mul => a.checked_mul(b),
                        ArithOp::Div => None,
                    },
                    _ => None,
                });
            return Ok(Column::ints(self.name.clone(), out));
        }

        let out = self
            .iter()
            .zip(&rhs_values)
            .map(|(a, b)| match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => Some(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                }),
                _ => None,
            });
        Ok(Column::doubles(self.name.clone(), out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn heterogeneous_values_are_rejected() {
        let err = Column::from_values("x", vec![Value::Int(1), Value::from("a")]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::TypeMismatch {
                expected: ColumnType::Int,
                actual: ColumnType::String,
                ..
            }
        ));
    }

    #[test]
    fn map_preserves_null_positions() {
        let col = Column::ints("x", [Some(1), None, Some(3)]);
        let mapped = col.map(|v| v.as_i64().unwrap_or_default() * 10).unwrap();
        assert_eq!(mapped.values(), vec![Value::Int(10), Value::Null, Value::Int(30)]);
    }

    #[test]
    fn all_null_map_keeps_kind() {
        let col = Column::doubles("x", [None::<f64>, None]);
        let mapped = col.map(|v| v.as_f64().unwrap_or_default()).unwrap();
        assert_eq!(mapped.column_type(), ColumnType::Double);
    }

    #[test]
    fn filter_rejects_short_mask() {
        let col = Column::ints("x", [1, 2, 3]);
        let mask = BitVec::from(vec![true, false]);
        assert!(matches!(
            col.filter(&mask),
            Err(FrameError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn comparisons_treat_null_as_false() {
        let col = Column::ints("x", [Some(1), None, Some(3)]);
        assert_eq!(col.gt(1).iter().collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(col.not_equals(1).iter().collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(col.equals(3.0).iter().collect::<Vec<_>>(), vec![false, false, true]);
        assert_eq!(col.is_null().iter().collect::<Vec<_>>(), vec![false, true, false]);
    }

    #[test]
    fn int_arithmetic_stays_int_and_division_widens() {
        let a = Column::ints("a", [Some(6), None, Some(i64::MAX)]);
        let b = Column::ints("b", [2, 2, 2]);

        assert_eq!(
            a.add(&b).unwrap().values(),
            vec![Value::Int(8), Value::Null, Value::Null]
        );
        let div = a.div(&b).unwrap();
        assert_eq!(div.column_type(), ColumnType::Double);
        assert_eq!(div.get(0), Value::Double(3.0));
        assert!(Column::strings("s", [Some("a")]).add(1).is_err());
    }

    #[test]
    fn typed_access_checks_kind() {
        let col = Column::strings("s", [Some("a"), None]);
        assert_eq!(col.as_strings().unwrap().len(), 2);
        assert!(matches!(
            col.as_ints(),
            Err(FrameError::TypeMismatch {
                expected: ColumnType::Int,
                actual: ColumnType::String,
                ..
            })
        ));
        assert!(matches!(
            col.try_get(2),
            Err(FrameError::IndexOutOfRange { index: 3, nrow: 2 })
        ));
    }
}
