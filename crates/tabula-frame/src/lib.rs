#![forbid(unsafe_code)]

//! In-memory columnar tables with a verb-oriented manipulation API.
//!
//! A [`Table`] is an ordered set of named, typed, nullable [`Column`]s. Verbs (`select`,
//! `filter`, `mutate`, `summarize`, `arrange`, joins, ...) never modify their input; each returns
//! a new table. [`Table::group_by`] partitions a table into a [`Grouping`] whose verbs run per
//! group.

pub mod agg;
pub mod bitmap;
pub mod column;
pub mod context;
pub mod error;
pub mod group;
pub mod join;
pub mod select;
pub mod table;
pub mod types;
pub mod verbs;

pub use agg::NullPolicy;
pub use bitmap::BitVec;
pub use column::{Column, ColumnData, Operand};
pub use context::{expr, EvalContext, Evaluated, ExprFn, NamedExpr};
pub use error::{FrameError, FrameResult, StructuralWarning};
pub use group::{Group, GroupKey, Grouping};
pub use join::{join, join_with, JoinKind, JoinSuffixes};
pub use select::{resolve, NamePredicate, NameSet, Resolution, Selector};
pub use table::{ColumnSchema, RowView, Table, TableBuilder};
pub use types::{ColumnType, Opaque, OpaqueValue, Value};
pub use verbs::{SortKey, DEFAULT_PREVIEW_ROWS};
