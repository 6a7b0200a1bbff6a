use crate::types::ColumnType;
use std::fmt;

pub type FrameResult<T> = Result<T, FrameError>;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("selection conflict: {0}")]
    SelectionConflict(String),

    #[error("dimension mismatch in {context}: expected {expected} values, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("summary {column} must be a single value, got a sequence of {len}")]
    NonScalarValue { column: String, len: usize },

    #[error("row index {index} out of range 1..={nrow}")]
    IndexOutOfRange { index: usize, nrow: usize },

    #[error("type mismatch in {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("cannot mutate grouping column {column}")]
    GroupingColumn { column: String },

    #[error("invalid column name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl FrameError {
    pub(crate) fn unknown_column(column: impl Into<String>) -> Self {
        FrameError::UnknownColumn {
            column: column.into(),
        }
    }

    pub(crate) fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        FrameError::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// Non-fatal diagnostics. The operation that produced one still completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StructuralWarning {
    /// A selection resolved to zero columns.
    EmptySelection,
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralWarning::EmptySelection => {
                f.write_str("selection resolved to zero columns; result is a column-empty table")
            }
        }
    }
}
