use std::fmt;

use crate::array::ElementKind;

pub type TableResult<T> = Result<T, TableError>;

/// which dimension of a table an error refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisType {
    Rows,
    Cols,
}

impl AxisType {
    pub fn is_row(self) -> bool {
        self == AxisType::Rows
    }

    pub fn is_col(self) -> bool {
        self == AxisType::Cols
    }
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisType::Rows => f.write_str("rows"),
            AxisType::Cols => f.write_str("cols"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("{op}: key {key} not found in {axis}")]
    KeyNotFound {
        op: &'static str,
        axis: AxisType,
        key: String,
    },

    #[error("{op}: ordinal {ordinal} out of bounds for {axis} of length {len}")]
    OrdinalOutOfBounds {
        op: &'static str,
        axis: AxisType,
        ordinal: usize,
        len: usize,
    },

    #[error("{op}: duplicate key {key} in {axis}")]
    DuplicateKey {
        op: &'static str,
        axis: AxisType,
        key: String,
    },

    #[error("{op}: type mismatch at column {column}, expected {expected} but column holds {found}")]
    TypeMismatch {
        op: &'static str,
        column: String,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("{op}: shape mismatch, left is {left:?} and right is {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("{op}: column {column} is not a numeric type: {kind}")]
    NotNumeric {
        op: &'static str,
        column: String,
        kind: ElementKind,
    },

    #[error("{op}: values {left} and {right} of {column} are not comparable")]
    NotComparable {
        op: &'static str,
        column: String,
        left: String,
        right: String,
    },

    #[error("{op}: {reason} at column {column}")]
    ArithmeticInvalid {
        op: &'static str,
        column: String,
        reason: String,
    },

    #[error("{op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    #[error("{op}: failed to read from source")]
    Source {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl TableError {
    pub(crate) fn key_not_found(op: &'static str, axis: AxisType, key: &impl fmt::Debug) -> Self {
        TableError::KeyNotFound {
            op,
            axis,
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn duplicate_key(op: &'static str, axis: AxisType, key: &impl fmt::Debug) -> Self {
        TableError::DuplicateKey {
            op,
            axis,
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn not_numeric(op: &'static str, column: &impl fmt::Debug, kind: ElementKind) -> Self {
        TableError::NotNumeric {
            op,
            column: format!("{column:?}"),
            kind,
        }
    }

    pub(crate) fn invalid_argument(op: &'static str, reason: impl Into<String>) -> Self {
        TableError::InvalidArgument {
            op,
            reason: reason.into(),
        }
    }
}

/// a kind violation raised by [`crate::array::Array`], which has no notion of column keys;
/// the frame lifts it into [`TableError::TypeMismatch`] with the offending column attached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindError {
    pub expected: ElementKind,
    pub found: ElementKind,
}

impl KindError {
    pub fn at(self, op: &'static str, column: &impl fmt::Debug) -> TableError {
        TableError::TypeMismatch {
            op,
            column: format!("{column:?}"),
            expected: self.expected,
            found: self.found,
        }
    }
}

impl fmt::Display for KindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} but found {}", self.expected, self.found)
    }
}
