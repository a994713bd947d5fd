//! Error types for mapper construction, cell coercion, and pipeline passes.

use crate::value::Kind;
use std::io;

/// Boxed error returned by custom coercion capabilities and callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of every failure the crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotAnAggregate,
    UntaggedField,
    DuplicateHeader,
    MissingHeader,
    UnsupportedType,
    UnparsableValue,
    CustomDecode,
    MarshalFailure,
    Io,
    Callback,
    Cancelled,
}

/// Failure converting a single cell to or from a typed value.
#[derive(Debug, thiserror::Error)]
pub enum CoerceError {
    #[error("cannot parse {text:?} as {kind}")]
    Unparsable { text: String, kind: Kind },

    #[error("list item {index}: cannot parse {text:?} as {kind}")]
    UnparsableItem {
        index: usize,
        text: String,
        kind: Kind,
    },

    #[error("unsupported field type {0}")]
    Unsupported(Kind),

    #[error("custom unmarshal failed: {0}")]
    Custom(#[source] BoxError),

    #[error("list item {index}: custom unmarshal failed: {source}")]
    CustomItem {
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("marshal failed: {0}")]
    Marshal(#[source] BoxError),
}

impl CoerceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoerceError::Unparsable { .. } | CoerceError::UnparsableItem { .. } => {
                ErrorKind::UnparsableValue
            }
            CoerceError::Unsupported(_) => ErrorKind::UnsupportedType,
            CoerceError::Custom(_) | CoerceError::CustomItem { .. } => ErrorKind::CustomDecode,
            CoerceError::Marshal(_) => ErrorKind::MarshalFailure,
        }
    }
}

/// A cell failure annotated with the column position and the field it targets.
#[derive(Debug, thiserror::Error)]
#[error("column {column} (field `{field}`): {source}")]
pub struct FieldError {
    pub column: usize,
    pub field: &'static str,
    #[source]
    pub source: CoerceError,
}

impl FieldError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Errors that abort mapper construction or a whole pipeline pass.
///
/// Row indices count data rows from zero; the header row is not counted.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("type {type_name} is not a record or a single boxed record")]
    NotAnAggregate { type_name: &'static str },

    #[error("field `{field}` has no column tag")]
    UntaggedField { field: &'static str },

    #[error("header {header:?} appears at index {first} and {second}")]
    DuplicateHeader {
        header: String,
        first: usize,
        second: usize,
    },

    #[error("no header matches column tag {header:?} of field `{field}`")]
    MissingHeader {
        header: String,
        field: &'static str,
    },

    #[error("field `{field}` has unsupported type {kind}")]
    UnsupportedType { field: &'static str, kind: Kind },

    #[error("decode row {row}: {source}")]
    Decode {
        row: usize,
        #[source]
        source: FieldError,
    },

    #[error("encode row {row}: {source}")]
    Encode {
        row: usize,
        #[source]
        source: FieldError,
    },

    #[error("read header row: {0}")]
    ReadHeader(#[source] io::Error),

    #[error("read row {row}: {source}")]
    Read {
        row: usize,
        #[source]
        source: io::Error,
    },

    #[error("write header row: {0}")]
    WriteHeader(#[source] io::Error),

    #[error("write row {row}: {source}")]
    Write {
        row: usize,
        #[source]
        source: io::Error,
    },

    #[error("flush: {0}")]
    Flush(#[source] io::Error),

    #[error("callback failed at row {row}: {source}")]
    Callback {
        row: usize,
        #[source]
        source: BoxError,
    },

    #[error("handoff queue disconnected at row {row}")]
    Disconnected { row: usize },

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotAnAggregate { .. } => ErrorKind::NotAnAggregate,
            Error::UntaggedField { .. } => ErrorKind::UntaggedField,
            Error::DuplicateHeader { .. } => ErrorKind::DuplicateHeader,
            Error::MissingHeader { .. } => ErrorKind::MissingHeader,
            Error::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Error::Decode { source, .. } | Error::Encode { source, .. } => source.kind(),
            Error::ReadHeader(_)
            | Error::Read { .. }
            | Error::WriteHeader(_)
            | Error::Write { .. }
            | Error::Flush(_) => ErrorKind::Io,
            Error::Callback { .. } => ErrorKind::Callback,
            Error::Disconnected { .. } | Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Data-row index the failure is attached to, if it happened past the header.
    pub fn row(&self) -> Option<usize> {
        match self {
            Error::Decode { row, .. }
            | Error::Encode { row, .. }
            | Error::Read { row, .. }
            | Error::Write { row, .. }
            | Error::Callback { row, .. }
            | Error::Disconnected { row } => Some(*row),
            _ => None,
        }
    }
}
