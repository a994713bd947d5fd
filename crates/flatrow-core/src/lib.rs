//! Flatrow: type-driven mapping between delimited text rows and typed records
//!
//! A record type describes its fields once (by hand through [`Schema`], or
//! with [`flat_record!`]). A [`Mapper`] reconciles that description with a
//! header row, then converts rows to records and back. The [`pipeline`]
//! functions drive a mapper over a whole row stream with backpressure and
//! cancellation.

#[macro_use]
mod macros;

mod coerce;
mod detect;
mod error;
mod mapper;
mod options;
pub mod pipeline;
mod row;
mod schema;
mod value;

pub use coerce::{Marshal, NIL, Unmarshal, escape_delimiter};
pub use detect::{CANDIDATES, DetectedSource, detect_delimiter, detect_source};
pub use error::{BoxError, CoerceError, Error, ErrorKind, FieldError};
pub use mapper::{Binding, Mapper};
pub use options::{ConfigError, Format, Options};
pub use pipeline::{
    HANDOFF_CAPACITY, handoff, marshal_channel, marshal_iter, unmarshal_to_channel,
    unmarshal_to_vec, unmarshal_with_callback,
};
pub use row::{CsvSink, CsvSource, RowSink, RowSource};
pub use schema::{FieldSlot, Record, Schema, Shape, Tag};
pub use value::{FieldType, Kind, Scalar, Value};

/// Re-exported so callers can build tokens without depending on `tokio-util`.
pub use tokio_util::sync::CancellationToken;
