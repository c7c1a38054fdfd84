//! # serde_walk
//!
//! A non-recursive, resumable serialization engine for value graphs.
//!
//! The engine walks a graph described through the [`Describe`] trait and
//! turns it into a stream of tokens handed to a [`TokenSink`]. Instead of
//! recursing into nested values it keeps an explicit stack of frames, which
//! gives it three properties a recursive serializer lacks:
//!
//! - **No stack overflow**: nesting depth is bounded only by memory (and by
//!   [`WriteOptions::max_depth`], 64 by default)
//! - **Suspend and resume**: a sink can ask for a pause after any token; the
//!   [`Session`] keeps its place and continues when resumed
//! - **Reference preservation**: shared and cyclic graphs are written once,
//!   with later occurrences emitted as back-references
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Serialize;
//! use serde_walk::{to_string, to_value};
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! let user = User { id: 1, name: "Ada".into(), tags: vec!["admin".into()] };
//! let value = to_value(&user).unwrap();
//!
//! assert_eq!(
//!     to_string(&value).unwrap(),
//!     r#"{"id":1,"name":"Ada","tags":["admin"]}"#
//! );
//! ```
//!
//! ## Extension Data
//!
//! A composite may carry an overflow mapping whose entries are folded into
//! the composite's own object after its declared members:
//!
//! ```rust
//! use serde_walk::{to_string, value, Record, Value};
//!
//! let extra = match value!({ "debug": true }) {
//!     Value::Object(map) => map,
//!     _ => unreachable!(),
//! };
//! let record = Value::from(Record::new().with_field("id", 7).with_extension(extra));
//!
//! assert_eq!(to_string(&record).unwrap(), r#"{"id":7,"debug":true}"#);
//! ```
//!
//! ## Suspending
//!
//! [`JsonWriter`] signals a pause once its buffer reaches
//! [`WriterOptions::flush_threshold`]. Drive the [`Session`] by hand to
//! flush between steps:
//!
//! ```rust
//! use serde_walk::{value, JsonWriter, Progress, Session, WriteOptions, WriterOptions};
//!
//! let graph = value!([[1, 2], [3, 4]]);
//! let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new().with_flush_threshold(1));
//! let mut session = Session::new(Some(&graph), WriteOptions::new());
//!
//! let mut pauses = 0;
//! while session.resume(&mut writer).unwrap() == Progress::Suspended {
//!     writer.flush().unwrap();
//!     pauses += 1;
//! }
//! assert!(pauses > 0);
//! assert_eq!(writer.into_inner().unwrap(), b"[[1,2],[3,4]]");
//! ```

pub mod describe;
mod dispatch;
pub mod error;
mod frame;
pub mod macros;
pub mod map;
mod mapping;
pub mod options;
pub mod record;
mod refs;
pub mod ser;
pub mod session;
pub mod sink;
pub mod value;
pub mod writer;

pub use describe::{Describe, Entries, Entry, Identity, Kind, Member, Node, Scalar};
pub use error::{Error, Result};
pub use frame::ExtensionStatus;
pub use map::ValueMap;
pub use options::{
    ExtensionConflicts, KeyPolicy, NullHandling, ReferenceHandling, WriteOptions, WriterOptions,
};
pub use record::{Field, Record};
pub use ser::{to_value, ValueSerializer};
pub use session::{serialize, Outcome, Progress, Session};
pub use sink::{ContainerKind, Signal, Token, TokenRecorder, TokenSink};
pub use value::{Number, Value};
pub use writer::JsonWriter;

use std::io;

/// Writes `value` as compact JSON.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{to_string, value};
///
/// assert_eq!(to_string(&value!({ "x": 1 })).unwrap(), r#"{"x":1}"#);
/// ```
///
/// # Errors
///
/// Returns any error raised by the engine or the encoder, e.g.
/// [`Error::DepthExceeded`] for a cycle without reference preservation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string(value: &dyn Describe) -> Result<String> {
    to_string_with_options(value, WriteOptions::default(), WriterOptions::default())
}

/// Writes `value` as pretty-printed JSON.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{to_string_pretty, value};
///
/// assert_eq!(to_string_pretty(&value!({ "x": 1 })).unwrap(), "{\n  \"x\": 1\n}");
/// ```
///
/// # Errors
///
/// Returns any error raised by the engine or the encoder.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty(value: &dyn Describe) -> Result<String> {
    to_string_with_options(value, WriteOptions::default(), WriterOptions::pretty())
}

/// Writes `value` as JSON with custom engine and encoder options.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{to_string_with_options, value, KeyPolicy, WriteOptions, WriterOptions};
///
/// let options = WriteOptions::new().with_key_policy(KeyPolicy::camel_case());
/// let json = to_string_with_options(&value!({ "FirstName": "Ada" }), options, WriterOptions::new())
///     .unwrap();
/// assert_eq!(json, r#"{"firstName":"Ada"}"#);
/// ```
///
/// # Errors
///
/// Returns any error raised by the engine or the encoder.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options(
    value: &dyn Describe,
    options: WriteOptions,
    format: WriterOptions,
) -> Result<String> {
    let mut bytes = Vec::with_capacity(128);
    to_writer_with_options(&mut bytes, value, options, format)?;
    String::from_utf8(bytes).map_err(Error::custom)
}

/// Writes `value` as compact JSON to an `io::Write`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the writer fails, or any engine error.
pub fn to_writer<W>(writer: W, value: &dyn Describe) -> Result<()>
where
    W: io::Write,
{
    to_writer_with_options(writer, value, WriteOptions::default(), WriterOptions::default())
}

/// Writes `value` as JSON to an `io::Write`, flushing every time the encoder
/// buffer reaches its threshold.
///
/// # Errors
///
/// Returns [`Error::Io`] when the writer fails, or any engine error.
pub fn to_writer_with_options<W>(
    writer: W,
    value: &dyn Describe,
    options: WriteOptions,
    format: WriterOptions,
) -> Result<()>
where
    W: io::Write,
{
    let mut sink = JsonWriter::new(writer, format);
    let mut session = Session::new(Some(value), options);
    while session.resume(&mut sink)? == Progress::Suspended {
        sink.flush()?;
    }
    sink.into_inner()?;
    Ok(())
}
