//! A JSON token sink.
//!
//! [`JsonWriter`] renders the token stream as JSON text into an internal
//! buffer and reports [`Signal::Full`] once the buffer reaches
//! [`WriterOptions::flush_threshold`]. The caller then calls
//! [`JsonWriter::flush`] to hand the buffered text to the underlying
//! [`io::Write`] and resumes the session.
//!
//! ## Reference metadata
//!
//! With reference preservation enabled the writer emits the conventional
//! `$id`/`$ref` metadata:
//!
//! - an object with an id opens as `{"$id":"1",...}`
//! - a collection with an id is wrapped as `{"$id":"2","$values":[...]}`
//! - a back-reference is written as `{"$ref":"1"}`
//!
//! ## Leaves
//!
//! Integers are written as-is. Floats keep a fractional part (`1.0`, not
//! `1`); NaN and infinities are rejected with
//! [`Error::UnsupportedValue`]. Dates are RFC 3339 strings and big integers
//! are decimal strings.

use crate::describe::Scalar;
use crate::value::format_date;
use crate::sink::{ContainerKind, Signal, TokenSink};
use crate::{Error, Result, WriterOptions};
use std::fmt::Write as _;
use std::io;

struct Scope {
    close: char,
    /// A collection wrapped in a `$values` object; closing it closes the wrapper too.
    wrapped: bool,
    len: usize,
}

/// Writes the token stream as JSON.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{value, JsonWriter, Progress, Session, WriteOptions, WriterOptions};
///
/// let graph = value!({ "a": [1, 2.5, null] });
/// let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new());
/// let mut session = Session::new(Some(&graph), WriteOptions::new());
/// assert_eq!(session.resume(&mut writer).unwrap(), Progress::Complete);
///
/// let json = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(json, r#"{"a":[1,2.5,null]}"#);
/// ```
pub struct JsonWriter<W: io::Write> {
    out: W,
    buf: String,
    options: WriterOptions,
    scopes: Vec<Scope>,
    after_key: bool,
}

impl<W: io::Write> JsonWriter<W> {
    pub fn new(out: W, options: WriterOptions) -> Self {
        JsonWriter {
            out,
            buf: String::with_capacity(options.flush_threshold.min(64 * 1024)),
            options,
            scopes: Vec::new(),
            after_key: false,
        }
    }

    /// Number of bytes buffered but not yet flushed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Hands the buffered text to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the underlying writer fails.
    pub fn flush(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.out.write_all(self.buf.as_bytes())?;
            self.buf.clear();
        }
        self.out.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the final flush fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.out)
    }

    fn signal(&self) -> Signal {
        if self.buf.len() >= self.options.flush_threshold {
            Signal::Full
        } else {
            Signal::Ready
        }
    }

    fn write_newline(&mut self) {
        if self.options.pretty {
            self.buf.push('\n');
            let width = self.scopes.len() * self.options.indent;
            self.buf.extend(std::iter::repeat(' ').take(width));
        }
    }

    /// Separator and indentation before a key or an element.
    fn begin_value(&mut self) {
        if std::mem::take(&mut self.after_key) {
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        let first = scope.len == 0;
        scope.len += 1;
        if !first {
            self.buf.push(',');
        }
        self.write_newline();
    }

    fn push_key(&mut self, key: &str) {
        self.begin_value();
        write_string(&mut self.buf, key);
        self.buf.push(':');
        if self.options.pretty {
            self.buf.push(' ');
        }
        self.after_key = true;
    }

    fn push_open(&mut self, open: char, close: char, wrapped: bool) {
        self.buf.push(open);
        self.scopes.push(Scope {
            close,
            wrapped,
            len: 0,
        });
    }

    fn push_close(&mut self) -> Result<bool> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| Error::custom("container closed without being opened"))?;
        if scope.len > 0 {
            self.write_newline();
        }
        self.buf.push(scope.close);
        Ok(scope.wrapped)
    }

    fn write_float(&mut self, v: f64) -> Result<()> {
        if !v.is_finite() {
            return Err(Error::unsupported_value(format!(
                "{} has no JSON representation",
                v
            )));
        }
        if v.fract() == 0.0 {
            let _ = write!(self.buf, "{:.1}", v);
        } else {
            let _ = write!(self.buf, "{}", v);
        }
        Ok(())
    }
}

impl<W: io::Write> TokenSink for JsonWriter<W> {
    fn write_leaf(&mut self, scalar: &Scalar<'_>) -> Result<Signal> {
        self.begin_value();
        match scalar {
            Scalar::Null => self.buf.push_str("null"),
            Scalar::Bool(b) => self.buf.push_str(if *b { "true" } else { "false" }),
            Scalar::I64(i) => {
                let _ = write!(self.buf, "{}", i);
            }
            Scalar::U64(u) => {
                let _ = write!(self.buf, "{}", u);
            }
            Scalar::F64(f) => self.write_float(*f)?,
            Scalar::Str(s) => write_string(&mut self.buf, s),
            Scalar::DateTime(dt) => write_string(&mut self.buf, &format_date(dt)),
            Scalar::BigInt(bi) => write_string(&mut self.buf, &bi.to_string()),
        }
        Ok(self.signal())
    }

    fn write_null(&mut self) -> Result<Signal> {
        self.begin_value();
        self.buf.push_str("null");
        Ok(self.signal())
    }

    fn open_container(
        &mut self,
        kind: ContainerKind,
        reference_id: Option<u64>,
    ) -> Result<Signal> {
        self.begin_value();
        match (kind, reference_id) {
            (ContainerKind::Collection, None) => self.push_open('[', ']', false),
            (ContainerKind::Collection, Some(id)) => {
                self.push_open('{', '}', false);
                self.push_key("$id");
                self.begin_value();
                write_string(&mut self.buf, &id.to_string());
                self.push_key("$values");
                self.begin_value();
                self.push_open('[', ']', true);
            }
            (_, None) => self.push_open('{', '}', false),
            (_, Some(id)) => {
                self.push_open('{', '}', false);
                self.push_key("$id");
                self.begin_value();
                write_string(&mut self.buf, &id.to_string());
            }
        }
        Ok(self.signal())
    }

    fn close_container(&mut self, _kind: ContainerKind) -> Result<Signal> {
        if self.push_close()? {
            self.push_close()?;
        }
        Ok(self.signal())
    }

    fn write_key(&mut self, key: &str) -> Result<Signal> {
        self.push_key(key);
        Ok(self.signal())
    }

    fn write_back_reference(&mut self, reference_id: u64) -> Result<Signal> {
        self.begin_value();
        self.buf.push_str("{\"$ref\":");
        if self.options.pretty {
            self.buf.push(' ');
        }
        write_string(&mut self.buf, &reference_id.to_string());
        self.buf.push('}');
        Ok(self.signal())
    }
}

fn write_string(buf: &mut String, s: &str) {
    buf.push('"');
    for ch in s.chars() {
        match ch {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{0008}' => buf.push_str("\\b"),
            '\u{000C}' => buf.push_str("\\f"),
            c if c < '\u{0020}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            _ => buf.push(ch),
        }
    }
    buf.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn render(f: impl FnOnce(&mut JsonWriter<Vec<u8>>)) -> String {
        let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new());
        f(&mut writer);
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_escapes_strings() {
        let mut buf = String::new();
        write_string(&mut buf, "a\"b\\c\n\u{1}");
        assert_eq!(buf, r#""a\"b\\c\n\u0001""#);
    }

    #[test]
    fn test_floats_keep_fraction() {
        let json = render(|w| {
            w.open_container(ContainerKind::Collection, None).unwrap();
            w.write_leaf(&Scalar::F64(1.0)).unwrap();
            w.write_leaf(&Scalar::F64(-0.25)).unwrap();
            w.close_container(ContainerKind::Collection).unwrap();
        });
        assert_eq!(json, "[1.0,-0.25]");
    }

    #[test]
    fn test_rejects_non_finite_floats() {
        let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new());
        let err = writer.write_leaf(&Scalar::F64(f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue(_)));
    }

    #[test]
    fn test_reference_metadata() {
        let json = render(|w| {
            w.open_container(ContainerKind::Composite, Some(1)).unwrap();
            w.write_key("items").unwrap();
            w.open_container(ContainerKind::Collection, Some(2)).unwrap();
            w.write_back_reference(1).unwrap();
            w.close_container(ContainerKind::Collection).unwrap();
            w.write_key("name").unwrap();
            w.write_leaf(&Scalar::Str(Cow::Borrowed("x"))).unwrap();
            w.close_container(ContainerKind::Composite).unwrap();
        });
        assert_eq!(
            json,
            r#"{"$id":"1","items":{"$id":"2","$values":[{"$ref":"1"}]},"name":"x"}"#
        );
    }

    #[test]
    fn test_pretty_output() {
        let mut writer = JsonWriter::new(Vec::new(), WriterOptions::pretty());
        writer.open_container(ContainerKind::Mapping, None).unwrap();
        writer.write_key("a").unwrap();
        writer.open_container(ContainerKind::Collection, None).unwrap();
        writer.write_leaf(&Scalar::I64(1)).unwrap();
        writer.close_container(ContainerKind::Collection).unwrap();
        writer.write_key("b").unwrap();
        writer.open_container(ContainerKind::Mapping, None).unwrap();
        writer.close_container(ContainerKind::Mapping).unwrap();
        writer.close_container(ContainerKind::Mapping).unwrap();

        let json = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(json, "{\n  \"a\": [\n    1\n  ],\n  \"b\": {}\n}");
    }

    #[test]
    fn test_signals_full_at_threshold() {
        let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new().with_flush_threshold(4));
        writer.open_container(ContainerKind::Collection, None).unwrap();
        assert_eq!(writer.write_leaf(&Scalar::I64(1)).unwrap(), Signal::Ready);
        assert_eq!(writer.write_leaf(&Scalar::I64(2)).unwrap(), Signal::Full);
        writer.flush().unwrap();
        assert_eq!(writer.buffered(), 0);
    }
}
