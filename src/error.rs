//! Error types for graph serialization.
//!
//! Every error aborts the session that raised it. Nothing is recovered
//! locally: a partially traversed graph with preserved references would leave
//! the reference tracker out of step with what the sink has already seen.
//!
//! ## Error Categories
//!
//! - **Configuration**: the options or a type descriptor cannot produce a usable
//!   token stream (empty key from a key policy, undeterminable shape)
//! - **Unsupported shape**: a collection or mapping offers no usable entry cursor
//! - **Depth**: the frame stack hit the configured `max_depth`
//! - **Sink**: the token sink failed (I/O, unrepresentable leaf)
//!
//! ## Examples
//!
//! ```rust
//! use serde_walk::{to_string_with_options, value, Error, KeyPolicy, WriteOptions, WriterOptions};
//!
//! let map = value!({ "name": { "first": "Ada" } });
//! let options = WriteOptions::new().with_key_policy(KeyPolicy::transform(|_| String::new()));
//! let err = to_string_with_options(&map, options, WriterOptions::new()).unwrap_err();
//! assert!(matches!(err, Error::Configuration(_)));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while walking a value graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error reported by a sink
    #[error("IO error: {0}")]
    Io(String),

    /// The options or a type descriptor cannot produce a valid token stream
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An extension-data key collides with a declared member of its composite
    #[error("Extension data key '{0}' collides with a declared member")]
    DuplicateKey(String),

    /// A collection or mapping exposes no recognized entry access pattern
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    /// The frame stack would grow beyond the configured maximum depth
    #[error("Maximum depth of {max} exceeded; the graph may contain a cycle (enable reference preservation to write it)")]
    DepthExceeded { max: usize },

    /// A leaf value the sink cannot represent
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// `resume` was called on a session that already failed
    #[error("Session previously failed and cannot be resumed")]
    SessionFailed,

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a configuration error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_walk::Error;
    ///
    /// let err = Error::configuration("key policy returned an empty key");
    /// assert!(err.to_string().contains("empty key"));
    /// ```
    pub fn configuration<T: fmt::Display>(msg: T) -> Self {
        Error::Configuration(msg.to_string())
    }

    /// Creates an unsupported shape error.
    pub fn unsupported_shape<T: fmt::Display>(msg: T) -> Self {
        Error::UnsupportedShape(msg.to_string())
    }

    /// Creates an unsupported value error for leaves a sink cannot encode.
    pub fn unsupported_value<T: fmt::Display>(msg: T) -> Self {
        Error::UnsupportedValue(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_walk::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for sink write failures.
    pub fn io<T: fmt::Display>(msg: T) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err)
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
