//! Configuration options for graph serialization.
//!
//! Two structs configure a write:
//!
//! - [`WriteOptions`]: engine behavior (null handling, reference preservation,
//!   mapping key policy, extension key conflicts, depth limit)
//! - [`WriterOptions`]: formatting and buffering of the JSON encoder
//!
//! ## Examples
//!
//! ```rust
//! use serde_walk::{KeyPolicy, NullHandling, WriteOptions, WriterOptions};
//!
//! let options = WriteOptions::new()
//!     .with_null_handling(NullHandling::Skip)
//!     .with_key_policy(KeyPolicy::camel_case())
//!     .with_max_depth(Some(128));
//!
//! let format = WriterOptions::pretty().with_indent(4);
//! assert!(format.pretty);
//! ```

use std::fmt;
use std::sync::Arc;

/// What to do with composite members whose value is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NullHandling {
    /// Write the member as `"name": null`.
    #[default]
    Write,
    /// Omit the member entirely.
    Skip,
}

/// Whether shared and cyclic references are preserved.
///
/// With [`ReferenceHandling::None`] every composite is written in full each time
/// it is reached. A cyclic graph then never terminates on its own; the
/// `max_depth` guard turns it into [`Error::DepthExceeded`](crate::Error::DepthExceeded).
/// Callers that disable the guard own that risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReferenceHandling {
    #[default]
    None,
    /// Assign ids to composites and write repeats as back-references.
    Preserve,
}

impl ReferenceHandling {
    #[inline]
    #[must_use]
    pub const fn is_preserve(&self) -> bool {
        matches!(self, ReferenceHandling::Preserve)
    }
}

/// How extension-data keys that collide with declared members are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExtensionConflicts {
    /// Fail with [`Error::DuplicateKey`](crate::Error::DuplicateKey).
    #[default]
    Reject,
    /// Write both; the caller guarantees the extension set was pre-filtered.
    Allow,
}

type KeyFn = dyn Fn(&str) -> String + Send + Sync;

/// Transformation applied to mapping keys before they are written.
///
/// The policy is applied exactly once per mapping entry. It never touches
/// composite member names or extension-data keys. A policy that returns an
/// empty string is a configuration error.
///
/// # Examples
///
/// ```rust
/// use serde_walk::KeyPolicy;
///
/// assert_eq!(KeyPolicy::camel_case().apply("UserName"), "userName");
/// assert_eq!(KeyPolicy::snake_case().apply("UserName"), "user_name");
/// assert_eq!(KeyPolicy::Identity.apply("UserName"), "UserName");
/// ```
#[derive(Clone, Default)]
pub enum KeyPolicy {
    #[default]
    Identity,
    Transform(Arc<KeyFn>),
}

impl KeyPolicy {
    /// Wraps an arbitrary key transformation.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        KeyPolicy::Transform(Arc::new(f))
    }

    /// Lower-cases the leading run of upper-case characters.
    ///
    /// `"URLValue"` becomes `"urlValue"`, `"ID"` becomes `"id"`.
    #[must_use]
    pub fn camel_case() -> Self {
        Self::transform(to_camel_case)
    }

    /// Converts `PascalCase` and `camelCase` keys to `snake_case`.
    #[must_use]
    pub fn snake_case() -> Self {
        Self::transform(to_snake_case)
    }

    /// Applies the policy to a single key.
    pub fn apply(&self, key: &str) -> String {
        match self {
            KeyPolicy::Identity => key.to_string(),
            KeyPolicy::Transform(f) => f(key),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, KeyPolicy::Identity)
    }
}

impl fmt::Debug for KeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPolicy::Identity => f.write_str("Identity"),
            KeyPolicy::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

fn to_camel_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len());
    let mut leading = true;
    for (i, &ch) in chars.iter().enumerate() {
        if leading && ch.is_uppercase() {
            // keep the last capital of a run when a lower-case letter follows: "URLValue" -> "urlValue"
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if i > 0 && next_is_lower {
                leading = false;
                out.push(ch);
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            leading = false;
            out.push(ch);
        }
    }
    out
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// Engine configuration for a serialization session.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{ReferenceHandling, WriteOptions};
///
/// let options = WriteOptions::preserve_references();
/// assert_eq!(options.references, ReferenceHandling::Preserve);
/// assert_eq!(options.max_depth, Some(64));
/// ```
#[derive(Clone, Debug)]
pub struct WriteOptions {
    pub null_handling: NullHandling,
    pub references: ReferenceHandling,
    pub key_policy: KeyPolicy,
    pub extension_conflicts: ExtensionConflicts,
    /// Upper bound on the frame stack; `None` leaves it bounded only by memory.
    pub max_depth: Option<usize>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            null_handling: NullHandling::default(),
            references: ReferenceHandling::default(),
            key_policy: KeyPolicy::default(),
            extension_conflicts: ExtensionConflicts::default(),
            max_depth: Some(64),
        }
    }
}

impl WriteOptions {
    /// Creates default options: nulls written, no reference preservation,
    /// identity key policy, extension conflicts rejected, depth limit 64.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that preserve shared and cyclic references.
    #[must_use]
    pub fn preserve_references() -> Self {
        WriteOptions {
            references: ReferenceHandling::Preserve,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    #[must_use]
    pub fn with_references(mut self, references: ReferenceHandling) -> Self {
        self.references = references;
        self
    }

    #[must_use]
    pub fn with_key_policy(mut self, key_policy: KeyPolicy) -> Self {
        self.key_policy = key_policy;
        self
    }

    #[must_use]
    pub fn with_extension_conflicts(mut self, extension_conflicts: ExtensionConflicts) -> Self {
        self.extension_conflicts = extension_conflicts;
        self
    }

    /// Sets the frame stack limit. `None` disables the limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Formatting and buffering options for [`JsonWriter`](crate::JsonWriter).
///
/// # Examples
///
/// ```rust
/// use serde_walk::WriterOptions;
///
/// let options = WriterOptions::new();
/// assert_eq!(options.indent, 2);
/// assert!(!options.pretty);
/// ```
#[derive(Clone, Debug)]
pub struct WriterOptions {
    pub indent: usize,
    pub pretty: bool,
    /// Buffered bytes at which the writer asks the session to suspend.
    pub flush_threshold: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indent: 2,
            pretty: false,
            flush_threshold: 16 * 1024,
        }
    }
}

impl WriterOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for pretty-printed output with newlines and indentation.
    #[must_use]
    pub fn pretty() -> Self {
        WriterOptions {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the number of buffered bytes that triggers a suspension.
    #[must_use]
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }
}
