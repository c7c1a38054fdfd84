//! The serialization session.
//!
//! A [`Session`] owns the frame stack and the reference tracker of one write.
//! [`Session::resume`] dispatches the top frame until the stack is empty or the
//! sink asks for a pause. Because the stack and the tracker are the entire
//! resumable state, pausing is just returning, and resuming is calling
//! `resume` again with the same sink.
//!
//! Sessions are single-threaded and not meant to be shared. Abandoning a
//! suspended session is always safe; tokens already handed to the sink stay
//! written.
//!
//! # Examples
//!
//! ```rust
//! use serde_walk::{value, JsonWriter, Progress, Session, WriteOptions, WriterOptions};
//!
//! let graph = value!({ "name": "Ada", "langs": ["en", "fr"] });
//! let mut writer = JsonWriter::new(Vec::new(), WriterOptions::new().with_flush_threshold(4));
//! let mut session = Session::new(Some(&graph), WriteOptions::new());
//!
//! while session.resume(&mut writer).unwrap() == Progress::Suspended {
//!     writer.flush().unwrap();
//! }
//!
//! let bytes = writer.into_inner().unwrap();
//! assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"name":"Ada","langs":["en","fr"]}"#);
//! ```

use crate::describe::Node;
use crate::dispatch::{self, Context, Emitter, Step};
use crate::frame::{Frame, FrameStack};
use crate::refs::ReferenceTracker;
use crate::sink::TokenSink;
use crate::{Error, Result, WriteOptions};

/// What a call to [`Session::resume`] achieved.
#[must_use = "a suspended session has more tokens to write"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Every token has been written.
    Complete,
    /// The sink asked for a pause; call `resume` again to continue.
    Suspended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    Complete,
    Failed,
}

/// An in-progress, resumable write of one value graph.
pub struct Session<'g> {
    stack: FrameStack<'g>,
    refs: ReferenceTracker,
    options: WriteOptions,
    state: State,
}

impl<'g> Session<'g> {
    /// Creates a session for `root`. `None` writes a single null.
    pub fn new(root: Option<Node<'g>>, options: WriteOptions) -> Self {
        tracing::debug!(
            references = options.references.is_preserve(),
            max_depth = ?options.max_depth,
            "session started"
        );
        Session {
            stack: FrameStack::new(Frame::root(root), options.max_depth),
            refs: ReferenceTracker::new(),
            options,
            state: State::Running,
        }
    }

    /// Writes tokens into `sink` until the graph is done or the sink is full.
    ///
    /// # Errors
    ///
    /// Any error aborts the session: the stack and the reference tracker are
    /// dropped and later calls return [`Error::SessionFailed`].
    pub fn resume<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> Result<Progress> {
        match self.state {
            State::Complete => return Ok(Progress::Complete),
            State::Failed => return Err(Error::SessionFailed),
            State::Running => {}
        }

        match self.run(sink) {
            Ok(Progress::Complete) => {
                tracing::debug!(references = self.refs.len(), "session complete");
                self.refs.release();
                self.state = State::Complete;
                Ok(Progress::Complete)
            }
            Ok(Progress::Suspended) => {
                tracing::debug!(depth = self.stack.depth(), "session suspended");
                Ok(Progress::Suspended)
            }
            Err(err) => {
                tracing::debug!(error = %err, depth = self.stack.depth(), "session aborted");
                self.abort();
                Err(err)
            }
        }
    }

    fn run<S: TokenSink + ?Sized>(&mut self, sink: &mut S) -> Result<Progress> {
        let mut out = Emitter::new(sink);

        while let Some(frame) = self.stack.top_mut() {
            let mut cx = Context {
                out: &mut out,
                refs: &mut self.refs,
                options: &self.options,
            };
            let step = dispatch::step(frame, &mut cx)?;
            tracing::trace!(depth = self.stack.depth(), step = step.name(), "dispatched");

            match step {
                Step::Push(child) => self.stack.push(child)?,
                Step::Leaf | Step::Closed => {
                    self.stack.pop();
                }
                Step::Opened | Step::Emitted => {}
            }

            if out.take_full() && !self.stack.is_empty() {
                return Ok(Progress::Suspended);
            }
        }

        Ok(Progress::Complete)
    }

    fn abort(&mut self) {
        self.stack.clear();
        self.refs.release();
        self.state = State::Failed;
    }

    /// Returns `true` once every token has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    /// Current number of frames on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }
}

/// Result of [`serialize`]: either done, or a handle to resume later.
#[must_use = "a suspended outcome carries the session needed to finish the write"]
pub enum Outcome<'g> {
    Complete,
    Suspended(Session<'g>),
}

/// Starts writing `root` into `sink`.
///
/// Returns [`Outcome::Suspended`] with the session when the sink asks for a
/// pause before the graph is done.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{serialize, value, Outcome, Progress, TokenRecorder, WriteOptions};
///
/// let graph = value!([1, [2, 3]]);
/// let mut sink = TokenRecorder::pausing_every(2);
///
/// let mut outcome = serialize(Some(&graph), WriteOptions::new(), &mut sink).unwrap();
/// while let Outcome::Suspended(mut session) = outcome {
///     outcome = match session.resume(&mut sink).unwrap() {
///         Progress::Complete => Outcome::Complete,
///         Progress::Suspended => Outcome::Suspended(session),
///     };
/// }
/// assert_eq!(sink.tokens().len(), 7);
/// ```
pub fn serialize<'g, S: TokenSink + ?Sized>(
    root: Option<Node<'g>>,
    options: WriteOptions,
    sink: &mut S,
) -> Result<Outcome<'g>> {
    let mut session = Session::new(root, options);
    Ok(match session.resume(sink)? {
        Progress::Complete => Outcome::Complete,
        Progress::Suspended => Outcome::Suspended(session),
    })
}
