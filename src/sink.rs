//! The token sink interface.
//!
//! The engine emits six kinds of tokens. A sink accepts every token it is
//! given and reports through [`Signal`] whether it can take more right now.
//! [`Signal::Full`] makes the session suspend after the current step; the
//! caller drains the sink and resumes.
//!
//! [`TokenRecorder`] keeps tokens in memory and can simulate backpressure,
//! which makes it the natural sink for tests.

use crate::{Result, Scalar, Value};

/// Backpressure signal returned by every sink call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Ready,
    /// The token was accepted but the sink wants the session to yield.
    Full,
}

/// Container flavor passed to [`TokenSink::open_container`] and
/// [`TokenSink::close_container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Composite,
    Collection,
    Mapping,
}

/// Receives the token stream of a session.
///
/// Errors are propagated to the caller untouched and abort the session.
pub trait TokenSink {
    fn write_leaf(&mut self, scalar: &Scalar<'_>) -> Result<Signal>;

    fn write_null(&mut self) -> Result<Signal>;

    /// Opens a container. `reference_id` is set when references are preserved.
    fn open_container(&mut self, kind: ContainerKind, reference_id: Option<u64>)
        -> Result<Signal>;

    fn close_container(&mut self, kind: ContainerKind) -> Result<Signal>;

    fn write_key(&mut self, key: &str) -> Result<Signal>;

    /// Refers to a container already written with `reference_id`.
    fn write_back_reference(&mut self, reference_id: u64) -> Result<Signal>;
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    fn write_leaf(&mut self, scalar: &Scalar<'_>) -> Result<Signal> {
        (**self).write_leaf(scalar)
    }

    fn write_null(&mut self) -> Result<Signal> {
        (**self).write_null()
    }

    fn open_container(
        &mut self,
        kind: ContainerKind,
        reference_id: Option<u64>,
    ) -> Result<Signal> {
        (**self).open_container(kind, reference_id)
    }

    fn close_container(&mut self, kind: ContainerKind) -> Result<Signal> {
        (**self).close_container(kind)
    }

    fn write_key(&mut self, key: &str) -> Result<Signal> {
        (**self).write_key(key)
    }

    fn write_back_reference(&mut self, reference_id: u64) -> Result<Signal> {
        (**self).write_back_reference(reference_id)
    }
}

/// An owned token, as recorded by [`TokenRecorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Leaf(Value),
    Null,
    Open(ContainerKind, Option<u64>),
    Close(ContainerKind),
    Key(String),
    BackReference(u64),
}

/// A sink that records tokens in memory.
///
/// With [`TokenRecorder::pausing_every`] it reports [`Signal::Full`] after
/// every `n`th token, so a session can be driven through every possible
/// suspension point.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{value, ContainerKind, Progress, Session, Token, TokenRecorder, WriteOptions};
///
/// let graph = value!([1, 2]);
/// let mut recorder = TokenRecorder::pausing_every(1);
/// let mut session = Session::new(Some(&graph), WriteOptions::new());
///
/// let mut pauses = 0;
/// while session.resume(&mut recorder).unwrap() == Progress::Suspended {
///     pauses += 1;
/// }
///
/// assert_eq!(pauses, 3);
/// assert_eq!(recorder.tokens()[0], Token::Open(ContainerKind::Collection, None));
/// ```
#[derive(Debug, Default)]
pub struct TokenRecorder {
    tokens: Vec<Token>,
    pause_every: Option<usize>,
    since_pause: usize,
}

impl TokenRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that signals `Full` after every `n` tokens.
    #[must_use]
    pub fn pausing_every(n: usize) -> Self {
        TokenRecorder {
            pause_every: Some(n.max(1)),
            ..Default::default()
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    fn record(&mut self, token: Token) -> Result<Signal> {
        self.tokens.push(token);
        match self.pause_every {
            Some(n) => {
                self.since_pause += 1;
                if self.since_pause >= n {
                    self.since_pause = 0;
                    Ok(Signal::Full)
                } else {
                    Ok(Signal::Ready)
                }
            }
            None => Ok(Signal::Ready),
        }
    }
}

impl TokenSink for TokenRecorder {
    fn write_leaf(&mut self, scalar: &Scalar<'_>) -> Result<Signal> {
        self.record(Token::Leaf(Value::from(scalar.clone())))
    }

    fn write_null(&mut self) -> Result<Signal> {
        self.record(Token::Null)
    }

    fn open_container(
        &mut self,
        kind: ContainerKind,
        reference_id: Option<u64>,
    ) -> Result<Signal> {
        self.record(Token::Open(kind, reference_id))
    }

    fn close_container(&mut self, kind: ContainerKind) -> Result<Signal> {
        self.record(Token::Close(kind))
    }

    fn write_key(&mut self, key: &str) -> Result<Signal> {
        self.record(Token::Key(key.to_string()))
    }

    fn write_back_reference(&mut self, reference_id: u64) -> Result<Signal> {
        self.record(Token::BackReference(reference_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_pauses() {
        let mut recorder = TokenRecorder::pausing_every(2);
        assert_eq!(recorder.write_null().unwrap(), Signal::Ready);
        assert_eq!(recorder.write_null().unwrap(), Signal::Full);
        assert_eq!(recorder.write_key("a").unwrap(), Signal::Ready);
        assert_eq!(recorder.tokens().len(), 3);
    }

    #[test]
    fn test_recorder_never_pauses_by_default() {
        let mut recorder = TokenRecorder::new();
        for _ in 0..10 {
            assert_eq!(recorder.write_null().unwrap(), Signal::Ready);
        }
    }
}
