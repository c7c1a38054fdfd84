//! Traversal frames and the frame stack.
//!
//! A frame is one level of in-progress composite serialization. The stack of
//! frames is the whole continuation of a write: every frame below the top is
//! parked mid-iteration with its cursor exactly where it was left, so a
//! suspended session resumes without restarting or re-querying any cursor.

use crate::describe::{Entries, Kind, Node};
use crate::{Error, Result};
use std::borrow::Cow;
use std::collections::HashSet;

/// Progress of folding a composite's extension data into its own container.
///
/// Only ever advances `Inactive -> Writing -> Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ExtensionStatus {
    #[default]
    Inactive,
    Writing,
    Finished,
}

/// States of the mapping traversal.
pub(crate) enum MapState<'g> {
    NoEnumeratorYet,
    Enumerating(Entries<'g>),
    Done,
}

/// Resumable position inside a frame's value.
pub(crate) enum Cursor<'g> {
    /// Nothing has been written for this frame yet.
    Fresh,
    /// Composite: index of the next declared member.
    Members(usize),
    /// Collection: the element cursor.
    Elements(Entries<'g>),
    /// Mapping, or a composite folding its extension data.
    Map(MapState<'g>),
}

pub(crate) struct Frame<'g> {
    pub(crate) kind: Kind,
    pub(crate) value: Option<Node<'g>>,
    pub(crate) cursor: Cursor<'g>,
    pub(crate) pending_key: Option<Cow<'g, str>>,
    pub(crate) extension: ExtensionStatus,
    /// Pop as soon as the mapping traversal finishes. Cleared while a composite
    /// folds extension data, since the composite still has to close itself.
    pub(crate) pop_on_end: bool,
    pub(crate) reference_id: Option<u64>,
    /// Declared member names an extension key must not repeat.
    pub(crate) reserved_keys: Option<HashSet<Cow<'g, str>>>,
}

impl<'g> Frame<'g> {
    pub(crate) fn root(value: Option<Node<'g>>) -> Self {
        let kind = value.map_or(Kind::Leaf, |node| node.kind());
        Frame::new(kind, value, None)
    }

    /// A child frame for an already classified container.
    pub(crate) fn child(node: Node<'g>, kind: Kind, key: Option<Cow<'g, str>>) -> Self {
        Frame::new(kind, Some(node), key)
    }

    fn new(kind: Kind, value: Option<Node<'g>>, pending_key: Option<Cow<'g, str>>) -> Self {
        Frame {
            kind,
            value,
            cursor: Cursor::Fresh,
            pending_key,
            extension: ExtensionStatus::Inactive,
            pop_on_end: true,
            reference_id: None,
            reserved_keys: None,
        }
    }

    #[inline]
    pub(crate) fn is_fresh(&self) -> bool {
        matches!(self.cursor, Cursor::Fresh)
    }

    pub(crate) fn set_extension(&mut self, next: ExtensionStatus) {
        debug_assert!(
            next > self.extension,
            "extension status must advance, {:?} -> {:?}",
            self.extension,
            next
        );
        self.extension = next;
    }

    #[inline]
    pub(crate) fn is_folding(&self) -> bool {
        self.extension == ExtensionStatus::Writing
    }

    /// Releases the mapping cursor of a frame that outlives its mapping.
    pub(crate) fn end_mapping(&mut self, member_count: usize) {
        self.cursor = Cursor::Members(member_count);
        self.reserved_keys = None;
        self.pop_on_end = true;
    }
}

/// The explicit continuation of a write. Depth is bounded only by
/// `max_depth`, never by the native call stack.
pub(crate) struct FrameStack<'g> {
    frames: Vec<Frame<'g>>,
    max_depth: Option<usize>,
}

impl<'g> FrameStack<'g> {
    pub(crate) fn new(root: Frame<'g>, max_depth: Option<usize>) -> Self {
        let mut frames = Vec::with_capacity(16);
        frames.push(root);
        FrameStack { frames, max_depth }
    }

    pub(crate) fn push(&mut self, frame: Frame<'g>) -> Result<()> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(Error::DepthExceeded { max });
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<Frame<'g>> {
        self.frames.pop()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame<'g>> {
        self.frames.last_mut()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_stack_depth_limit() {
        let leaf = Value::from(1);
        let mut stack = FrameStack::new(Frame::root(Some(&leaf)), Some(2));
        stack.push(Frame::child(&leaf, Kind::Leaf, None)).unwrap();
        let err = stack
            .push(Frame::child(&leaf, Kind::Leaf, None))
            .unwrap_err();
        assert_eq!(err, Error::DepthExceeded { max: 2 });
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_unbounded_stack() {
        let leaf = Value::from(1);
        let mut stack = FrameStack::new(Frame::root(Some(&leaf)), None);
        for _ in 0..10_000 {
            stack.push(Frame::child(&leaf, Kind::Leaf, None)).unwrap();
        }
        assert_eq!(stack.depth(), 10_001);
        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_extension_status_order() {
        assert!(ExtensionStatus::Inactive < ExtensionStatus::Writing);
        assert!(ExtensionStatus::Writing < ExtensionStatus::Finished);

        let leaf = Value::from(1);
        let mut frame = Frame::root(Some(&leaf));
        frame.set_extension(ExtensionStatus::Writing);
        assert!(frame.is_folding());
        frame.set_extension(ExtensionStatus::Finished);
        assert!(!frame.is_folding());
    }
}
