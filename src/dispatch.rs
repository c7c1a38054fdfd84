//! The value dispatcher.
//!
//! [`step`] advances the top frame by exactly one unit of work and reports
//! what happened. Opening a nested container never recurses: the dispatcher
//! hands the new frame back as [`Step::Push`] and the session loop dispatches
//! it on the next turn.
//!
//! Leaf children of composites, collections and mappings are written inline
//! (key and value together) without a frame of their own.

use crate::describe::{Kind, Node, Scalar};
use crate::frame::{Cursor, ExtensionStatus, Frame, MapState};
use crate::mapping;
use crate::refs::{ReferenceTracker, Tracked};
use crate::sink::{ContainerKind, Signal, TokenSink};
use crate::{Error, ExtensionConflicts, NullHandling, Result, WriteOptions};
use std::collections::HashSet;

/// Wraps a sink and remembers whether it asked for a suspension.
pub(crate) struct Emitter<'s, S: ?Sized> {
    sink: &'s mut S,
    full: bool,
}

impl<'s, S: TokenSink + ?Sized> Emitter<'s, S> {
    pub(crate) fn new(sink: &'s mut S) -> Self {
        Emitter { sink, full: false }
    }

    #[inline]
    fn note(&mut self, signal: Signal) {
        if signal == Signal::Full {
            self.full = true;
        }
    }

    /// Returns and clears the pending suspension request.
    pub(crate) fn take_full(&mut self) -> bool {
        std::mem::take(&mut self.full)
    }

    pub(crate) fn key(&mut self, key: &str) -> Result<()> {
        let signal = self.sink.write_key(key)?;
        self.note(signal);
        Ok(())
    }

    pub(crate) fn null(&mut self) -> Result<()> {
        let signal = self.sink.write_null()?;
        self.note(signal);
        Ok(())
    }

    pub(crate) fn scalar(&mut self, scalar: &Scalar<'_>) -> Result<()> {
        let signal = match scalar {
            Scalar::Null => self.sink.write_null()?,
            _ => self.sink.write_leaf(scalar)?,
        };
        self.note(signal);
        Ok(())
    }

    pub(crate) fn open(&mut self, kind: ContainerKind, reference_id: Option<u64>) -> Result<()> {
        let signal = self.sink.open_container(kind, reference_id)?;
        self.note(signal);
        Ok(())
    }

    pub(crate) fn close(&mut self, kind: ContainerKind) -> Result<()> {
        let signal = self.sink.close_container(kind)?;
        self.note(signal);
        Ok(())
    }

    pub(crate) fn back_reference(&mut self, reference_id: u64) -> Result<()> {
        let signal = self.sink.write_back_reference(reference_id)?;
        self.note(signal);
        Ok(())
    }
}

/// Everything a step may touch besides the frame itself.
pub(crate) struct Context<'a, 's, S: ?Sized> {
    pub(crate) out: &'a mut Emitter<'s, S>,
    pub(crate) refs: &'a mut ReferenceTracker,
    pub(crate) options: &'a WriteOptions,
}

/// Result of one dispatch.
pub(crate) enum Step<'g> {
    /// Wrote a leaf (or null) for the frame itself; the frame is finished.
    Leaf,
    /// Wrote the frame's container-open token.
    Opened,
    /// Wrote zero or more tokens for one child; the frame continues.
    Emitted,
    /// A child container needs its own frame.
    Push(Frame<'g>),
    /// The frame's container is closed (or was a back-reference); pop it.
    Closed,
}

impl Step<'_> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Step::Leaf => "leaf",
            Step::Opened => "opened",
            Step::Emitted => "emitted",
            Step::Push(_) => "push",
            Step::Closed => "closed",
        }
    }
}

/// A child slot after lazy resolution.
pub(crate) enum Slot<'g> {
    /// The slot holds no value.
    Absent,
    /// An unresolved value whose resolution produced no value.
    Vanished,
    Present(Node<'g>, Kind),
}

/// Classifies a child slot, resolving an unresolved value exactly once.
pub(crate) fn classify(value: Option<Node<'_>>) -> Result<Slot<'_>> {
    let Some(node) = value else {
        return Ok(Slot::Absent);
    };
    match node.kind() {
        Kind::Unresolved => match node.resolve() {
            None => Ok(Slot::Vanished),
            Some(resolved) => match resolved.kind() {
                Kind::Unresolved => Err(Error::configuration(
                    "resolving a value produced another unresolved value",
                )),
                kind => Ok(Slot::Present(resolved, kind)),
            },
        },
        kind => Ok(Slot::Present(node, kind)),
    }
}

pub(crate) fn write_scalar<S: TokenSink + ?Sized>(
    node: Node<'_>,
    out: &mut Emitter<'_, S>,
) -> Result<()> {
    let scalar = node
        .scalar()
        .ok_or_else(|| Error::configuration("leaf value did not provide a scalar"))?;
    out.scalar(&scalar)
}

/// Advances the frame by one unit of work.
pub(crate) fn step<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    if frame.is_fresh() && frame.kind == Kind::Unresolved {
        match classify(frame.value)? {
            Slot::Present(node, kind) => {
                frame.value = Some(node);
                frame.kind = kind;
            }
            // only the root is pushed unresolved; keep its position with a null
            Slot::Absent | Slot::Vanished => frame.value = None,
        }
    }

    let Some(node) = frame.value else {
        return write_null_frame(frame, cx);
    };

    match frame.kind {
        Kind::Leaf => {
            write_pending_key(frame, cx)?;
            write_scalar(node, cx.out)?;
            Ok(Step::Leaf)
        }
        Kind::Composite => composite_step(frame, node, cx),
        Kind::Collection => collection_step(frame, node, cx),
        Kind::Mapping => mapping::step(frame, Some(node), cx),
        Kind::Unresolved => Err(Error::configuration(
            "value shape could not be determined",
        )),
    }
}

fn write_null_frame<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    write_pending_key(frame, cx)?;
    cx.out.null()?;
    Ok(Step::Leaf)
}

fn write_pending_key<S: TokenSink + ?Sized>(
    frame: &mut Frame<'_>,
    cx: &mut Context<'_, '_, S>,
) -> Result<()> {
    if let Some(key) = frame.pending_key.take() {
        cx.out.key(&key)?;
    }
    Ok(())
}

/// Writes the frame's container-open token, or a back-reference when the
/// value was already written. Returns `false` in the back-reference case.
pub(crate) fn open_container<S: TokenSink + ?Sized>(
    frame: &mut Frame<'_>,
    node: Node<'_>,
    kind: ContainerKind,
    cx: &mut Context<'_, '_, S>,
) -> Result<bool> {
    if cx.options.references.is_preserve() {
        if let Some(identity) = node.identity() {
            match cx.refs.track(identity) {
                Tracked::Seen(id) => {
                    tracing::trace!(id, "writing back-reference");
                    write_pending_key(frame, cx)?;
                    cx.out.back_reference(id)?;
                    return Ok(false);
                }
                Tracked::New(id) => {
                    tracing::trace!(id, "assigned reference id");
                    frame.reference_id = Some(id);
                }
            }
        }
    }
    write_pending_key(frame, cx)?;
    cx.out.open(kind, frame.reference_id)?;
    Ok(true)
}

fn composite_step<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    node: Node<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    let index = match frame.cursor {
        Cursor::Fresh => {
            if !open_container(frame, node, ContainerKind::Composite, cx)? {
                return Ok(Step::Closed);
            }
            frame.cursor = Cursor::Members(0);
            return Ok(Step::Opened);
        }
        Cursor::Map(MapState::NoEnumeratorYet) => {
            return mapping::step(frame, node.extension_data(), cx)
        }
        Cursor::Map(_) => return mapping::step(frame, None, cx),
        Cursor::Members(index) => index,
        Cursor::Elements(_) => {
            return Err(Error::configuration(
                "composite frame holds a collection cursor",
            ))
        }
    };

    let count = node.member_count();
    if index < count {
        frame.cursor = Cursor::Members(index + 1);
        let member = node.member(index).ok_or_else(|| {
            Error::configuration(format!(
                "composite reported {} members but has none at index {}",
                count, index
            ))
        })?;
        return match classify(member.value)? {
            Slot::Absent => {
                let skip =
                    member.skip_if_null || cx.options.null_handling == NullHandling::Skip;
                if !skip {
                    cx.out.key(&member.name)?;
                    cx.out.null()?;
                }
                Ok(Step::Emitted)
            }
            Slot::Vanished => Ok(Step::Emitted),
            Slot::Present(child, Kind::Leaf) => {
                cx.out.key(&member.name)?;
                write_scalar(child, cx.out)?;
                Ok(Step::Emitted)
            }
            Slot::Present(child, kind) => {
                Ok(Step::Push(Frame::child(child, kind, Some(member.name))))
            }
        };
    }

    match frame.extension {
        ExtensionStatus::Inactive => {
            if cx.options.extension_conflicts == ExtensionConflicts::Reject {
                let reserved: HashSet<_> = (0..count)
                    .filter_map(|i| node.member(i))
                    .map(|member| member.name)
                    .collect();
                frame.reserved_keys = Some(reserved);
            }
            frame.set_extension(ExtensionStatus::Writing);
            frame.pop_on_end = false;
            frame.cursor = Cursor::Map(MapState::NoEnumeratorYet);
            Ok(Step::Emitted)
        }
        ExtensionStatus::Finished => {
            cx.out.close(ContainerKind::Composite)?;
            Ok(Step::Closed)
        }
        ExtensionStatus::Writing => Err(Error::configuration(
            "extension data fold ended without finishing",
        )),
    }
}

fn collection_step<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    node: Node<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    if frame.is_fresh() {
        if !open_container(frame, node, ContainerKind::Collection, cx)? {
            return Ok(Step::Closed);
        }
        let elements = node
            .entries()
            .ok_or_else(|| Error::unsupported_shape("collection exposes no element cursor"))?;
        frame.cursor = Cursor::Elements(elements);
        return Ok(Step::Opened);
    }

    let next = match &mut frame.cursor {
        Cursor::Elements(elements) => elements.next(),
        _ => {
            return Err(Error::configuration(
                "collection frame lost its element cursor",
            ))
        }
    };

    let Some(entry) = next else {
        cx.out.close(ContainerKind::Collection)?;
        return Ok(Step::Closed);
    };

    match classify(entry.value)? {
        Slot::Absent | Slot::Vanished => cx.out.null()?,
        Slot::Present(child, Kind::Leaf) => write_scalar(child, cx.out)?,
        Slot::Present(child, kind) => return Ok(Step::Push(Frame::child(child, kind, None))),
    }
    Ok(Step::Emitted)
}
