//! Mapping traversal.
//!
//! A hand-written state machine over [`MapState`]:
//!
//! - `NoEnumeratorYet`: write the container-open token (or a back-reference,
//!   or `null` for an absent mapping) and obtain the entry cursor.
//! - `Enumerating`: advance the cursor by one entry. Leaf values are written
//!   with their key in one go; container values get a child frame carrying the
//!   transformed key.
//! - `Done`: write the container-close token.
//!
//! The same machine folds a composite's extension data into the composite's
//! own container. While folding no open, close or null token is written, the
//! key policy is not applied, and `Done` marks the extension `Finished`
//! instead of closing anything.
//!
//! Entries are written in the mapping's own iteration order. Nothing is
//! sorted and nothing is deduplicated.

use crate::describe::{Entry, Kind, Node};
use crate::dispatch::{self, classify, write_scalar, Context, Slot, Step};
use crate::frame::{Cursor, ExtensionStatus, Frame, MapState};
use crate::sink::{ContainerKind, TokenSink};
use crate::{Error, KeyPolicy, Result, WriteOptions};
use std::borrow::Cow;

pub(crate) fn step<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    source: Option<Node<'g>>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    match frame.cursor {
        Cursor::Fresh | Cursor::Map(MapState::NoEnumeratorYet) => return begin(frame, source, cx),
        Cursor::Map(MapState::Done) => return done(frame, cx),
        _ => {}
    }

    let next = match &mut frame.cursor {
        Cursor::Map(MapState::Enumerating(entries)) => entries.next(),
        _ => {
            return Err(Error::configuration(
                "mapping frame lost its entry cursor",
            ))
        }
    };

    match next {
        Some(entry) => write_entry(frame, entry, cx),
        None => {
            frame.cursor = Cursor::Map(MapState::Done);
            done(frame, cx)
        }
    }
}

fn begin<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    source: Option<Node<'g>>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    let Some(mapping) = source else {
        // a folded mapping has no container of its own to null out
        if frame.is_folding() {
            frame.set_extension(ExtensionStatus::Finished);
        } else {
            if let Some(key) = frame.pending_key.take() {
                cx.out.key(&key)?;
            }
            cx.out.null()?;
        }
        return Ok(finish(frame));
    };

    let folding = frame.is_folding();
    if !folding && !dispatch::open_container(frame, mapping, ContainerKind::Mapping, cx)? {
        return Ok(finish(frame));
    }

    let entries = mapping
        .entries()
        .ok_or_else(|| Error::unsupported_shape("mapping exposes no entry cursor"))?;
    frame.cursor = Cursor::Map(MapState::Enumerating(entries));
    Ok(if folding { Step::Emitted } else { Step::Opened })
}

fn write_entry<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    entry: Entry<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    let key = entry
        .key
        .ok_or_else(|| Error::unsupported_shape("mapping entry has no string key"))?;

    let slot = classify(entry.value)?;
    if let Slot::Vanished = slot {
        return Ok(Step::Emitted);
    }

    let key = if frame.is_folding() {
        if let Some(reserved) = &frame.reserved_keys {
            if reserved.contains(&key) {
                return Err(Error::DuplicateKey(key.into_owned()));
            }
        }
        key
    } else {
        transform_key(key, cx.options)?
    };

    match slot {
        Slot::Present(child, Kind::Leaf) => {
            cx.out.key(&key)?;
            write_scalar(child, cx.out)?;
            Ok(Step::Emitted)
        }
        Slot::Present(child, kind) => Ok(Step::Push(Frame::child(child, kind, Some(key)))),
        Slot::Absent | Slot::Vanished => {
            cx.out.key(&key)?;
            cx.out.null()?;
            Ok(Step::Emitted)
        }
    }
}

fn done<'g, S: TokenSink + ?Sized>(
    frame: &mut Frame<'g>,
    cx: &mut Context<'_, '_, S>,
) -> Result<Step<'g>> {
    if frame.is_folding() {
        frame.set_extension(ExtensionStatus::Finished);
    } else {
        cx.out.close(ContainerKind::Mapping)?;
    }
    Ok(finish(frame))
}

/// Pops a mapping frame, or hands a folding composite back its own cursor.
fn finish<'g>(frame: &mut Frame<'g>) -> Step<'g> {
    if frame.pop_on_end {
        return Step::Closed;
    }
    let member_count = frame.value.map_or(0, |node| node.member_count());
    frame.end_mapping(member_count);
    Step::Emitted
}

fn transform_key<'g>(key: Cow<'g, str>, options: &WriteOptions) -> Result<Cow<'g, str>> {
    if let KeyPolicy::Identity = options.key_policy {
        return Ok(key);
    }
    let converted = options.key_policy.apply(&key);
    if converted.is_empty() {
        return Err(Error::configuration(format!(
            "key policy produced an empty key for '{}'",
            key
        )));
    }
    Ok(Cow::Owned(converted))
}
