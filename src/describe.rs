//! The type descriptor interface.
//!
//! The engine never inspects a value directly. Each node of the caller's graph
//! implements [`Describe`], which reports the node's shape and hands out its
//! children on demand. Children are borrowed from the graph for the lifetime of
//! the session; the engine never copies or mutates them.
//!
//! ## Shapes
//!
//! | [`Kind`]       | Children                                               |
//! |----------------|--------------------------------------------------------|
//! | `Leaf`         | none; the payload comes from [`Describe::scalar`]      |
//! | `Composite`    | indexed [`Member`]s plus optional extension data       |
//! | `Collection`   | a lazy [`Entries`] cursor of unkeyed entries           |
//! | `Mapping`      | a lazy [`Entries`] cursor of keyed entries             |
//! | `Unresolved`   | the concrete node returned by [`Describe::resolve`]    |
//!
//! An absent value (null, empty optional) is a `None` slot, not a node.
//!
//! ## Example
//!
//! ```rust
//! use std::borrow::Cow;
//! use serde_walk::{to_string, Describe, Kind, Member, Scalar};
//!
//! struct Point { x: i64, y: i64 }
//!
//! impl Describe for Point {
//!     fn kind(&self) -> Kind { Kind::Composite }
//!     fn member_count(&self) -> usize { 2 }
//!     fn member(&self, index: usize) -> Option<Member<'_>> {
//!         match index {
//!             0 => Some(Member::new("x", Some(&self.x))),
//!             1 => Some(Member::new("y", Some(&self.y))),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), r#"{"x":1,"y":2}"#);
//! ```

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::any::TypeId;
use std::borrow::Cow;

/// A borrowed node of the value graph.
pub type Node<'g> = &'g dyn Describe;

/// A lazy, single-pass cursor over the entries of a collection or mapping.
pub type Entries<'g> = Box<dyn Iterator<Item = Entry<'g>> + 'g>;

/// Shape classification of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Leaf,
    Composite,
    Collection,
    Mapping,
    /// The concrete shape is only known once the node is resolved.
    Unresolved,
}

impl Kind {
    #[inline]
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Kind::Composite | Kind::Collection | Kind::Mapping)
    }
}

/// The payload of a leaf node.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar<'g> {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(Cow<'g, str>),
    DateTime(DateTime<Utc>),
    BigInt(Cow<'g, BigInt>),
}

/// One declared member of a composite.
#[derive(Clone)]
pub struct Member<'g> {
    pub name: Cow<'g, str>,
    pub value: Option<Node<'g>>,
    /// Omit this member when its value is absent, whatever the session's null handling.
    pub skip_if_null: bool,
}

impl<'g> Member<'g> {
    pub fn new(name: impl Into<Cow<'g, str>>, value: Option<Node<'g>>) -> Self {
        Member {
            name: name.into(),
            value,
            skip_if_null: false,
        }
    }

    #[must_use]
    pub fn skip_if_null(mut self) -> Self {
        self.skip_if_null = true;
        self
    }
}

/// One entry yielded by an [`Entries`] cursor.
///
/// Mapping entries must carry a key; collection entries ignore it.
#[derive(Clone)]
pub struct Entry<'g> {
    pub key: Option<Cow<'g, str>>,
    pub value: Option<Node<'g>>,
}

impl<'g> Entry<'g> {
    pub fn keyed(key: impl Into<Cow<'g, str>>, value: Option<Node<'g>>) -> Self {
        Entry {
            key: Some(key.into()),
            value,
        }
    }

    pub fn element(value: Option<Node<'g>>) -> Self {
        Entry { key: None, value }
    }
}

/// Identity of a node for reference tracking.
///
/// Two nodes are the same reference when they live at the same address and
/// have the same type. The type half keeps a composite and its first inline
/// field apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    addr: usize,
    ty: TypeId,
}

impl Identity {
    pub fn of<T: ?Sized + 'static>(value: &T) -> Self {
        Identity {
            addr: (value as *const T).cast::<()>() as usize,
            ty: TypeId::of::<T>(),
        }
    }
}

/// Describes one node of a value graph to the engine.
///
/// Only [`Describe::kind`] is required; the remaining methods default to
/// "nothing here" and are consulted according to the reported kind.
pub trait Describe {
    fn kind(&self) -> Kind;

    /// Payload of a `Leaf`.
    fn scalar(&self) -> Option<Scalar<'_>> {
        None
    }

    /// Number of declared members of a `Composite`.
    fn member_count(&self) -> usize {
        0
    }

    /// Declared member at `index`, in declaration order.
    fn member(&self, _index: usize) -> Option<Member<'_>> {
        None
    }

    /// Overflow mapping folded into a `Composite`'s own container.
    ///
    /// Keys must not repeat declared member names.
    fn extension_data(&self) -> Option<Node<'_>> {
        None
    }

    /// Entry cursor of a `Collection` or `Mapping`.
    fn entries(&self) -> Option<Entries<'_>> {
        None
    }

    /// Concrete node behind an `Unresolved` one. `None` means the slot is absent.
    fn resolve(&self) -> Option<Node<'_>> {
        None
    }

    /// Identity for reference tracking; `None` opts out.
    fn identity(&self) -> Option<Identity> {
        None
    }
}

macro_rules! describe_scalar {
    ($($ty:ty => |$v:ident| $scalar:expr),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn kind(&self) -> Kind {
                    Kind::Leaf
                }

                fn scalar(&self) -> Option<Scalar<'_>> {
                    let $v = self;
                    Some($scalar)
                }
            }
        )*
    };
}

describe_scalar! {
    bool => |v| Scalar::Bool(*v),
    i8 => |v| Scalar::I64(*v as i64),
    i16 => |v| Scalar::I64(*v as i64),
    i32 => |v| Scalar::I64(*v as i64),
    i64 => |v| Scalar::I64(*v),
    u8 => |v| Scalar::U64(*v as u64),
    u16 => |v| Scalar::U64(*v as u64),
    u32 => |v| Scalar::U64(*v as u64),
    u64 => |v| Scalar::U64(*v),
    f32 => |v| Scalar::F64(*v as f64),
    f64 => |v| Scalar::F64(*v),
    str => |v| Scalar::Str(Cow::Borrowed(v)),
    String => |v| Scalar::Str(Cow::Borrowed(v.as_str())),
    DateTime<Utc> => |v| Scalar::DateTime(*v),
    BigInt => |v| Scalar::BigInt(Cow::Borrowed(v)),
}
