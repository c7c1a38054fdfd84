//! A dynamic value graph.
//!
//! [`Value`] is a ready-made [`Describe`] implementation: build a graph out of
//! it (by hand, with the [`value!`](crate::value) macro, or with
//! [`to_value`](crate::to_value) from any `Serialize` type) and hand it to the
//! engine.
//!
//! ## Shapes
//!
//! | Variant                         | Describes as  |
//! |---------------------------------|---------------|
//! | `Null`                          | an absent slot (or a `null` leaf at the root) |
//! | `Bool`, `Number`, `String`, `Date`, `BigInt` | `Leaf` |
//! | `Array`                         | `Collection`  |
//! | `Object`                        | `Mapping`     |
//! | `Record`                        | `Composite`, with optional extension data |
//! | `Shared`                        | `Unresolved`, resolving to the shared value |
//!
//! `Shared` is how a `Value` graph shares a node: clones of one `Arc` resolve
//! to the same address, so with reference preservation enabled the second and
//! later occurrences are written as back-references.
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_walk::{to_string_with_options, Value, WriteOptions, WriterOptions};
//!
//! let shared = Arc::new(Value::from(vec![Value::from(1)]));
//! let graph = Value::from(vec![Value::Shared(shared.clone()), Value::Shared(shared)]);
//!
//! let json = to_string_with_options(
//!     &graph,
//!     WriteOptions::preserve_references(),
//!     Default::default(),
//! )
//! .unwrap();
//! assert_eq!(json, r#"{"$id":"1","$values":[{"$id":"2","$values":[1]},{"$ref":"2"}]}"#);
//! ```

use crate::describe::{Describe, Entries, Entry, Identity, Kind, Member, Node, Scalar};
use crate::{Record, ValueMap};
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// RFC 3339 rendering shared by the JSON writer and `Serialize`.
pub(crate) fn format_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// A dynamically-typed node of a value graph.
///
/// # Examples
///
/// ```rust
/// use serde_walk::{Value, Number};
///
/// let null = Value::Null;
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(ValueMap),
    Record(Record),
    Shared(Arc<Value>),
    Date(DateTime<Utc>),
    BigInt(BigInt),
}

/// A numeric value.
///
/// `Unsigned` only holds values above `i64::MAX`; everything else that fits is
/// an `Integer`.
///
/// # Examples
///
/// ```rust
/// use serde_walk::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// assert_eq!(Number::from(u64::MAX), Number::Unsigned(u64::MAX));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_) | Number::Unsigned(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Floats convert when they have no fractional part and fit the range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_walk::Number;
    ///
    /// assert_eq!(Number::Integer(42).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Unsigned(u64::MAX).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Unsigned(u) => i64::try_from(*u).ok(),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Unsigned(u) => *u as f64,
            Number::Float(f) => *f,
        }
    }

    fn scalar(&self) -> Scalar<'static> {
        match self {
            Number::Integer(i) => Scalar::I64(*i),
            Number::Unsigned(u) => Scalar::U64(*u),
            Number::Float(f) => Scalar::F64(*f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Unsigned(u) => write!(f, "{}", u),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty => |$v:ident| $number:expr),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from($v: $ty) -> Self {
                    $number
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from! {
    i8 => |v| Number::Integer(v as i64),
    i16 => |v| Number::Integer(v as i64),
    i32 => |v| Number::Integer(v as i64),
    i64 => |v| Number::Integer(v),
    u8 => |v| Number::Integer(v as i64),
    u16 => |v| Number::Integer(v as i64),
    u32 => |v| Number::Integer(v as i64),
    u64 => |v| match i64::try_from(v) {
        Ok(i) => Number::Integer(i),
        Err(_) => Number::Unsigned(v),
    },
    f32 => |v| Number::Float(v as f64),
    f64 => |v| Number::Float(v),
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Value::Record(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_shared(&self) -> bool {
        matches!(self, Value::Shared(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_walk::Value;
    ///
    /// assert_eq!(Value::from("hello").as_str(), Some("hello"));
    /// assert_eq!(Value::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Follows `Shared` links to the value they point at.
    #[must_use]
    pub fn shared_target(&self) -> &Value {
        let mut current = self;
        while let Value::Shared(inner) = current {
            current = inner;
        }
        current
    }
}

/// Maps a child slot holding `Null` to an absent slot.
pub(crate) fn present(value: &Value) -> Option<Node<'_>> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

impl Describe for Value {
    fn kind(&self) -> Kind {
        match self {
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Date(_)
            | Value::BigInt(_) => Kind::Leaf,
            Value::Array(_) => Kind::Collection,
            Value::Object(_) => Kind::Mapping,
            Value::Record(_) => Kind::Composite,
            Value::Shared(_) => Kind::Unresolved,
        }
    }

    fn scalar(&self) -> Option<Scalar<'_>> {
        match self {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(n.scalar()),
            Value::String(s) => Some(Scalar::Str(Cow::Borrowed(s))),
            Value::Date(dt) => Some(Scalar::DateTime(*dt)),
            Value::BigInt(bi) => Some(Scalar::BigInt(Cow::Borrowed(bi))),
            _ => None,
        }
    }

    fn member_count(&self) -> usize {
        match self {
            Value::Record(record) => record.len(),
            _ => 0,
        }
    }

    fn member(&self, index: usize) -> Option<Member<'_>> {
        let field = self.as_record()?.fields().get(index)?;
        let member = Member::new(field.name.as_str(), present(&field.value));
        Some(if field.skip_if_null {
            member.skip_if_null()
        } else {
            member
        })
    }

    fn extension_data(&self) -> Option<Node<'_>> {
        self.as_record()?
            .extension()
            .map(|extension| extension as &dyn Describe)
    }

    fn entries(&self) -> Option<Entries<'_>> {
        match self {
            Value::Array(arr) => Some(Box::new(
                arr.iter().map(|value| Entry::element(present(value))),
            )),
            Value::Object(obj) => obj.entries(),
            _ => None,
        }
    }

    fn resolve(&self) -> Option<Node<'_>> {
        match self {
            Value::Shared(_) => present(self.shared_target()),
            _ => Some(self),
        }
    }

    fn identity(&self) -> Option<Identity> {
        match self {
            Value::Array(_) | Value::Object(_) | Value::Record(_) => Some(Identity::of(self)),
            _ => None,
        }
    }
}

impl From<Scalar<'_>> for Value {
    fn from(scalar: Scalar<'_>) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::I64(i) => Value::from(i),
            Scalar::U64(u) => Value::from(u),
            Scalar::F64(f) => Value::from(f),
            Scalar::Str(s) => Value::String(s.into_owned()),
            Scalar::DateTime(dt) => Value::Date(dt),
            Scalar::BigInt(bi) => Value::BigInt(bi.into_owned()),
        }
    }
}

/// Renders the value as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = crate::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Unsigned(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Record(record) => {
                let mut map = serializer.serialize_map(None)?;
                for field in record.fields() {
                    if field.skip_if_null && field.value.is_null() {
                        continue;
                    }
                    map.serialize_entry(&field.name, &field.value)?;
                }
                if let Some(extension) = record.extension() {
                    for (k, v) in extension.iter() {
                        map.serialize_entry(k, v)?;
                    }
                }
                map.end()
            }
            Value::Shared(inner) => inner.serialize(serializer),
            Value::Date(dt) => serializer.serialize_str(&format_date(dt)),
            Value::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::from(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ValueMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match &value {
            Value::Number(n) => n.as_i64().ok_or_else(|| {
                crate::Error::custom(format!("cannot convert {} to i64", n))
            }),
            _ => Err(crate::Error::custom(format!(
                "expected integer, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(crate::Error::custom(format!(
                "expected number, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Object(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Arc<Value>> for Value {
    fn from(value: Arc<Value>) -> Self {
        Value::Shared(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}
