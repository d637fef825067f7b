//! # Value Type System
//!
//! Values pulled out of the document store, and the flat tuples they are
//! normalized into before being rendered as facts.
//!
//! ## Design Decisions
//!
//! - **Tagged union**: a stored value is a [`RawValue`], one of a primitive,
//!   an ordered sequence or an ordered mapping. Nothing else can be
//!   represented, so unsupported leaves are rejected once, at the boundary
//!   where external data is converted ([`RawValue::try_from`]).
//! - **Ordered mappings**: mapping entries keep insertion order so that
//!   normalization enumerates tuples reproducibly.
//! - **Dynamic arity**: a [`Tuple`] has as many columns as the nesting of the
//!   raw value produced; the schema decides whether that arity is acceptable.
//!
//! ## Usage
//!
//! ```rust
//! use quest::value::{normalize, Primitive, RawValue};
//!
//! let raw = RawValue::from(vec![Primitive::from("x"), Primitive::from(1)]);
//! let tuples = normalize(&raw);
//! assert_eq!(tuples.len(), 2);
//! assert_eq!(tuples[0].arity(), 1);
//! ```

pub mod normalize;

pub use normalize::normalize;

use std::fmt;

use serde_json::Value as JsonValue;

/// Errors raised while converting external data into [`RawValue`]s
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// A leaf is not a string, integer, float or boolean
    #[error("raw value '{value}' contains unrecognized type {kind}")]
    UnsupportedType { value: String, kind: &'static str },
}

/// A primitive column value
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Primitive {
    /// Name of the primitive kind, as used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Str(_) => "string",
            Primitive::Int(_) => "int",
            Primitive::Float(_) => "float",
            Primitive::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Str(s) => write!(f, "{s}"),
            Primitive::Int(v) => write!(f, "{v}"),
            // Keep a decimal point so the evaluator reads the literal as a float
            Primitive::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Primitive::Float(v) => write!(f, "{v}"),
            Primitive::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::Str(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::Str(s)
    }
}

impl From<i64> for Primitive {
    fn from(v: i64) -> Self {
        Primitive::Int(v)
    }
}

impl From<i32> for Primitive {
    fn from(v: i32) -> Self {
        Primitive::Int(i64::from(v))
    }
}

impl From<f64> for Primitive {
    fn from(v: f64) -> Self {
        Primitive::Float(v)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Bool(b)
    }
}

/// A semi-structured value as retrieved from the store
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Primitive(Primitive),
    Sequence(Vec<RawValue>),
    /// Ordered key/value entries. Keys are primitives, values arbitrarily nested.
    Mapping(Vec<(Primitive, RawValue)>),
}

impl RawValue {
    /// Build a mapping from `(key, value)` pairs, keeping their order
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<Primitive>,
        V: Into<RawValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawValue::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence from anything convertible into raw values
    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<RawValue>,
        I: IntoIterator<Item = V>,
    {
        RawValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            RawValue::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, RawValue::Primitive(_))
    }

    /// True for a sequence whose elements are all primitives (including the empty sequence)
    pub fn is_primitive_sequence(&self) -> bool {
        match self {
            RawValue::Sequence(items) => items.iter().all(RawValue::is_primitive),
            _ => false,
        }
    }
}

impl From<Primitive> for RawValue {
    fn from(p: Primitive) -> Self {
        RawValue::Primitive(p)
    }
}

macro_rules! raw_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawValue {
                fn from(v: $t) -> Self {
                    RawValue::Primitive(Primitive::from(v))
                }
            }
        )*
    };
}

raw_from_primitive!(&str, String, i64, i32, f64, bool);

impl From<Vec<Primitive>> for RawValue {
    fn from(items: Vec<Primitive>) -> Self {
        RawValue::Sequence(items.into_iter().map(RawValue::Primitive).collect())
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        RawValue::Sequence(items)
    }
}

impl TryFrom<JsonValue> for RawValue {
    type Error = ValueError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(s) => Ok(RawValue::Primitive(Primitive::Str(s))),
            JsonValue::Bool(b) => Ok(RawValue::Primitive(Primitive::Bool(b))),
            JsonValue::Number(n) => {
                if let Some(v) = n.as_i64() {
                    return Ok(RawValue::Primitive(Primitive::Int(v)));
                }
                // Integers past i64::MAX would lose precision as floats
                let kind = if n.is_u64() { "u64" } else { "number" };
                n.as_f64()
                    .filter(|_| n.is_f64())
                    .map(|v| RawValue::Primitive(Primitive::Float(v)))
                    .ok_or_else(|| ValueError::UnsupportedType {
                        value: n.to_string(),
                        kind,
                    })
            }
            JsonValue::Array(items) => items
                .into_iter()
                .map(RawValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(RawValue::Sequence),
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(k, v)| Ok((Primitive::Str(k), RawValue::try_from(v)?)))
                .collect::<Result<Vec<_>, ValueError>>()
                .map(RawValue::Mapping),
            JsonValue::Null => Err(ValueError::UnsupportedType {
                value: "null".to_string(),
                kind: "null",
            }),
        }
    }
}

impl From<&Primitive> for JsonValue {
    fn from(p: &Primitive) -> Self {
        match p {
            Primitive::Str(s) => JsonValue::String(s.clone()),
            Primitive::Int(v) => JsonValue::from(*v),
            Primitive::Float(v) => JsonValue::from(*v),
            Primitive::Bool(b) => JsonValue::Bool(*b),
        }
    }
}

impl From<&RawValue> for JsonValue {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Primitive(p) => JsonValue::from(p),
            RawValue::Sequence(items) => JsonValue::Array(items.iter().map(Into::into).collect()),
            // JSON object keys are always strings
            RawValue::Mapping(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", JsonValue::from(self))
    }
}

/// One relational row produced by normalization
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tuple {
    values: Vec<Primitive>,
}

impl Tuple {
    /// Create a new tuple from a vector of values
    pub fn new(values: Vec<Primitive>) -> Self {
        Tuple { values }
    }

    /// Get the number of columns in this tuple
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&Primitive> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Primitive] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Primitive> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Primitive> {
        self.values
    }

    /// Concatenate two tuples, `self` supplying the leading columns
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.arity() + other.arity());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Tuple { values }
    }
}

impl From<Vec<Primitive>> for Tuple {
    fn from(values: Vec<Primitive>) -> Self {
        Tuple::new(values)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
