//! GSUP Information Element values
//!
//! An IE value is one of three shapes: a scalar, a compound record of named
//! sub-fields, or a repeated sequence of scalars/compounds. When the builder
//! attaches a value under a name already present, the merge is decided by the
//! shape tag, never by inspecting the payload.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Scalar IE payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// Absent value, used as a placeholder for fields populated later
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Ordered record of named sub-fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    fields: Vec<(String, IeValue)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, consuming and returning the record for chaining
    pub fn with_field(mut self, name: &str, value: impl Into<IeValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: impl Into<IeValue>) {
        self.fields.push((name.to_string(), value.into()));
    }

    /// First field with the given name
    pub fn get(&self, name: &str) -> Option<&IeValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &IeValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Member of a repeated IE
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Scalar(Scalar),
    Compound(Compound),
}

impl Element {
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(c) => Some(c),
            Self::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Compound(_) => None,
        }
    }
}

/// IE value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IeValue {
    Scalar(Scalar),
    Compound(Compound),
    Repeated(Vec<Element>),
}

/// Shape tag of an [`IeValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IeShape {
    Scalar,
    Compound,
    Repeated,
}

impl fmt::Display for IeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("scalar"),
            Self::Compound => f.write_str("compound"),
            Self::Repeated => f.write_str("repeated"),
        }
    }
}

impl IeValue {
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    pub fn shape(&self) -> IeShape {
        match self {
            Self::Scalar(_) => IeShape::Scalar,
            Self::Compound(_) => IeShape::Compound,
            Self::Repeated(_) => IeShape::Repeated,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Scalar(Scalar::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Element]> {
        match self {
            Self::Repeated(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Scalar> for IeValue {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

impl From<Compound> for IeValue {
    fn from(v: Compound) -> Self {
        Self::Compound(v)
    }
}

impl From<Vec<Element>> for IeValue {
    fn from(v: Vec<Element>) -> Self {
        Self::Repeated(v)
    }
}

impl From<Element> for IeValue {
    fn from(v: Element) -> Self {
        match v {
            Element::Scalar(s) => Self::Scalar(s),
            Element::Compound(c) => Self::Compound(c),
        }
    }
}

impl From<Compound> for Element {
    fn from(v: Compound) -> Self {
        Self::Compound(v)
    }
}

impl From<Scalar> for Element {
    fn from(v: Scalar) -> Self {
        Self::Scalar(v)
    }
}

impl From<&str> for IeValue {
    fn from(v: &str) -> Self {
        Self::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<String> for IeValue {
    fn from(v: String) -> Self {
        Self::Scalar(Scalar::Str(v))
    }
}

impl From<i64> for IeValue {
    fn from(v: i64) -> Self {
        Self::Scalar(Scalar::Int(v))
    }
}

impl From<u32> for IeValue {
    fn from(v: u32) -> Self {
        Self::Scalar(Scalar::Int(v as i64))
    }
}

impl From<u8> for IeValue {
    fn from(v: u8) -> Self {
        Self::Scalar(Scalar::Int(v as i64))
    }
}

impl From<usize> for IeValue {
    fn from(v: usize) -> Self {
        Self::Scalar(Scalar::Int(v as i64))
    }
}

impl From<bool> for IeValue {
    fn from(v: bool) -> Self {
        Self::Scalar(Scalar::Bool(v))
    }
}

impl<T: Into<IeValue>> From<Option<T>> for IeValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_else(IeValue::null)
    }
}

// ==================== Dict form ====================

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Str(v) => serializer.serialize_str(v),
        }
    }
}

impl Serialize for Compound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            Self::Compound(c) => c.serialize(serializer),
        }
    }
}

impl Serialize for IeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(s) => s.serialize(serializer),
            Self::Compound(c) => c.serialize(serializer),
            Self::Repeated(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct IeValueVisitor;

impl<'de> Visitor<'de> for IeValueVisitor {
    type Value = IeValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a GSUP IE value (null, bool, integer, string, object or array)")
    }

    fn visit_unit<E: de::Error>(self) -> Result<IeValue, E> {
        Ok(IeValue::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<IeValue, E> {
        Ok(IeValue::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<IeValue, D::Error> {
        IeValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<IeValue, E> {
        Ok(IeValue::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<IeValue, E> {
        Ok(IeValue::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<IeValue, E> {
        i64::try_from(v)
            .map(IeValue::from)
            .map_err(|_| E::custom(format!("integer {} out of range", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<IeValue, E> {
        Ok(IeValue::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<IeValue, E> {
        Ok(IeValue::from(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<IeValue, A::Error> {
        let mut record = Compound::new();
        while let Some((name, value)) = access.next_entry::<String, IeValue>()? {
            record.fields.push((name, value));
        }
        Ok(IeValue::Compound(record))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<IeValue, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(value) = access.next_element::<IeValue>()? {
            let item = match value {
                IeValue::Scalar(s) => Element::Scalar(s),
                IeValue::Compound(c) => Element::Compound(c),
                IeValue::Repeated(_) => {
                    return Err(de::Error::custom("repeated IE values cannot be nested"));
                }
            };
            items.push(item);
        }
        Ok(IeValue::Repeated(items))
    }
}

impl<'de> Deserialize<'de> for IeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IeValueVisitor)
    }
}
