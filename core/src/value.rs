use std::{cmp::Ordering, collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

/// A raw item as the store represents it: attribute name to attribute value.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A dynamically typed attribute value in the store's representation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Binary(Vec<u8>),
    Null,
    List(Vec<AttributeValue>),
    Map(BTreeMap<String, AttributeValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Binary,
    Null,
    List,
    Map,
}

impl ValueType {
    pub fn of(v: &AttributeValue) -> Self {
        match v {
            AttributeValue::String(_) => ValueType::String,
            AttributeValue::Integer(_) | AttributeValue::Float(_) => ValueType::Number,
            AttributeValue::Boolean(_) => ValueType::Boolean,
            AttributeValue::Binary(_) => ValueType::Binary,
            AttributeValue::Null => ValueType::Null,
            AttributeValue::List(_) => ValueType::List,
            AttributeValue::Map(_) => ValueType::Map,
        }
    }
}

impl AttributeValue {
    pub fn value_type(&self) -> ValueType { ValueType::of(self) }

    /// Orders two values of the same scalar type. Integers and floats compare numerically with each other.
    /// Returns None for mismatched types, NaN, and non-scalar values, none of which can serve as key operands.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::String(a), AttributeValue::String(b)) => Some(a.cmp(b)),
            (AttributeValue::Integer(a), AttributeValue::Integer(b)) => Some(a.cmp(b)),
            (AttributeValue::Integer(a), AttributeValue::Float(b)) => (*a as f64).partial_cmp(b),
            (AttributeValue::Float(a), AttributeValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (AttributeValue::Float(a), AttributeValue::Float(b)) => a.partial_cmp(b),
            (AttributeValue::Binary(a), AttributeValue::Binary(b)) => Some(a.cmp(b)),
            (AttributeValue::Boolean(a), AttributeValue::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Prefix test used by begins-with conditions. Only strings and binaries have prefixes.
    pub fn begins_with(&self, prefix: &str) -> bool {
        match self {
            AttributeValue::String(s) => s.starts_with(prefix),
            AttributeValue::Binary(b) => b.starts_with(prefix.as_bytes()),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
            AttributeValue::Integer(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
            AttributeValue::Boolean(b) => serde_json::Value::Bool(*b),
            AttributeValue::Binary(bytes) => serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect()),
            AttributeValue::Null => serde_json::Value::Null,
            AttributeValue::List(items) => serde_json::Value::Array(items.iter().map(AttributeValue::to_json).collect()),
            AttributeValue::Map(map) => serde_json::Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => AttributeValue::Null,
            serde_json::Value::Bool(b) => AttributeValue::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttributeValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    AttributeValue::Float(f)
                } else {
                    AttributeValue::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => AttributeValue::String(s.clone()),
            serde_json::Value::Array(items) => AttributeValue::List(items.iter().map(AttributeValue::from_json).collect()),
            serde_json::Value::Object(map) => AttributeValue::Map(map.iter().map(|(k, v)| (k.clone(), AttributeValue::from_json(v))).collect()),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::String(string) => write!(f, "{:?}", string),
            AttributeValue::Integer(int) => write!(f, "{}", int),
            AttributeValue::Float(float) => write!(f, "{:?}", float),
            AttributeValue::Boolean(bool) => write!(f, "{}", bool),
            AttributeValue::Binary(binary) => write!(f, "{:?}", binary),
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::List(_) | AttributeValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self { AttributeValue::String(s.to_string()) }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self { AttributeValue::String(s) }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self { AttributeValue::Integer(i) }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self { AttributeValue::Integer(i as i64) }
}

impl From<u32> for AttributeValue {
    fn from(i: u32) -> Self { AttributeValue::Integer(i as i64) }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self { AttributeValue::Float(f) }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self { AttributeValue::Boolean(b) }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self { AttributeValue::Binary(b) }
}
