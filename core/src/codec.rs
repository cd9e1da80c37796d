use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::CodecError,
    value::{AttributeMap, AttributeValue},
};

/// Converts between raw store items and caller-typed records.
pub trait ItemCodec<T>: Send + Sync {
    fn decode(&self, item: AttributeMap) -> Result<T, CodecError>;
    fn encode(&self, record: &T) -> Result<AttributeMap, CodecError>;
}

/// Codec for any serde record, going through `serde_json::Value`. Records must serialize to JSON objects.
pub struct SerdeCodec<T>(PhantomData<fn() -> T>);

impl<T> SerdeCodec<T> {
    pub fn new() -> Self { Self(PhantomData) }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Clone for SerdeCodec<T> {
    fn clone(&self) -> Self { Self::new() }
}

impl<T: Serialize + DeserializeOwned> ItemCodec<T> for SerdeCodec<T> {
    fn decode(&self, item: AttributeMap) -> Result<T, CodecError> { from_item(item) }
    fn encode(&self, record: &T) -> Result<AttributeMap, CodecError> { to_item(record) }
}

/// Encode any serializable value that serializes to a JSON object, such as a primary key struct.
pub fn to_item<T: Serialize + ?Sized>(record: &T) -> Result<AttributeMap, CodecError> {
    let json = serde_json::to_value(record).map_err(|e| CodecError::Serialize(e.to_string()))?;
    match AttributeValue::from_json(&json) {
        AttributeValue::Map(map) => Ok(map),
        other => Err(CodecError::UnsupportedValue(format!("record must encode to a map, got {:?}", other.value_type()))),
    }
}

pub fn from_item<T: DeserializeOwned>(item: AttributeMap) -> Result<T, CodecError> {
    let json = AttributeValue::Map(item).to_json();
    Ok(serde_json::from_value(json)?)
}

/// Passes raw attribute maps through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl ItemCodec<AttributeMap> for RawCodec {
    fn decode(&self, item: AttributeMap) -> Result<AttributeMap, CodecError> { Ok(item) }
    fn encode(&self, record: &AttributeMap) -> Result<AttributeMap, CodecError> { Ok(record.clone()) }
}
