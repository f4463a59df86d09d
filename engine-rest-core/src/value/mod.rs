//! Typed variable values and their wire representation.
//!
//! [`TypedValue`] is the engine-side closed union; [`VariableValueDto`] is the
//! `{value, type, valueInfo}` JSON shape. [`ValueCodec`] converts between them.

mod codec;
mod format;

pub use codec::{
    binary_payload, format_date, parse_date, BinaryAccessError, EncodeOptions, ValueCodec,
    ValueError,
};
pub use format::{DataFormatRegistry, JAVA_SERIALIZED_FORMAT, JSON_FORMAT};

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VALUE_INFO_OBJECT_TYPE_NAME: &str = "objectTypeName";
pub const VALUE_INFO_SERIALIZATION_DATA_FORMAT: &str = "serializationDataFormat";

// ─── Engine-side representation ───────────────────────────────

/// A custom object stored in its serialized form. The facade never
/// reconstructs the object itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectValue {
    /// `None` when the payload was not fetched or the variable is a typed null.
    pub serialized_data: Option<Vec<u8>>,
    pub serialization_data_format: Option<String>,
    pub object_type_name: Option<String>,
    /// Engine-reported serializer configuration, echoed as
    /// `serializedValue.configuration`.
    pub configuration: BTreeMap<String, serde_json::Value>,
}

impl ObjectValue {
    /// True for objects held by the engine's native serializer; these are
    /// reported with a descriptor instead of their payload.
    pub fn is_native_serializable(&self) -> bool {
        self.serialization_data_format.as_deref() == Some(JAVA_SERIALIZED_FORMAT)
    }
}

/// A variable's value together with its declared type. `None` payloads are
/// typed nulls: the declared type survives even without a value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Untyped null; the engine picks the storage type.
    Null,
    String(Option<String>),
    Boolean(Option<bool>),
    Short(Option<i16>),
    Integer(Option<i32>),
    Long(Option<i64>),
    Double(Option<f64>),
    Date(Option<NaiveDateTime>),
    Bytes(Option<Vec<u8>>),
    Object(ObjectValue),
}

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::Null => ValueType::Null,
            TypedValue::String(_) => ValueType::String,
            TypedValue::Boolean(_) => ValueType::Boolean,
            TypedValue::Short(_) => ValueType::Short,
            TypedValue::Integer(_) => ValueType::Integer,
            TypedValue::Long(_) => ValueType::Long,
            TypedValue::Double(_) => ValueType::Double,
            TypedValue::Date(_) => ValueType::Date,
            TypedValue::Bytes(_) => ValueType::Bytes,
            TypedValue::Object(o) if o.is_native_serializable() => ValueType::Serializable,
            TypedValue::Object(_) => ValueType::Object,
        }
    }

    /// True when the variable carries no payload (typed or untyped null).
    pub fn is_null(&self) -> bool {
        match self {
            TypedValue::Null => true,
            TypedValue::String(v) => v.is_none(),
            TypedValue::Boolean(v) => v.is_none(),
            TypedValue::Short(v) => v.is_none(),
            TypedValue::Integer(v) => v.is_none(),
            TypedValue::Long(v) => v.is_none(),
            TypedValue::Double(v) => v.is_none(),
            TypedValue::Date(v) => v.is_none(),
            TypedValue::Bytes(v) => v.is_none(),
            TypedValue::Object(o) => o.serialized_data.is_none(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::String(Some(value.into()))
    }

    pub fn integer(value: i32) -> Self {
        TypedValue::Integer(Some(value))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        TypedValue::Bytes(Some(value.into()))
    }

    /// Dates hold whole seconds, the precision of their wire form.
    pub fn date(value: NaiveDateTime) -> Self {
        TypedValue::Date(Some(value.with_nanosecond(0).unwrap_or(value)))
    }

    /// The value as a wire round trip returns it. Only dates change: their
    /// sub-second part is dropped.
    pub fn normalized(self) -> Self {
        match self {
            TypedValue::Date(Some(date)) => TypedValue::date(date),
            other => other,
        }
    }
}

// ─── Type tags ────────────────────────────────────────────────

/// The closed set of type tags understood on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    String,
    Boolean,
    Short,
    Integer,
    Long,
    Double,
    Date,
    Bytes,
    Object,
    /// Object held by the engine's native serializer.
    Serializable,
}

impl ValueType {
    /// Tag emitted when encoding.
    pub fn tag(&self) -> &'static str {
        match self {
            ValueType::Null => "Null",
            ValueType::String => "String",
            ValueType::Boolean => "Boolean",
            ValueType::Short => "Short",
            ValueType::Integer => "Integer",
            ValueType::Long => "Long",
            ValueType::Double => "Double",
            ValueType::Date => "Date",
            ValueType::Bytes => "byte[]",
            ValueType::Object => "Object",
            ValueType::Serializable => "Serializable",
        }
    }

    /// Resolve a wire tag. Matching ignores ASCII case; `Bytes` and `byte[]`
    /// both name the binary type.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.to_ascii_lowercase();
        let ty = match lower.as_str() {
            "null" => ValueType::Null,
            "string" => ValueType::String,
            "boolean" => ValueType::Boolean,
            "short" => ValueType::Short,
            "integer" => ValueType::Integer,
            "long" => ValueType::Long,
            "double" => ValueType::Double,
            "date" => ValueType::Date,
            "bytes" | "byte[]" => ValueType::Bytes,
            "object" => ValueType::Object,
            "serializable" => ValueType::Serializable,
            _ => return None,
        };
        Some(ty)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

// ─── Wire representation ──────────────────────────────────────

/// `{"value": .., "type": "..", "valueInfo": {..}}`. Maps are ordered so
/// encoding is byte-for-byte stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValueDto {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_info: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_value: Option<SerializedValueDto>,
}

impl VariableValueDto {
    pub fn typed(value: serde_json::Value, type_name: impl Into<String>) -> Self {
        Self {
            value,
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    pub fn untyped(value: serde_json::Value) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn with_value_info(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.value_info.insert(key.to_string(), value.into());
        self
    }
}

/// Raw serialized payload of a custom object plus serializer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedValueDto {
    pub value: serde_json::Value,
    #[serde(default)]
    pub configuration: BTreeMap<String, serde_json::Value>,
}

/// Wrapper emitted for natively serialized objects in place of the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationDescriptor {
    pub object_type_name: Option<String>,
    pub serialization_data_format: Option<String>,
    pub byte_length: usize,
}
