use super::format::{DataFormatRegistry, JAVA_SERIALIZED_FORMAT, JSON_FORMAT};
use super::{
    ObjectValue, SerializationDescriptor, SerializedValueDto, TypedValue, ValueType,
    VariableValueDto, VALUE_INFO_OBJECT_TYPE_NAME, VALUE_INFO_SERIALIZATION_DATA_FORMAT,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Timelike};
use serde_json::Value as Json;
use std::sync::Arc;
use thiserror::Error;

/// Wire pattern for dates; a zoned variant is accepted on input.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const ZONED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

// ─── Errors ───────────────────────────────────────────────────

/// Decoding failures. Parse failures render as `<name> due to <message>`,
/// the rest as `<name>: <message>` (see [`ValueError::describe_for`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("number format exception: For input string: \"{0}\"")]
    NumberFormat(String),

    #[error("parse exception: Unparseable date: \"{0}\"")]
    DateFormat(String),

    #[error("base64 decode exception: {0}")]
    Base64(String),

    #[error("The variable type '{0}' is not supported.")]
    UnsupportedType(String),

    #[error("Unrecognized serialization data format: {0}")]
    UnrecognizedDataFormat(String),

    #[error("Cannot convert a JSON {found} to a value of type {tag}")]
    ShapeMismatch {
        tag: &'static str,
        found: &'static str,
    },

    #[error("Cannot infer the type of a JSON {0}; declare the variable type explicitly")]
    UntypedValue(&'static str),
}

impl ValueError {
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ValueError::NumberFormat(_) | ValueError::DateFormat(_) | ValueError::Base64(_)
        )
    }

    /// Message naming the variable that failed to decode.
    pub fn describe_for(&self, name: &str) -> String {
        if self.is_parse_failure() {
            format!("{} due to {}", name, self)
        } else {
            format!("{}: {}", name, self)
        }
    }
}

/// Failure of the binary content accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BinaryAccessError {
    #[error("variable does not exist")]
    NotFound,
    #[error("variable does not hold binary content")]
    NotBinary,
}

// ─── Options ──────────────────────────────────────────────────

/// Capability flags mirroring the flags set on the engine query that
/// produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub binary_fetching: bool,
    pub custom_object_deserialization: bool,
}

impl EncodeOptions {
    pub fn without_binary_fetching(mut self) -> Self {
        self.binary_fetching = false;
        self
    }

    pub fn with_deserialization(mut self, enabled: bool) -> Self {
        self.custom_object_deserialization = enabled;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            binary_fetching: true,
            custom_object_deserialization: true,
        }
    }
}

// ─── Codec ────────────────────────────────────────────────────

/// Converts between [`VariableValueDto`] and [`TypedValue`].
///
/// Holds only the read-only format registry, so a single codec is shared by
/// every request.
#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    formats: Arc<DataFormatRegistry>,
}

impl ValueCodec {
    pub fn new(formats: DataFormatRegistry) -> Self {
        Self {
            formats: Arc::new(formats),
        }
    }

    pub fn formats(&self) -> &DataFormatRegistry {
        &self.formats
    }

    /// Wire → engine.
    pub fn decode(&self, dto: &VariableValueDto) -> Result<TypedValue, ValueError> {
        let Some(tag) = dto.type_name.as_deref() else {
            return infer(&dto.value);
        };
        let ty = ValueType::from_tag(tag).ok_or_else(|| ValueError::UnsupportedType(tag.into()))?;
        let value = &dto.value;

        let typed = match ty {
            ValueType::Null => match value {
                Json::Null => TypedValue::Null,
                other => return Err(mismatch(ty, other)),
            },
            ValueType::String => TypedValue::String(decode_string(ty, value)?),
            ValueType::Boolean => TypedValue::Boolean(decode_bool(ty, value)?),
            ValueType::Short => TypedValue::Short(decode_integral(ty, value)?),
            ValueType::Integer => TypedValue::Integer(decode_integral(ty, value)?),
            ValueType::Long => TypedValue::Long(decode_integral(ty, value)?),
            ValueType::Double => TypedValue::Double(decode_double(ty, value)?),
            ValueType::Date => TypedValue::Date(decode_date(value)?),
            ValueType::Bytes => TypedValue::Bytes(decode_base64(ty, value)?),
            ValueType::Object | ValueType::Serializable => {
                TypedValue::Object(self.decode_object(ty, dto)?)
            }
        };
        Ok(typed)
    }

    /// Decode a raw binary upload. Without an object type name the payload is
    /// a plain byte array; with one it is a serialized object whose format is
    /// the upload's content type.
    pub fn decode_binary(
        &self,
        payload: Vec<u8>,
        object_type_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<TypedValue, ValueError> {
        let Some(type_name) = object_type_name else {
            return Ok(TypedValue::Bytes(Some(payload)));
        };
        let format = match content_type {
            Some(ct) => self
                .formats
                .resolve(ct)
                .ok_or_else(|| ValueError::UnrecognizedDataFormat(ct.to_string()))?,
            None => self.formats.default_format().to_string(),
        };
        Ok(TypedValue::Object(ObjectValue {
            serialized_data: Some(payload),
            serialization_data_format: Some(format),
            object_type_name: Some(type_name.to_string()),
            configuration: Default::default(),
        }))
    }

    /// Engine → wire. Output depends only on the inputs, so encoding the same
    /// value twice serializes identically.
    pub fn encode(&self, value: &TypedValue, options: EncodeOptions) -> VariableValueDto {
        let ty = value.value_type();
        let json = match value {
            TypedValue::Null => Json::Null,
            TypedValue::String(v) => v.clone().map(Json::String).unwrap_or(Json::Null),
            TypedValue::Boolean(v) => v.map(Json::Bool).unwrap_or(Json::Null),
            TypedValue::Short(v) => v.map(Json::from).unwrap_or(Json::Null),
            TypedValue::Integer(v) => v.map(Json::from).unwrap_or(Json::Null),
            TypedValue::Long(v) => v.map(Json::from).unwrap_or(Json::Null),
            TypedValue::Double(v) => v.map(encode_double).unwrap_or(Json::Null),
            TypedValue::Date(v) => v
                .as_ref()
                .map(|d| Json::String(format_date(d)))
                .unwrap_or(Json::Null),
            TypedValue::Bytes(v) => match v {
                Some(bytes) if options.binary_fetching => Json::String(BASE64.encode(bytes)),
                _ => Json::Null,
            },
            TypedValue::Object(object) => return encode_object(object, options),
        };
        VariableValueDto::typed(json, ty.tag())
    }

    fn decode_object(
        &self,
        ty: ValueType,
        dto: &VariableValueDto,
    ) -> Result<ObjectValue, ValueError> {
        let format = match dto.value_info.get(VALUE_INFO_SERIALIZATION_DATA_FORMAT) {
            Some(Json::String(declared)) => self
                .formats
                .resolve(declared)
                .ok_or_else(|| ValueError::UnrecognizedDataFormat(declared.clone()))?,
            Some(Json::Null) | None if ty == ValueType::Serializable => {
                self.formats
                    .resolve(JAVA_SERIALIZED_FORMAT)
                    .ok_or_else(|| {
                        ValueError::UnrecognizedDataFormat(JAVA_SERIALIZED_FORMAT.to_string())
                    })?
            }
            Some(Json::Null) | None => self.formats.default_format().to_string(),
            Some(other) => return Err(ValueError::UnrecognizedDataFormat(other.to_string())),
        };

        let object_type_name = dto
            .value_info
            .get(VALUE_INFO_OBJECT_TYPE_NAME)
            .and_then(Json::as_str)
            .map(str::to_string);

        let serialized_data = match &dto.value {
            Json::Null => None,
            // Natively serialized payloads are binary and travel as base64.
            Json::String(s) if format == JAVA_SERIALIZED_FORMAT => Some(
                BASE64
                    .decode(s)
                    .map_err(|e| ValueError::Base64(e.to_string()))?,
            ),
            Json::String(s) => Some(s.clone().into_bytes()),
            Json::Object(_) | Json::Array(_) if format != JSON_FORMAT => {
                return Err(mismatch(ty, &dto.value));
            }
            other => Some(other.to_string().into_bytes()),
        };

        Ok(ObjectValue {
            serialized_data,
            serialization_data_format: Some(format),
            object_type_name,
            configuration: Default::default(),
        })
    }
}

/// Bytes behind a binary or serialized-object variable. Typed nulls yield an
/// empty payload.
pub fn binary_payload(value: Option<&TypedValue>) -> Result<Vec<u8>, BinaryAccessError> {
    match value {
        None => Err(BinaryAccessError::NotFound),
        Some(TypedValue::Bytes(bytes)) => Ok(bytes.clone().unwrap_or_default()),
        Some(TypedValue::Object(object)) => Ok(object.serialized_data.clone().unwrap_or_default()),
        Some(_) => Err(BinaryAccessError::NotBinary),
    }
}

/// Parse `yyyy-MM-dd'T'HH:mm:ss`, or the same with a zone offset (normalised
/// to UTC). Sub-second precision is dropped.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        return Some(naive);
    }
    let zoned = DateTime::parse_from_str(raw, ZONED_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()?;
    zoned.naive_utc().with_nanosecond(0)
}

pub fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ─── Primitive decoding ───────────────────────────────────────

fn infer(value: &Json) -> Result<TypedValue, ValueError> {
    match value {
        Json::Null => Ok(TypedValue::Null),
        Json::Bool(b) => Ok(TypedValue::Boolean(Some(*b))),
        Json::String(s) => Ok(TypedValue::String(Some(s.clone()))),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(match i32::try_from(i) {
                    Ok(small) => TypedValue::Integer(Some(small)),
                    Err(_) => TypedValue::Long(Some(i)),
                })
            } else {
                Ok(TypedValue::Double(n.as_f64()))
            }
        }
        Json::Array(_) => Err(ValueError::UntypedValue("array")),
        Json::Object(_) => Err(ValueError::UntypedValue("object")),
    }
}

fn decode_string(ty: ValueType, value: &Json) -> Result<Option<String>, ValueError> {
    match value {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s.clone())),
        Json::Number(n) => Ok(Some(n.to_string())),
        Json::Bool(b) => Ok(Some(b.to_string())),
        other => Err(mismatch(ty, other)),
    }
}

fn decode_bool(ty: ValueType, value: &Json) -> Result<Option<bool>, ValueError> {
    match value {
        Json::Null => Ok(None),
        Json::Bool(b) => Ok(Some(*b)),
        Json::String(s) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Json::String(s) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        other => Err(mismatch(ty, other)),
    }
}

fn decode_integral<T>(ty: ValueType, value: &Json) -> Result<Option<T>, ValueError>
where
    T: TryFrom<i64> + std::str::FromStr,
{
    match value {
        Json::Null => Ok(None),
        Json::String(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| ValueError::NumberFormat(s.clone())),
        Json::Number(n) => n
            .as_i64()
            .and_then(|i| T::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| ValueError::NumberFormat(n.to_string())),
        other => Err(mismatch(ty, other)),
    }
}

fn decode_double(ty: ValueType, value: &Json) -> Result<Option<f64>, ValueError> {
    match value {
        Json::Null => Ok(None),
        Json::String(s) => parse_double(s)
            .map(Some)
            .ok_or_else(|| ValueError::NumberFormat(s.clone())),
        Json::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ValueError::NumberFormat(n.to_string())),
        other => Err(mismatch(ty, other)),
    }
}

/// Decimal literals plus the `NaN`/`Infinity` spellings that encoding emits.
/// Other spellings such as `inf` or `nan` are rejected.
fn parse_double(raw: &str) -> Option<f64> {
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let magnitude = match unsigned {
        "NaN" => f64::NAN,
        "Infinity" => f64::INFINITY,
        digits if digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
            digits.parse().ok()?
        }
        _ => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

fn decode_date(value: &Json) -> Result<Option<NaiveDateTime>, ValueError> {
    match value {
        Json::Null => Ok(None),
        Json::String(s) => parse_date(s)
            .map(Some)
            .ok_or_else(|| ValueError::DateFormat(s.clone())),
        other => Err(ValueError::DateFormat(other.to_string())),
    }
}

fn decode_base64(ty: ValueType, value: &Json) -> Result<Option<Vec<u8>>, ValueError> {
    match value {
        Json::Null => Ok(None),
        Json::String(s) => BASE64
            .decode(s)
            .map(Some)
            .map_err(|e| ValueError::Base64(e.to_string())),
        other => Err(mismatch(ty, other)),
    }
}

fn mismatch(ty: ValueType, value: &Json) -> ValueError {
    ValueError::ShapeMismatch {
        tag: ty.tag(),
        found: json_kind(value),
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

// ─── Encoding helpers ─────────────────────────────────────────

/// Non-finite doubles have no JSON number form; they travel as the strings
/// the decoder parses back.
fn encode_double(v: f64) -> Json {
    match serde_json::Number::from_f64(v) {
        Some(n) => Json::Number(n),
        None if v.is_nan() => Json::String("NaN".into()),
        None if v.is_sign_positive() => Json::String("Infinity".into()),
        None => Json::String("-Infinity".into()),
    }
}

fn encode_object(object: &ObjectValue, options: EncodeOptions) -> VariableValueDto {
    let native = object.is_native_serializable();
    let tag = if native {
        ValueType::Serializable.tag()
    } else {
        ValueType::Object.tag()
    };

    let mut dto = VariableValueDto::typed(Json::Null, tag);
    if let Some(name) = &object.object_type_name {
        dto.value_info
            .insert(VALUE_INFO_OBJECT_TYPE_NAME.into(), Json::String(name.clone()));
    }
    if let Some(format) = &object.serialization_data_format {
        dto.value_info.insert(
            VALUE_INFO_SERIALIZATION_DATA_FORMAT.into(),
            Json::String(format.clone()),
        );
    }

    let Some(data) = object.serialized_data.as_deref() else {
        return dto;
    };

    if native {
        if options.custom_object_deserialization {
            let descriptor = SerializationDescriptor {
                object_type_name: object.object_type_name.clone(),
                serialization_data_format: object.serialization_data_format.clone(),
                byte_length: data.len(),
            };
            dto.value = serde_json::to_value(descriptor).unwrap_or(Json::Null);
        }
        return dto;
    }

    let text = String::from_utf8_lossy(data).into_owned();
    if options.custom_object_deserialization {
        dto.value = match object.serialization_data_format.as_deref() {
            Some(JSON_FORMAT) => {
                serde_json::from_slice(data).unwrap_or_else(|_| Json::String(text.clone()))
            }
            _ => Json::String(text.clone()),
        };
    }
    dto.serialized_value = Some(SerializedValueDto {
        value: Json::String(text),
        configuration: object.configuration.clone(),
    });
    dto
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn codec() -> ValueCodec {
        ValueCodec::default()
    }

    fn typed(value: Json, tag: &str) -> VariableValueDto {
        VariableValueDto::typed(value, tag)
    }

    fn sample_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 2, 3)
            .and_then(|d| d.and_hms_opt(10, 11, 12))
            .unwrap()
    }

    #[test]
    fn round_trip_every_primitive_tag() {
        let codec = codec();
        let values = vec![
            TypedValue::Null,
            TypedValue::string("aString"),
            TypedValue::String(None),
            TypedValue::Boolean(Some(true)),
            TypedValue::Boolean(None),
            TypedValue::Short(Some(-12)),
            TypedValue::Short(None),
            TypedValue::Integer(Some(123)),
            TypedValue::Integer(None),
            TypedValue::Long(Some(i64::MAX)),
            TypedValue::Long(None),
            TypedValue::Double(Some(1.5)),
            TypedValue::Double(Some(2.0)),
            TypedValue::Double(Some(f64::INFINITY)),
            TypedValue::Double(None),
            TypedValue::Date(Some(sample_date())),
            TypedValue::Date(None),
            TypedValue::bytes(b"some bytes".to_vec()),
            TypedValue::Bytes(None),
        ];

        for value in values {
            let wire = codec.encode(&value, EncodeOptions::default());
            let back = codec.decode(&wire).unwrap();
            assert_eq!(back, value, "round trip through {:?}", wire);
        }
    }

    #[test]
    fn unrecognized_tag_is_rejected() {
        let err = codec().decode(&typed(json!("x"), "X")).unwrap_err();
        assert_eq!(err.to_string(), "The variable type 'X' is not supported.");
        assert_eq!(
            err.describe_for("aVariableKey"),
            "aVariableKey: The variable type 'X' is not supported."
        );
    }

    #[test]
    fn unparseable_numbers_report_the_input() {
        for tag in ["Short", "Integer", "Long", "Double"] {
            let err = codec().decode(&typed(json!("1abc"), tag)).unwrap_err();
            assert!(err.to_string().contains(r#"For input string: "1abc""#));
            assert_eq!(
                err.describe_for("aVariableKey"),
                r#"aVariableKey due to number format exception: For input string: "1abc""#
            );
        }
    }

    #[test]
    fn out_of_range_numbers_are_format_errors() {
        let err = codec().decode(&typed(json!(70000), "Short")).unwrap_err();
        assert_eq!(err, ValueError::NumberFormat("70000".into()));

        let err = codec()
            .decode(&typed(json!("99999999999"), "Integer"))
            .unwrap_err();
        assert_eq!(err, ValueError::NumberFormat("99999999999".into()));
    }

    #[test]
    fn numeric_strings_are_parsed_to_declared_width() {
        let codec = codec();
        assert_eq!(
            codec.decode(&typed(json!("123"), "Short")).unwrap(),
            TypedValue::Short(Some(123))
        );
        assert_eq!(
            codec.decode(&typed(json!("123"), "Long")).unwrap(),
            TypedValue::Long(Some(123))
        );
        assert_eq!(
            codec.decode(&typed(json!("1.25"), "Double")).unwrap(),
            TypedValue::Double(Some(1.25))
        );
    }

    #[test]
    fn only_encoded_double_spellings_are_accepted() {
        let codec = codec();
        assert_eq!(
            codec.decode(&typed(json!("-Infinity"), "Double")).unwrap(),
            TypedValue::Double(Some(f64::NEG_INFINITY))
        );
        match codec.decode(&typed(json!("NaN"), "Double")).unwrap() {
            TypedValue::Double(Some(v)) => assert!(v.is_nan()),
            other => panic!("expected NaN, got {:?}", other),
        }
        for raw in ["inf", "infinity", "nan", "-inf", "INFINITY", "+-1"] {
            let err = codec.decode(&typed(json!(raw), "Double")).unwrap_err();
            assert_eq!(err, ValueError::NumberFormat(raw.into()));
        }
    }

    #[test]
    fn sub_second_dates_are_truncated_on_construction() {
        let precise = sample_date() + chrono::Duration::milliseconds(456);
        let value = TypedValue::date(precise);
        assert_eq!(value, TypedValue::Date(Some(sample_date())));

        let codec = codec();
        let wire = codec.encode(&value, EncodeOptions::default());
        assert_eq!(codec.decode(&wire).unwrap(), value);
        assert_eq!(TypedValue::Date(Some(precise)).normalized(), value);
    }

    #[test]
    fn unparseable_date_reports_the_input() {
        let err = codec().decode(&typed(json!("1abc"), "Date")).unwrap_err();
        assert!(err.to_string().contains(r#"Unparseable date: "1abc""#));
        assert_eq!(
            err.describe_for("aVariableKey"),
            r#"aVariableKey due to parse exception: Unparseable date: "1abc""#
        );
    }

    #[test]
    fn zoned_dates_are_normalised_to_utc() {
        let decoded = codec()
            .decode(&typed(json!("2014-02-03T12:11:12+0200"), "Date"))
            .unwrap();
        assert_eq!(decoded, TypedValue::Date(Some(sample_date())));

        let decoded = codec()
            .decode(&typed(json!("2014-02-03T10:11:12.345Z"), "Date"))
            .unwrap();
        assert_eq!(decoded, TypedValue::Date(Some(sample_date())));
    }

    #[test]
    fn typed_null_keeps_declared_type() {
        let decoded = codec().decode(&typed(Json::Null, "Integer")).unwrap();
        assert_eq!(decoded, TypedValue::Integer(None));
        assert_ne!(decoded, TypedValue::Null);
    }

    #[test]
    fn untyped_values_are_inferred_from_json_shape() {
        let codec = codec();
        let infer = |v: Json| codec.decode(&VariableValueDto::untyped(v));
        assert_eq!(infer(json!("s")).unwrap(), TypedValue::string("s"));
        assert_eq!(infer(json!(5)).unwrap(), TypedValue::integer(5));
        assert_eq!(
            infer(json!(5_000_000_000_i64)).unwrap(),
            TypedValue::Long(Some(5_000_000_000))
        );
        assert_eq!(infer(json!(1.5)).unwrap(), TypedValue::Double(Some(1.5)));
        assert_eq!(infer(json!(false)).unwrap(), TypedValue::Boolean(Some(false)));
        assert_eq!(infer(Json::Null).unwrap(), TypedValue::Null);
        assert_eq!(
            infer(json!({"a": 1})).unwrap_err(),
            ValueError::UntypedValue("object")
        );
    }

    #[test]
    fn bytes_are_gated_by_binary_fetching() {
        let value = TypedValue::bytes(b"abc".to_vec());
        let wire = codec().encode(&value, EncodeOptions::default().without_binary_fetching());
        assert_eq!(wire.value, Json::Null);
        assert_eq!(wire.type_name.as_deref(), Some("byte[]"));

        let wire = codec().encode(&value, EncodeOptions::default());
        assert_eq!(wire.value, json!("YWJj"));
    }

    #[test]
    fn invalid_base64_is_a_parse_failure() {
        let err = codec().decode(&typed(json!("%%%"), "Bytes")).unwrap_err();
        assert!(err.is_parse_failure());
        assert!(err.describe_for("k").starts_with("k due to base64 decode exception"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut configuration = std::collections::BTreeMap::new();
        configuration.insert("rootType".to_string(), json!("aRootType"));
        configuration.insert("dataFormatId".to_string(), json!("aDataFormat"));
        let value = TypedValue::Object(ObjectValue {
            serialized_data: Some(br#"{"b":1,"a":2}"#.to_vec()),
            serialization_data_format: Some(JSON_FORMAT.into()),
            object_type_name: Some("com.example.Foo".into()),
            configuration,
        });

        let first = serde_json::to_vec(&codec().encode(&value, EncodeOptions::default())).unwrap();
        let second = serde_json::to_vec(&codec().encode(&value, EncodeOptions::default())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn object_decode_uses_declared_format_and_type_name() {
        let dto = typed(json!(r#"["foo"]"#), "Object")
            .with_value_info(VALUE_INFO_SERIALIZATION_DATA_FORMAT, JSON_FORMAT)
            .with_value_info(VALUE_INFO_OBJECT_TYPE_NAME, "org.example.LineItems");
        let decoded = codec().decode(&dto).unwrap();
        assert_eq!(
            decoded,
            TypedValue::Object(ObjectValue {
                serialized_data: Some(br#"["foo"]"#.to_vec()),
                serialization_data_format: Some(JSON_FORMAT.into()),
                object_type_name: Some("org.example.LineItems".into()),
                configuration: Default::default(),
            })
        );
    }

    #[test]
    fn object_decode_accepts_inline_json_payload() {
        let dto = typed(json!(["foo"]), "Object")
            .with_value_info(VALUE_INFO_SERIALIZATION_DATA_FORMAT, JSON_FORMAT);
        let TypedValue::Object(object) = codec().decode(&dto).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(object.serialized_data.as_deref(), Some(&br#"["foo"]"#[..]));
    }

    #[test]
    fn object_with_unknown_format_is_rejected() {
        let dto = typed(json!("payload"), "Object")
            .with_value_info(VALUE_INFO_SERIALIZATION_DATA_FORMAT, "unsupported");
        assert_eq!(
            codec().decode(&dto).unwrap_err(),
            ValueError::UnrecognizedDataFormat("unsupported".into())
        );
    }

    #[test]
    fn object_without_format_uses_registry_default() {
        let codec = ValueCodec::new(DataFormatRegistry::from_list("application/xml"));
        let TypedValue::Object(object) = codec.decode(&typed(json!("<a/>"), "Object")).unwrap()
        else {
            panic!("expected object");
        };
        assert_eq!(
            object.serialization_data_format.as_deref(),
            Some("application/xml")
        );
    }

    #[test]
    fn custom_object_encodes_serialized_value() {
        let mut configuration = std::collections::BTreeMap::new();
        configuration.insert("rootType".to_string(), json!("aRootType"));
        let value = TypedValue::Object(ObjectValue {
            serialized_data: Some(b"aSerializedValue".to_vec()),
            serialization_data_format: Some("application/xml".into()),
            object_type_name: Some("Foo".into()),
            configuration,
        });

        let wire = codec().encode(&value, EncodeOptions::default().with_deserialization(false));
        assert_eq!(wire.type_name.as_deref(), Some("Object"));
        assert_eq!(wire.value, Json::Null);
        let serialized = wire.serialized_value.unwrap();
        assert_eq!(serialized.value, json!("aSerializedValue"));
        assert_eq!(serialized.configuration["rootType"], json!("aRootType"));
        assert_eq!(
            wire.value_info[VALUE_INFO_SERIALIZATION_DATA_FORMAT],
            json!("application/xml")
        );
    }

    #[test]
    fn json_object_payload_is_inlined_when_deserializing() {
        let value = TypedValue::Object(ObjectValue {
            serialized_data: Some(br#"["foo"]"#.to_vec()),
            serialization_data_format: Some(JSON_FORMAT.into()),
            object_type_name: None,
            configuration: Default::default(),
        });
        let wire = codec().encode(&value, EncodeOptions::default());
        assert_eq!(wire.value, json!(["foo"]));
    }

    #[test]
    fn native_serializable_emits_descriptor_not_payload() {
        let value = TypedValue::Object(ObjectValue {
            serialized_data: Some(vec![0xAC, 0xED, 0x00, 0x05]),
            serialization_data_format: Some(JAVA_SERIALIZED_FORMAT.into()),
            object_type_name: Some("org.example.LineItems".into()),
            configuration: Default::default(),
        });

        let wire = codec().encode(&value, EncodeOptions::default());
        assert_eq!(wire.type_name.as_deref(), Some("Serializable"));
        assert_eq!(
            wire.value,
            json!({
                "objectTypeName": "org.example.LineItems",
                "serializationDataFormat": JAVA_SERIALIZED_FORMAT,
                "byteLength": 4
            })
        );
        assert!(wire.serialized_value.is_none());

        let wire = codec().encode(&value, EncodeOptions::default().with_deserialization(false));
        assert_eq!(wire.value, Json::Null);
        assert!(wire.serialized_value.is_none());
    }

    #[test]
    fn serializable_tag_decodes_base64_payload() {
        let dto = typed(json!("rO0ABQ=="), "Serializable");
        let TypedValue::Object(object) = codec().decode(&dto).unwrap() else {
            panic!("expected object");
        };
        assert!(object.is_native_serializable());
        assert_eq!(object.serialized_data, Some(vec![0xAC, 0xED, 0x00, 0x05]));
    }

    #[test]
    fn binary_upload_without_type_is_bytes() {
        let decoded = codec()
            .decode_binary(b"someContent".to_vec(), None, Some("application/octet-stream"))
            .unwrap();
        assert_eq!(decoded, TypedValue::bytes(b"someContent".to_vec()));
    }

    #[test]
    fn binary_upload_with_type_is_object() {
        let decoded = codec()
            .decode_binary(
                br#"["foo"]"#.to_vec(),
                Some("org.example.LineItems"),
                Some("application/json"),
            )
            .unwrap();
        let TypedValue::Object(object) = decoded else {
            panic!("expected object");
        };
        assert_eq!(object.serialization_data_format.as_deref(), Some(JSON_FORMAT));
        assert_eq!(
            object.object_type_name.as_deref(),
            Some("org.example.LineItems")
        );

        let err = codec()
            .decode_binary(b"x".to_vec(), Some("Foo"), Some("unsupported"))
            .unwrap_err();
        assert_eq!(err, ValueError::UnrecognizedDataFormat("unsupported".into()));
    }

    #[test]
    fn binary_accessor_distinguishes_missing_and_non_binary() {
        assert_eq!(binary_payload(None), Err(BinaryAccessError::NotFound));
        assert_eq!(
            binary_payload(Some(&TypedValue::string("s"))),
            Err(BinaryAccessError::NotBinary)
        );
        assert_eq!(
            binary_payload(Some(&TypedValue::bytes(b"x".to_vec()))),
            Ok(b"x".to_vec())
        );
        assert_eq!(binary_payload(Some(&TypedValue::Bytes(None))), Ok(Vec::new()));
    }
}
