//! Primitive values exchanged with the engine.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

/// A single argument or result value in the engine's RPC dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcValue {
    /// Integer (`i8` in the engine's dialect).
    Int(i64),
    /// UTF-8 string.
    String(String),
    /// Opaque binary payload (base64 on the wire).
    Bytes(Vec<u8>),
    /// Ordered list.
    List(Vec<RpcValue>),
    /// Keyed structure.
    Struct(BTreeMap<String, RpcValue>),
    /// Absent value.
    Nil,
}

impl RpcValue {
    /// Borrow the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret the value as an integer, accepting numeric strings.
    ///
    /// The engine returns many counters as strings depending on the method.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret the value as an unsigned count, clamping negatives to zero.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().map(|value| u64::try_from(value).unwrap_or(0))
    }

    /// Interpret the value as a flag (`1`, `"1"`, `"true"`).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::String(value) if value.eq_ignore_ascii_case("true") => Some(true),
            Self::String(value) if value.eq_ignore_ascii_case("false") => Some(false),
            other => other.as_i64().map(|value| value != 0),
        }
    }

    /// Borrow the value as a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Take ownership of the list items, if this is a list.
    #[must_use]
    pub fn into_list(self) -> Option<Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a member of a structure.
    #[must_use]
    pub fn member(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Struct(members) => members.get(key),
            _ => None,
        }
    }

    /// Encode as JSON for the JSON-RPC transport.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(value) => Value::from(*value),
            Self::String(value) => Value::from(value.as_str()),
            Self::Bytes(bytes) => Value::from(STANDARD.encode(bytes)),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Struct(members) => Value::Object(
                members
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Self::Nil => Value::Null,
        }
    }

    /// Decode a JSON result. Floats are truncated; booleans become `0`/`1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Nil,
            Value::Bool(flag) => Self::Int(i64::from(flag)),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|float| float as i64))
                .map_or(Self::Nil, Self::Int),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(members) => Self::Struct(
                members
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for RpcValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for RpcValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for RpcValue {
    fn from(value: bool) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for RpcValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for RpcValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<String>> for RpcValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value.into_iter().map(Self::String).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_decode_as_integers() {
        assert_eq!(RpcValue::from("102400").as_i64(), Some(102_400));
        assert_eq!(RpcValue::from("-1").as_u64(), Some(0));
        assert_eq!(RpcValue::from("abc").as_i64(), None);
        assert_eq!(RpcValue::Int(0).as_bool(), Some(false));
        assert_eq!(RpcValue::from("true").as_bool(), Some(true));
    }

    #[test]
    fn json_decoding_maps_engine_shapes() {
        let decoded = RpcValue::from_json(json!([true, 2.9, null, {"dht": "auto"}]));
        let items = decoded.as_list().unwrap_or_default();
        assert_eq!(items[0], RpcValue::Int(1));
        assert_eq!(items[1], RpcValue::Int(2));
        assert_eq!(items[2], RpcValue::Nil);
        assert_eq!(
            items[3].member("dht").and_then(RpcValue::as_str),
            Some("auto")
        );
    }

    #[test]
    fn bytes_encode_as_base64() {
        let encoded = RpcValue::Bytes(b"d4:infoe".to_vec()).to_json();
        assert_eq!(encoded, json!("ZDQ6aW5mb2U="));
    }
}
