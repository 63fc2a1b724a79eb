use {serde_json::Number, tap::Pipe};

/// Insertion-ordered string-keyed container, the shape both algorithms
/// produce and consume.
pub type Map = indexmap::IndexMap<String, Value>;

/// A nested value tree. Closed set of variants, classified at construction
/// time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit absence. Distinct from [`Value::Null`]: an `Undefined` slot
    /// never blocks deeper insertion during unflattening.
    Undefined,
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Opaque byte buffer. Treated as an atomic leaf, its content passes
    /// through both algorithms untouched.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(Map),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("undefined values have no JSON representation")]
    UndefinedValue,
    #[error("byte buffers have no JSON representation")]
    ByteBuffer,
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(number) => Value::Number(number),
            serde_json::Value::String(value) => Value::String(value),
            serde_json::Value::Array(items) => {
                items.into_iter().map(Value::from).collect::<Vec<_>>().pipe(Value::Array)
            }
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect::<Map>()
                .pipe(Value::Object),
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = self::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Undefined => Err(self::Error::UndefinedValue),
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(value) => Ok(serde_json::Value::Bool(value)),
            Value::Number(number) => Ok(serde_json::Value::Number(number)),
            Value::String(value) => Ok(serde_json::Value::String(value)),
            Value::Bytes(_) => Err(self::Error::ByteBuffer),
            Value::Array(items) => items
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| value.try_into().map(|value| (key, value)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(serde_json::Value::Object),
        }
    }
}
