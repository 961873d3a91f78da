use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A cached payload
///
/// The set of kinds is closed so that every value can be written to a
/// snapshot and read back without any runtime type registration. Callers
/// with richer types map them onto `Record`/`List`, or store them
/// pre-serialized as `Bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the kind name used as the tag in snapshots
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Checks that the value can be written to a snapshot.
    ///
    /// JSON has no representation for NaN or infinities, so a `Float`
    /// holding one of those (at any depth) is rejected with a short reason.
    pub(crate) fn check_encodable(&self) -> Result<(), String> {
        match self {
            Value::Float(f) if !f.is_finite() => {
                Err(format!("float {} has no snapshot representation", f))
            }
            Value::List(items) => items.iter().try_for_each(Value::check_encodable),
            Value::Record(fields) => fields.iter().try_for_each(|(name, field)| {
                field
                    .check_encodable()
                    .map_err(|reason| format!("field `{}`: {}", name, reason))
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, field)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Record(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_string(&Value::Int(7)).unwrap();
        assert_eq!(json, r#"{"type":"int","data":7}"#);

        let json = serde_json::to_string(&Value::Null).unwrap();
        assert_eq!(json, r#"{"type":"null"}"#);
    }

    #[test]
    fn test_nested_record_survives_json() {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::from("alice"));
        fields.insert("tags".to_string(), Value::from(vec![Value::from(1), Value::from(true)]));
        fields.insert("blob".to_string(), Value::from(vec![0u8, 255, 16]));
        let original = Value::Record(fields);

        let json = serde_json::to_string(&original).unwrap();
        let decoded: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let result: Result<Value, _> = serde_json::from_str(r#"{"type":"pointer","data":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_encodable_rejects_non_finite_floats() {
        assert!(Value::Float(1.5).check_encodable().is_ok());
        assert!(Value::Float(f64::NAN).check_encodable().is_err());

        let mut fields = BTreeMap::new();
        fields.insert("ratio".to_string(), Value::Float(f64::INFINITY));
        let err = Value::List(vec![Value::Record(fields)])
            .check_encodable()
            .unwrap_err();
        assert!(err.contains("ratio"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("hello").to_string(), "hello");
        assert_eq!(Value::from(vec![Value::from(1), Value::from("a")]).to_string(), "[1, a]");
        assert_eq!(Value::from(vec![1u8, 2, 3]).to_string(), "<3 bytes>");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from(42i64).as_int(), Some(42));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(42i64).as_str(), None);
        assert_eq!(Value::from(vec![9u8]).as_bytes(), Some(&[9u8][..]));
        assert_eq!(Value::Null.kind(), "null");
    }
}
