//! Field declarations for entity and key schemas

use serde_json::Value;
use std::fmt;

/// Primitive shape a field value must have
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Exactly this JSON value
    Literal(Value),
    Any,
}

impl FieldType {
    /// Check whether a non-null JSON value has this shape
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Literal(expected) => value == expected,
            FieldType::Any => true,
        }
    }

    /// Whether a key field of type `self` can address an entity field of type `entity`
    pub fn compatible_with(&self, entity: &FieldType) -> bool {
        match (self, entity) {
            (_, FieldType::Any) | (FieldType::Any, _) => true,
            (FieldType::Integer, FieldType::Number) => true,
            (FieldType::Literal(v), other) => other.accepts(v),
            (other, FieldType::Literal(v)) => other.accepts(v),
            (a, b) => a == b,
        }
    }

    /// Best-effort conversion of a query-string value into this type
    pub fn coerce_str(&self, raw: &str) -> Option<Value> {
        match self {
            FieldType::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldType::Integer => raw.parse::<i64>().ok().map(Value::from),
            FieldType::Number => {
                if let Ok(i) = raw.parse::<i64>() {
                    return Some(Value::from(i));
                }
                raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number)
            }
            FieldType::Literal(v) if v.is_boolean() || v.is_number() => {
                let coerced: Value = serde_json::from_str(raw).ok()?;
                (coerced == *v).then_some(coerced)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Array => write!(f, "array"),
            FieldType::Object => write!(f, "object"),
            FieldType::Literal(v) => write!(f, "literal {}", v),
            FieldType::Any => write!(f, "any"),
        }
    }
}

/// Describe the JSON kind of a received value for error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single declared field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self { name: name.into(), ty, required: true, nullable: false, default: None }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Array)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Object)
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Any)
    }

    pub fn literal(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, FieldType::Literal(value.into()))
    }

    /// Field may be absent
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Field accepts an explicit `null`
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the field is absent from input
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}
