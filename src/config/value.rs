//! Example output values and their coercion to declared field types

use super::error::CoercionError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Declared type of an output-schema field
///
/// Tags outside the five known kinds are kept verbatim so hand-edited files
/// load; they are only rejected when a field is created through the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    List,
    Unrecognized(String),
}

impl FieldType {
    /// The recognized type tags, in the order the editor offers them
    pub const KNOWN: [FieldType; 5] = [
        FieldType::Str,
        FieldType::Int,
        FieldType::Float,
        FieldType::Bool,
        FieldType::List,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Str => "str",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Unrecognized(tag) => tag,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, FieldType::Unrecognized(_))
    }

    /// Convert a value to this type
    ///
    /// Unrecognized types pass the value through untouched.
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, CoercionError> {
        match self {
            FieldType::Str => coerce_str(value),
            FieldType::Int => coerce_int(value),
            FieldType::Float => coerce_float(value),
            FieldType::Bool => coerce_bool(value),
            FieldType::List => Ok(coerce_list(value)),
            FieldType::Unrecognized(_) => Ok(value),
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "str" => FieldType::Str,
            "int" => FieldType::Int,
            "float" => FieldType::Float,
            "bool" => FieldType::Bool,
            "list" => FieldType::List,
            _ => FieldType::Unrecognized(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        FieldType::from(tag.to_string())
    }
}

impl From<FieldType> for String {
    fn from(kind: FieldType) -> Self {
        match kind {
            FieldType::Unrecognized(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value in an example's output mapping
///
/// Numbers that `Int` and `Float` cannot hold exactly (integers above
/// `i64::MAX`, `.nan`, `.inf`) load as `Raw` so they are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    /// Anything else (null, nested mappings) found under undeclared keys
    Raw(serde_yaml::Value),
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_yaml::Value::deserialize(deserializer).map(FieldValue::from_yaml)
    }
}

impl FieldValue {
    /// Classify a parsed YAML value
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => FieldValue::Int(i),
                (None, Some(x)) if n.is_f64() && x.is_finite() => FieldValue::Float(x),
                _ => FieldValue::Raw(Value::Number(n)),
            },
            Value::String(s) => FieldValue::Str(s),
            Value::Sequence(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from_yaml).collect())
            }
            other => FieldValue::Raw(other),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "str",
            FieldValue::List(_) => "list",
            FieldValue::Raw(_) => "raw value",
        }
    }

    fn describe(&self) -> String {
        match self {
            FieldValue::Str(s) => format!("str `{}`", s),
            FieldValue::Raw(_) | FieldValue::List(_) => self.kind_name().to_string(),
            scalar => format!("{} `{}`", scalar.kind_name(), scalar),
        }
    }

    fn mismatch(self, expected: &'static str) -> CoercionError {
        CoercionError::Mismatch {
            expected,
            found: self.describe(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FieldValue::Raw(value) => {
                let yaml = serde_yaml::to_string(value).map_err(|_| fmt::Error)?;
                f.write_str(yaml.trim_end())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

fn coerce_str(value: FieldValue) -> Result<FieldValue, CoercionError> {
    match value {
        FieldValue::Str(_) => Ok(value),
        FieldValue::Bool(_) | FieldValue::Int(_) | FieldValue::Float(_) => {
            Ok(FieldValue::Str(value.to_string()))
        }
        other => Err(other.mismatch("str")),
    }
}

fn coerce_int(value: FieldValue) -> Result<FieldValue, CoercionError> {
    match value {
        FieldValue::Int(_) => Ok(value),
        FieldValue::Float(x) if x.is_finite() && x.fract() == 0.0 => {
            if x >= i64::MIN as f64 && x <= i64::MAX as f64 {
                Ok(FieldValue::Int(x as i64))
            } else {
                Err(value.mismatch("int"))
            }
        }
        FieldValue::Str(ref s) => match s.trim().parse::<i64>() {
            Ok(i) => Ok(FieldValue::Int(i)),
            Err(_) => Err(value.mismatch("int")),
        },
        other => Err(other.mismatch("int")),
    }
}

fn coerce_float(value: FieldValue) -> Result<FieldValue, CoercionError> {
    match value {
        FieldValue::Float(_) => Ok(value),
        FieldValue::Int(i) => Ok(FieldValue::Float(i as f64)),
        FieldValue::Str(ref s) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(FieldValue::Float(x)),
            _ => Err(value.mismatch("float")),
        },
        other => Err(other.mismatch("float")),
    }
}

fn coerce_bool(value: FieldValue) -> Result<FieldValue, CoercionError> {
    match value {
        FieldValue::Bool(_) => Ok(value),
        FieldValue::Int(0) => Ok(FieldValue::Bool(false)),
        FieldValue::Int(1) => Ok(FieldValue::Bool(true)),
        FieldValue::Str(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(FieldValue::Bool(true)),
            "false" | "no" | "0" => Ok(FieldValue::Bool(false)),
            _ => Err(value.mismatch("bool")),
        },
        other => Err(other.mismatch("bool")),
    }
}

fn coerce_list(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::List(_) => value,
        scalar => FieldValue::List(vec![scalar]),
    }
}
