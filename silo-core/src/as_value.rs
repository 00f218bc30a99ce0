use crate::{Error, Result, Value, parse_timestamp};
use time::PrimitiveDateTime;

/// Conversion between Rust field types and [`Value`].
///
/// `try_from_value` also accepts the store's text representation (the simple
/// query protocol returns every column as text), so rehydration works both
/// on typed values and on raw `t`/`f`/digit strings.
pub trait AsValue: Sized + Send {
    fn as_value(&self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>;
}

fn mismatch(value: &Value, expected: &str) -> Error {
    Error::Schema(format!("cannot read {:?} as {}", value, expected))
}

impl AsValue for i64 {
    fn as_value(&self) -> Value {
        Value::Integer(Some(*self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Integer(Some(v)) => Ok(*v),
            Value::Varchar(Some(text)) => {
                text.trim().parse().map_err(|_| mismatch(&value, "integer"))
            }
            _ => Err(mismatch(&value, "integer")),
        }
    }
}

impl AsValue for f64 {
    fn as_value(&self) -> Value {
        Value::Float(Some(*self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Float(Some(v)) => Ok(*v),
            Value::Integer(Some(v)) => Ok(*v as f64),
            Value::Varchar(Some(text)) => {
                text.trim().parse().map_err(|_| mismatch(&value, "float"))
            }
            _ => Err(mismatch(&value, "float")),
        }
    }
}

impl AsValue for bool {
    fn as_value(&self) -> Value {
        Value::Boolean(Some(*self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Boolean(Some(v)) => Ok(*v),
            Value::Integer(Some(v)) => Ok(*v != 0),
            Value::Varchar(Some(text)) => match text.as_str() {
                "t" | "true" => Ok(true),
                "f" | "false" => Ok(false),
                _ => Err(mismatch(&value, "boolean")),
            },
            _ => Err(mismatch(&value, "boolean")),
        }
    }
}

impl AsValue for String {
    fn as_value(&self) -> Value {
        Value::Varchar(Some(self.clone()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            other => Err(mismatch(&other, "string")),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_value(&self) -> Value {
        Value::Timestamp(Some(*self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Timestamp(Some(v)) => Ok(*v),
            Value::Varchar(Some(text)) => {
                parse_timestamp(text).ok_or_else(|| mismatch(&value, "timestamp"))
            }
            _ => Err(mismatch(&value, "timestamp")),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(&self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}
