use std::fmt::{self, Display};
use time::{Date, Month, PrimitiveDateTime, Time};

/// A single native value as held by an entity field or a query filter.
///
/// Each variant carries an `Option` so a typed slot can still be null, the
/// same way a nullable column keeps its type.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Integer(Option<i64>),
    Float(Option<f64>),
    Varchar(Option<String>),
    Timestamp(Option<PrimitiveDateTime>),
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Integer(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    /// Truthiness used to decide which columns take part in an UPDATE SET
    /// clause: null is falsy, numbers are truthy when non-zero, strings when
    /// non-empty, timestamps always.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(v) => v.unwrap_or(false),
            Value::Integer(v) => v.is_some_and(|v| v != 0),
            Value::Float(v) => v.is_some_and(|v| v != 0.0),
            Value::Varchar(v) => v.as_ref().is_some_and(|v| !v.is_empty()),
            Value::Timestamp(v) => v.is_some(),
        }
    }
}

/// Bare text form of the value, as it reads inside generated SQL before any
/// quoting: `null` for nulls, `true`/`false`, plain digits, the string
/// itself, timestamps without their fractional seconds.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(None)
            | Value::Integer(None)
            | Value::Float(None)
            | Value::Varchar(None)
            | Value::Timestamp(None) => f.write_str("null"),
            Value::Boolean(Some(v)) => write!(f, "{}", v),
            Value::Integer(Some(v)) => write!(f, "{}", v),
            Value::Float(Some(v)) => write!(f, "{}", v),
            Value::Varchar(Some(v)) => f.write_str(v),
            Value::Timestamp(Some(v)) => f.write_str(&format_timestamp(v)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(Some(value))
    }
}
impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(Some(value.into()))
    }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(Some(value))
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(Some(value))
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Varchar(Some(value))
    }
}
impl From<PrimitiveDateTime> for Value {
    fn from(value: PrimitiveDateTime) -> Self {
        Value::Timestamp(Some(value))
    }
}
impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// JSON inputs map onto the native kinds; arrays and objects are serialized
/// to their JSON text and treated as strings from that point on.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Value::Null,
            Json::Bool(v) => v.into(),
            Json::Number(n) => match n.as_i64() {
                Some(v) => v.into(),
                None => Value::Float(n.as_f64()),
            },
            Json::String(v) => Value::Varchar(Some(v)),
            composite @ (Json::Array(..) | Json::Object(..)) => {
                Value::Varchar(Some(composite.to_string()))
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Value::Null
            | Value::Boolean(None)
            | Value::Integer(None)
            | Value::Float(None)
            | Value::Varchar(None)
            | Value::Timestamp(None) => Json::Null,
            Value::Boolean(Some(v)) => (*v).into(),
            Value::Integer(Some(v)) => (*v).into(),
            Value::Float(Some(v)) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Varchar(Some(v)) => v.clone().into(),
            Value::Timestamp(Some(v)) => format_timestamp(v).into(),
        }
    }
}

/// Renders `YYYY-MM-DD hh:mm:ss`, dropping any sub-second fraction.
pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        value.year(),
        u8::from(value.month()),
        value.day(),
        value.hour(),
        value.minute(),
        value.second()
    )
}

/// Parses the store's `YYYY-MM-DD hh:mm:ss[.fraction]` text form. The
/// fraction is discarded, matching the formatting side.
pub fn parse_timestamp(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.split('.').next().unwrap_or(text).trim();
    let (date_part, time_part) = text.split_once(' ')?;
    let mut parts = date_part.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;
    let mut parts = time_part.splitn(3, ':');
    let hour: u8 = parts.next()?.parse().ok()?;
    let minute: u8 = parts.next()?.parse().ok()?;
    let second: u8 = parts.next()?.parse().ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}
