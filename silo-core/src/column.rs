use crate::Value;
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static STRING_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\sA-Za-z0-9_-]*$").expect("valid pattern"));
static CODE_STRING_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\s()A-Za-z0-9\-_.+*\\/:='{},<>"^\[\]]*$"#).expect("valid pattern")
});
static DATETIME_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.:/]*$").expect("valid pattern"));

/// The closed set of scalar column kinds.
///
/// Each variant fixes the DDL type text, the native value kind, a validation
/// predicate and the normalization applied before a value is embedded into
/// generated SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    /// Bounded text restricted to letters, digits, underscore, hyphen and
    /// whitespace.
    String(u32),
    /// Bounded text with the wider character class needed by code and
    /// formula snippets: parentheses, brackets, braces, operators, colon,
    /// comma, quotes, angle brackets, slashes, caret.
    CodeString(u32),
    Boolean,
    DateTime,
    /// Integer column referencing the target table's `id`.
    ForeignKey(&'static str),
}

impl ColumnType {
    /// DDL type text, used verbatim when rendering column definitions.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Integer => "integer".into(),
            ColumnType::Float => "float".into(),
            ColumnType::String(length) | ColumnType::CodeString(length) => {
                format!("varchar({})", length)
            }
            ColumnType::Boolean => "boolean".into(),
            ColumnType::DateTime => "timestamp".into(),
            ColumnType::ForeignKey(target) => format!("integer references {} (id)", target),
        }
    }

    /// Advisory check that a value fits this column. Callers may bypass it;
    /// `format` does not require it to have passed.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            ColumnType::Integer | ColumnType::ForeignKey(..) => {
                matches!(value, Value::Integer(Some(..)))
            }
            ColumnType::Float => matches!(value, Value::Float(Some(..))),
            ColumnType::Boolean => matches!(value, Value::Boolean(Some(..))),
            ColumnType::String(length) => match value {
                Value::Varchar(Some(text)) => {
                    text.chars().count() <= *length as usize && STRING_CLASS.is_match(text)
                }
                _ => false,
            },
            ColumnType::CodeString(length) => match value {
                Value::Varchar(Some(text)) => {
                    text.chars().count() <= *length as usize && CODE_STRING_CLASS.is_match(text)
                }
                _ => false,
            },
            ColumnType::DateTime => match value {
                Value::Timestamp(Some(..)) => DATETIME_CLASS.is_match(&value.to_string()),
                _ => false,
            },
        }
    }

    /// The value normalized to the bare text that goes inside generated SQL.
    /// Quoting and escaping of string-like kinds happen at the writer seam.
    ///
    /// Timestamps lose their sub-second fraction; non-string input reaching
    /// a string column is JSON-serialized first.
    pub fn format(&self, value: &Value) -> String {
        match self {
            ColumnType::String(..) | ColumnType::CodeString(..) => match value {
                Value::Varchar(Some(text)) => text.clone(),
                other => serde_json::Value::from(other).to_string(),
            },
            _ => value.to_string(),
        }
    }
}

/// A single named, typed field descriptor within an entity schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
}

impl Column {
    pub fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            primary_key: false,
            required: true,
            unique: false,
            default: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// DDL fragment for this column. A primary key always becomes an
    /// auto-incrementing identity column, whatever its declared type.
    pub fn write_ddl(&self, out: &mut String) {
        if self.primary_key {
            let _ = write!(out, "{} serial primary key", self.name);
        } else if self.unique {
            let _ = write!(out, "{} {} UNIQUE NOT NULL", self.name, self.ty.sql_type());
        } else {
            let _ = write!(out, "{} {}", self.name, self.ty.sql_type());
        }
    }

    pub fn ddl(&self) -> String {
        let mut out = String::new();
        self.write_ddl(&mut out);
        out
    }
}
