use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

/// A runtime argument of a derived or string query.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    LocalDateTime(NaiveDateTime),
    List(Vec<Parameter>),
}

impl Parameter {
    pub fn is_null(&self) -> bool {
        matches!(self, Parameter::Null)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Parameter::Text(_))
    }

    /// Elements of a list; any other value is a list of itself.
    pub fn to_list(&self) -> Vec<Parameter> {
        match self {
            Parameter::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Canonical text form: ISO-8601 for dates and times, JSON-like arrays
    /// for lists.
    pub fn to_query_string(&self) -> String {
        match self {
            Parameter::Null => "null".to_string(),
            Parameter::Bool(b) => b.to_string(),
            Parameter::Int(i) => i.to_string(),
            Parameter::Float(f) => f.to_string(),
            Parameter::Text(s) => s.clone(),
            Parameter::Uuid(u) => u.hyphenated().to_string(),
            Parameter::Date(d) => d.format("%Y-%m-%d").to_string(),
            Parameter::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Parameter::LocalDateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Parameter::List(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| format!("\"{}\"", escape_quotes(&item.to_query_string())))
                    .collect();
                format!("[{}]", rendered.join(","))
            }
        }
    }

    /// JSON form used inside query DSL documents.
    pub fn to_json(&self) -> Value {
        match self {
            Parameter::Null => Value::Null,
            Parameter::Bool(b) => Value::Bool(*b),
            Parameter::Int(i) => Value::from(*i),
            Parameter::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Parameter::List(items) => Value::Array(items.iter().map(Parameter::to_json).collect()),
            other => Value::String(other.to_query_string()),
        }
    }

    /// Strings stay text; dates are not guessed.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Parameter::Null,
            Value::Bool(b) => Parameter::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Parameter::Int(i),
                None => Parameter::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Parameter::Text(s.clone()),
            Value::Array(items) => Parameter::List(items.iter().map(Parameter::from_json).collect()),
            Value::Object(_) => Parameter::Text(value.to_string()),
        }
    }
}

pub(crate) fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Parameter::Bool(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Int(value.into())
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Int(value)
    }
}

impl From<u32> for Parameter {
    fn from(value: u32) -> Self {
        Parameter::Int(value.into())
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::Text(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::Text(value)
    }
}

impl From<Uuid> for Parameter {
    fn from(value: Uuid) -> Self {
        Parameter::Uuid(value)
    }
}

impl From<NaiveDate> for Parameter {
    fn from(value: NaiveDate) -> Self {
        Parameter::Date(value)
    }
}

impl From<DateTime<Utc>> for Parameter {
    fn from(value: DateTime<Utc>) -> Self {
        Parameter::DateTime(value)
    }
}

impl From<NaiveDateTime> for Parameter {
    fn from(value: NaiveDateTime) -> Self {
        Parameter::LocalDateTime(value)
    }
}

impl<T: Into<Parameter>> From<Vec<T>> for Parameter {
    fn from(values: Vec<T>) -> Self {
        Parameter::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Parameter>> From<Option<T>> for Parameter {
    fn from(value: Option<T>) -> Self {
        value.map_or(Parameter::Null, Into::into)
    }
}
