use super::config;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// The canonical, in-memory value of a property. Every variant normalizes
/// its raw input into one of these.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(NaiveDateTime),
    Translation(Translation),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, `false`, zero, empty containers, and the strings `""` and
    /// `"0"`.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Str(s) => s.is_empty() || s == "0",
            Value::DateTime(_) => false,
            Value::Translation(t) => t.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    /// Empty strings are treated like null by most setters.
    pub fn is_null_or_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Pick the entry for one locale out of a locale-keyed value.
    pub fn get_lang(&self, lang: &str) -> Option<Value> {
        match self {
            Value::Map(m) => m.get(lang).cloned(),
            Value::Translation(t) => t.get(lang).map(Value::from),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }

    /// JSON, pretty printed. Used wherever a non-scalar has to be put in a
    /// form field.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", if *b { "1" } else { "" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::DateTime(dt) => {
                write!(f, "{}", dt.format(config::DEFAULT_DATETIME_FORMAT))
            }
            Value::Translation(t) => write!(f, "{t}"),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_unit(),
            Value::Bool(b) => s.serialize_bool(*b),
            Value::Int(i) => s.serialize_i64(*i),
            Value::Float(n) => s.serialize_f64(*n),
            Value::Str(v) => s.serialize_str(v),
            // ATOM
            Value::DateTime(dt) => s.serialize_str(&dt.and_utc().to_rfc3339()),
            Value::Translation(t) => t.values.serialize(s),
            Value::List(l) => l.serialize(s),
            Value::Map(m) => m.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(d).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(a) => {
                Value::List(a.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(o) => Value::Map(
                o.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(val: &Value) -> Self {
        match val {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(n) => serde_json::Value::from(*n),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.and_utc().to_rfc3339())
            }
            Value::Translation(t) => serde_json::Value::Object(
                t.values
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v.as_str())))
                    .collect(),
            ),
            Value::List(l) => {
                serde_json::Value::Array(l.iter().map(Into::into).collect())
            }
            Value::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
            ),
        }
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

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Translation> for Value {
    fn from(t: Translation) -> Self {
        Value::Translation(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A translatable text unit; one string per locale.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    lang: String,
    values: IndexMap<String, String>,
}

impl Default for Translation {
    fn default() -> Self {
        Translation {
            lang: config::DEFAULT_LANG.to_string(),
            values: IndexMap::new(),
        }
    }
}

impl Translation {
    pub fn new(text: impl Into<String>) -> Self {
        let mut t = Translation::default();
        t.set(config::DEFAULT_LANG, text);
        t
    }

    /// Change the locale used by `Display`.
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.values.get(lang).map(String::as_str)
    }

    pub fn set(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.values.insert(lang.into(), text.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(String::is_empty)
    }

    pub fn values(&self) -> &IndexMap<String, String> {
        &self.values
    }
}

impl Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self
            .get(&self.lang)
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.values.values().map(String::as_str).find(|s| !s.is_empty())
            })
            .unwrap_or("");
        write!(f, "{text}")
    }
}

impl From<&str> for Translation {
    fn from(s: &str) -> Self {
        Translation::new(s)
    }
}

impl From<String> for Translation {
    fn from(s: String) -> Self {
        Translation::new(s)
    }
}

impl From<IndexMap<String, String>> for Translation {
    fn from(values: IndexMap<String, String>) -> Self {
        Translation {
            values,
            ..Default::default()
        }
    }
}

impl TryFrom<&serde_json::Value> for Translation {
    type Error = crate::errors::PropertyError;

    /// Either a plain string (default locale) or a `{lang: text}` object.
    fn try_from(json: &serde_json::Value) -> crate::errors::Result<Self> {
        match json {
            serde_json::Value::String(s) => Ok(Translation::new(s.as_str())),
            serde_json::Value::Null => Ok(Translation::default()),
            serde_json::Value::Object(o) => {
                let mut t = Translation::default();
                for (lang, text) in o {
                    let text = match text {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    t.set(lang.as_str(), text);
                }
                Ok(t)
            }
            other => Err(crate::errors::PropertyError::invalid(format!(
                "{other} can not be used as a translation"
            ))),
        }
    }
}

/// How a `multiple` property splits, joins and bounds its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultipleOptions {
    pub separator: String,
    /// 0 means no lower bound.
    pub min: usize,
    /// 0 means no upper bound.
    pub max: usize,
}

impl Default for MultipleOptions {
    fn default() -> Self {
        MultipleOptions {
            separator: config::DEFAULT_SEPARATOR.to_string(),
            min: 0,
            max: 0,
        }
    }
}

/// The coarse kind of bind parameter a storage layer should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdoType {
    Str,
    Bool,
    Int,
}
