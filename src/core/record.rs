// fraglog - core/record.rs
//
// The per-line output unit: severity, message, and an ordered bag of typed
// attributes. Pure data plus serde impls; writing lives in core::export.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

// =============================================================================
// Level
// =============================================================================

/// Record severity. Only full-match summaries with real players are elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Level {
    #[default]
    Info,
    Warn,
}

impl Level {
    pub fn label(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// A typed attribute value. Groups nest further attributes in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Int(i64),
    Time(DateTime<Utc>),
    Group(Vec<Attr>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::Str(value.into()))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self::new(key, Value::Group(attrs))
    }
}

/// First attribute named `key` in `attrs`.
pub fn find<'a>(attrs: &'a [Attr], key: &str) -> Option<&'a Value> {
    attrs.iter().find(|a| a.key == key).map(|a| &a.value)
}

// =============================================================================
// Record
// =============================================================================

/// One emitted record. Every input line produces exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// When the record was built.
    pub time: DateTime<Utc>,
    pub level: Level,
    /// The colour-normalised console line.
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: message.into(),
            attrs,
        }
    }

    /// Top-level attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&Value> {
        find(&self.attrs, key)
    }
}

// -----------------------------------------------------------------------------
// Serialisation: { "time", "level", "msg", <attrs...> }
// -----------------------------------------------------------------------------

fn rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Serialises a slice of attributes as a JSON object, keeping their order.
struct AttrMap<'a>(&'a [Attr]);

impl Serialize for AttrMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for attr in self.0 {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Time(t) => serializer.serialize_str(&rfc3339(t)),
            Value::Group(attrs) => AttrMap(attrs).serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.attrs.len()))?;
        map.serialize_entry("time", &rfc3339(&self.time))?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("msg", &self.message)?;
        for attr in &self.attrs {
            map.serialize_entry(&attr.key, &attr.value)?;
        }
        map.end()
    }
}
