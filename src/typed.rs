//! In-memory typed values, and the serde bridge to concrete Rust types.
//!
//! Decoding yields a [`Typed`] whose object keys are the internal (`js`) keys
//! and whose dates are real [`DateTime`]s. [`from_typed`] / [`to_typed`] move
//! between a `Typed` and any `serde` type, so a caller can validate with a
//! descriptor and then land in a plain struct.
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Typed {
    /// Not present in the source. Dropped from objects when lowered to JSON.
    Absent,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Typed>),
    Object(IndexMap<String, Typed>),
}

pub(crate) static ABSENT: Typed = Typed::Absent;

/// Runtime kind of a value, compared against primitive descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Date,
    Array,
    Object,
}

impl Typed {
    pub fn kind(&self) -> Kind {
        match self {
            Typed::Absent => Kind::Undefined,
            Typed::Null => Kind::Null,
            Typed::Bool(_) => Kind::Boolean,
            Typed::Number(_) => Kind::Number,
            Typed::String(_) => Kind::String,
            Typed::Date(_) => Kind::Date,
            Typed::Array(_) => Kind::Array,
            Typed::Object(_) => Kind::Object,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Typed::Absent)
    }

    /// Object member lookup. Missing keys and non-objects give `Absent`.
    pub fn get(&self, key: &str) -> &Typed {
        match self {
            Typed::Object(map) => map.get(key).unwrap_or(&ABSENT),
            _ => &ABSENT,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Typed::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Typed::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Lift a parsed JSON document. Strings stay strings; only the engine
    /// turns them into dates, under a `Date` descriptor.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Typed::Null,
            Value::Bool(b) => Typed::Bool(*b),
            Value::Number(n) => Typed::Number(n.clone()),
            Value::String(s) => Typed::String(s.clone()),
            Value::Array(xs) => Typed::Array(xs.iter().map(Typed::from_json).collect()),
            Value::Object(map) => Typed::Object(
                map.iter().map(|(k, v)| (k.clone(), Typed::from_json(v))).collect(),
            ),
        }
    }

    /// Lower to JSON. Absent object members are omitted, absent array slots
    /// become `null`, dates render as RFC 3339 UTC with milliseconds.
    pub fn into_json(self) -> Value {
        match self {
            Typed::Absent | Typed::Null => Value::Null,
            Typed::Bool(b) => Value::Bool(b),
            Typed::Number(n) => Value::Number(n),
            Typed::String(s) => Value::String(s),
            Typed::Date(d) => Value::String(format_date(&d)),
            Typed::Array(xs) => Value::Array(xs.into_iter().map(Typed::into_json).collect()),
            Typed::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    if v.is_absent() { continue; }
                    out.insert(k, v.into_json());
                }
                Value::Object(out)
            }
        }
    }
}

impl From<Value> for Typed {
    fn from(value: Value) -> Self {
        Typed::from_json(&value)
    }
}

impl From<&Value> for Typed {
    fn from(value: &Value) -> Self {
        Typed::from_json(value)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DATES
// ————————————————————————————————————————————————————————————————————————————

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS[.fff]` without offset
/// (read as UTC) and bare `YYYY-MM-DD` (UTC midnight).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    use chrono::{NaiveDate, NaiveDateTime};
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(d.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    None
}

pub fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ————————————————————————————————————————————————————————————————————————————
// SERDE BRIDGE
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize a decoded value into `T`, with the JSON path of the first
/// mismatch in the error.
pub fn from_typed<T: DeserializeOwned>(value: Typed) -> Result<T, crate::error::Error> {
    let json = value.into_json();
    serde_path_to_error::deserialize::<_, T>(json).map_err(|err| {
        crate::error::Error::Bridge {
            path: err.path().to_string(),
            message: err.into_inner().to_string(),
        }
    })
}

/// Serialize `T` into a typed value ready for `encode`. Date-typed fields come
/// through as strings; the engine accepts parseable strings under `Date`.
pub fn to_typed<T: Serialize>(value: &T) -> Result<Typed, crate::error::Error> {
    let json = serde_json::to_value(value)?;
    Ok(Typed::from_json(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_members_are_dropped_when_lowering() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Typed::String("x".into()));
        map.insert("b".to_string(), Typed::Absent);
        map.insert("c".to_string(), Typed::Array(vec![Typed::Absent, Typed::Bool(true)]));
        let json = Typed::Object(map).into_json();
        assert_eq!(json, json!({ "a": "x", "c": [null, true] }));
    }

    #[test]
    fn get_on_missing_key_is_absent() {
        let t = Typed::from_json(&json!({ "a": 1 }));
        assert!(t.get("b").is_absent());
        assert!(Typed::Null.get("a").is_absent());
        assert_eq!(t.get("a").kind(), Kind::Number);
    }

    #[test]
    fn date_formats() {
        let d = parse_date("2024-03-01T10:20:30+02:00").unwrap();
        assert_eq!(format_date(&d), "2024-03-01T08:20:30.000Z");
        let d = parse_date("2024-03-01").unwrap();
        assert_eq!(format_date(&d), "2024-03-01T00:00:00.000Z");
        let d = parse_date("2024-03-01T10:20:30.5").unwrap();
        assert_eq!(format_date(&d), "2024-03-01T10:20:30.500Z");
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-45").is_none());
    }

    #[test]
    fn bridge_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Inner { n: u32 }
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Outer { inner: Inner }

        let t = Typed::from_json(&json!({ "inner": { "n": "nope" } }));
        let err = from_typed::<Outer>(t).unwrap_err();
        match err {
            crate::error::Error::Bridge { path, .. } => assert_eq!(path, "inner.n"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
