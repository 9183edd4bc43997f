//! Human-readable rendering of descriptors and validation failures.
//!
//! Nothing in here feeds back into the transform; it only shapes messages.
use std::fmt;

use thiserror::Error;

use crate::descriptor::Descriptor;
use crate::typed::Typed;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// The one failure the engine produces.
///
/// `value` is kept for the message only; match on `key`/`parent`/`path`
/// rather than on the rendered text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "Invalid value{}{}. Expected {expected} but got {}",
    key_clause(.key),
    parent_clause(.parent),
    render_value(.value)
)]
pub struct ValidationError {
    /// Key being transformed when the mismatch happened, if any.
    pub key: Option<String>,
    /// Name of the enclosing registered descriptor, if any.
    pub parent: Option<String>,
    /// Pretty form of the expected descriptor.
    pub expected: String,
    pub value: Typed,
    /// Location from the document root, e.g. `colors.primary` or `items[2]`.
    pub path: Path,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<Segment>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ValidationError {
    pub(crate) fn new(expected: &Descriptor, value: &Typed, key: &str, parent: &str, path: &Path) -> Self {
        Self {
            key: (!key.is_empty()).then(|| key.to_string()),
            parent: (!parent.is_empty()).then(|| parent.to_string()),
            expected: pretty_type_name(expected),
            value: value.clone(),
            path: path.clone(),
        }
    }
}

fn key_clause(key: &Option<String>) -> String {
    key.as_ref().map(|k| format!(" for key \"{k}\"")).unwrap_or_default()
}

fn parent_clause(parent: &Option<String>) -> String {
    parent.as_ref().map(|p| format!(" on {p}")).unwrap_or_default()
}

/// Rules:
/// - `[undefined, T]` → `an optional T`
/// - other unions and enum candidate sets → `one of [A, B, …]`
/// - literals render as themselves, references as their name
/// - everything else as its kind name
pub fn pretty_type_name(d: &Descriptor) -> String {
    if let Some(inner) = d.as_optional() {
        return format!("an optional {}", pretty_type_name(inner));
    }
    match d {
        Descriptor::Union(members) => one_of(members.iter().map(pretty_type_name)),
        Descriptor::Enum(cases) => one_of(cases.iter().cloned()),
        Descriptor::Literal(value) => value.clone(),
        Descriptor::Reference(name) => name.clone(),
        Descriptor::Primitive(p) => p.name().to_string(),
        Descriptor::Never => "never".to_string(),
        Descriptor::Object(_) => "object".to_string(),
        Descriptor::Array(_) => "array".to_string(),
        Descriptor::Date => "Date".to_string(),
    }
}

fn one_of(names: impl Iterator<Item = String>) -> String {
    format!("one of [{}]", names.collect::<Vec<_>>().join(", "))
}

/// Compact JSON, or `undefined` for an absent value.
pub fn render_value(value: &Typed) -> String {
    match value {
        Typed::Absent => "undefined".to_string(),
        other => other.clone().into_json().to_string(),
    }
}

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }
    pub(crate) fn push(&mut self, seg: Segment) {
        self.0.push(seg);
    }
    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Key(k) if i == 0 => f.write_str(k)?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(ix) => write!(f, "[{ix}]")?,
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
