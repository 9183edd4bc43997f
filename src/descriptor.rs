//! Type descriptors: the declarative description of an expected value shape.
//!
//! Descriptors are plain immutable data. Cycles (self or mutual recursion) are
//! expressed through [`Descriptor::Reference`], which is looked up in the
//! [`Registry`](crate::registry::Registry) every time it is dispatched, so a
//! schema can name descriptors that are registered later.
pub mod serde_repr;

use std::sync::atomic::{AtomicU64, Ordering};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Primitive(Primitive),
    /// Unconditional reject. Used as `additional` to forbid unknown keys.
    Never,
    Reference(String),
    Object(ObjectDescriptor),
    Array(Box<Descriptor>),
    /// Ordered; the first member that accepts the value wins.
    Union(Vec<Descriptor>),
    Enum(Vec<String>),
    /// Only used to render expected-value sets in diagnostics.
    Literal(String),
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Accepts anything, no validation.
    Any,
    Null,
    /// Accepts only an absent value; `[Undefined, T]` is an optional `T`.
    Undefined,
    String,
    Boolean,
    Number,
}

/// Identity of one object descriptor, used to key the property-map cache.
///
/// Clones keep the id of the original. Fields are only reachable through
/// read-only accessors, so a clone can never diverge from the map cached
/// under its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    id: ObjectId,
    fields: Vec<Field>,
    additional: Box<Descriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Key in the JSON document.
    pub json: String,
    /// Key in the typed value.
    pub js: String,
    pub ty: Descriptor,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(0);

impl ObjectId {
    fn fresh() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl ObjectDescriptor {
    pub fn new(fields: Vec<Field>, additional: Descriptor) -> Self {
        Self { id: ObjectId::fresh(), fields, additional: Box::new(additional) }
    }
    pub fn id(&self) -> ObjectId {
        self.id
    }
    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
    /// Descriptor applied to every undeclared key.
    pub fn additional(&self) -> &Descriptor {
        &self.additional
    }
}

// Structural equality; identity only matters to the cache.
impl PartialEq for ObjectDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.additional == other.additional
    }
}

impl Field {
    pub fn new(json: impl Into<String>, js: impl Into<String>, ty: Descriptor) -> Self {
        Self { json: json.into(), js: js.into(), ty }
    }
    /// Same key on both sides.
    pub fn same(key: impl Into<String>, ty: Descriptor) -> Self {
        let key = key.into();
        Self { json: key.clone(), js: key, ty }
    }
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Any => "any",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Number => "number",
        }
    }
}

impl Descriptor {
    pub const ANY: Descriptor = Descriptor::Primitive(Primitive::Any);
    pub const NULL: Descriptor = Descriptor::Primitive(Primitive::Null);
    pub const UNDEFINED: Descriptor = Descriptor::Primitive(Primitive::Undefined);
    pub const STRING: Descriptor = Descriptor::Primitive(Primitive::String);
    pub const BOOLEAN: Descriptor = Descriptor::Primitive(Primitive::Boolean);
    pub const NUMBER: Descriptor = Descriptor::Primitive(Primitive::Number);

    pub fn reference(name: impl Into<String>) -> Self {
        Descriptor::Reference(name.into())
    }
    pub fn object(fields: Vec<Field>, additional: Descriptor) -> Self {
        Descriptor::Object(ObjectDescriptor::new(fields, additional))
    }
    /// Object with no declared fields, every key governed by `additional`.
    pub fn map_of(additional: Descriptor) -> Self {
        Self::object(Vec::new(), additional)
    }
    pub fn array(item: Descriptor) -> Self {
        Descriptor::Array(Box::new(item))
    }
    pub fn union(members: impl IntoIterator<Item = Descriptor>) -> Self {
        Descriptor::Union(members.into_iter().collect())
    }
    /// `[undefined, ty]`
    pub fn optional(ty: Descriptor) -> Self {
        Descriptor::Union(vec![Self::UNDEFINED, ty])
    }
    pub fn enumeration<I, S>(cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Descriptor::Enum(cases.into_iter().map(Into::into).collect())
    }
    pub fn literal(value: impl Into<String>) -> Self {
        Descriptor::Literal(value.into())
    }

    /// Matches the shape `[undefined, T]` and returns `T`.
    pub fn as_optional(&self) -> Option<&Descriptor> {
        match self {
            Descriptor::Union(members) if members.len() == 2 && members[0] == Self::UNDEFINED => {
                Some(&members[1])
            }
            _ => None,
        }
    }

    /// Walks the descriptor tree (not following references) and calls `f` on
    /// every object descriptor.
    pub fn visit_objects<'a>(&'a self, f: &mut impl FnMut(&'a ObjectDescriptor)) {
        match self {
            Descriptor::Object(obj) => {
                f(obj);
                for field in &obj.fields {
                    field.ty.visit_objects(f);
                }
                obj.additional.visit_objects(f);
            }
            Descriptor::Array(item) => item.visit_objects(f),
            Descriptor::Union(members) => {
                for m in members { m.visit_objects(f); }
            }
            Descriptor::Primitive(_)
            | Descriptor::Never
            | Descriptor::Reference(_)
            | Descriptor::Enum(_)
            | Descriptor::Literal(_)
            | Descriptor::Date => {}
        }
    }

    /// Names of every reference reachable without following references.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Descriptor::Reference(name) => out.push(name),
            Descriptor::Object(obj) => {
                for field in &obj.fields {
                    field.ty.collect_references(out);
                }
                obj.additional.collect_references(out);
            }
            Descriptor::Array(item) => item.collect_references(out),
            Descriptor::Union(members) => {
                for m in members { m.collect_references(out); }
            }
            _ => {}
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
