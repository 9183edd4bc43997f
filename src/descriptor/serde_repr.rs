//! JSON representation of descriptors, for schema documents.
//!
//! ```json
//! {
//!   "Theme":  { "props": [ { "json": "name", "typ": "string" },
//!                          { "json": "colors", "typ": { "ref": "Colors" } } ],
//!               "additional": false },
//!   "Colors": { "props": [ { "json": "sideBar.background", "js": "sideBarBackground",
//!                            "typ": { "unionMembers": ["undefined", "string"] } } ],
//!               "additional": false }
//! }
//! ```
//!
//! `false` is the reject marker and `true` is `any`. A field without `js`
//! uses its JSON key on both sides.
//!
//! Loading walks the document with a map visitor rather than trying each shape
//! in turn, so an error points at the offending node, e.g.
//! `Theme.props[1].typ.unionMembers[0]`.
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Descriptor, Field};

const KEYWORDS: &[&str] = &["any", "null", "undefined", "string", "boolean", "number", "date", "never"];
const SHAPE_KEYS: &[&str] = &["ref", "props", "additional", "arrayItems", "unionMembers", "enum", "literal"];

#[derive(Deserialize)]
struct RawField {
    json: String,
    #[serde(default)]
    js: Option<String>,
    typ: Descriptor,
}

fn keyword(s: &str) -> Option<Descriptor> {
    Some(match s {
        "any" => Descriptor::ANY,
        "null" => Descriptor::NULL,
        "undefined" => Descriptor::UNDEFINED,
        "string" => Descriptor::STRING,
        "boolean" => Descriptor::BOOLEAN,
        "number" => Descriptor::NUMBER,
        "date" => Descriptor::Date,
        "never" => Descriptor::Never,
        _ => return None,
    })
}

// ————————————————————————————————————————————————————————————————————————————
// SERIALIZE
// ————————————————————————————————————————————————————————————————————————————

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Descriptor::Primitive(p) => serializer.serialize_str(p.name()),
            Descriptor::Date => serializer.serialize_str("date"),
            Descriptor::Never => serializer.serialize_bool(false),
            Descriptor::Reference(name) => single_key(serializer, "ref", name),
            Descriptor::Object(obj) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("props", obj.fields())?;
                map.serialize_entry("additional", obj.additional())?;
                map.end()
            }
            Descriptor::Array(item) => single_key(serializer, "arrayItems", item),
            Descriptor::Union(members) => single_key(serializer, "unionMembers", members),
            Descriptor::Enum(cases) => single_key(serializer, "enum", cases),
            Descriptor::Literal(value) => single_key(serializer, "literal", value),
        }
    }
}

fn single_key<S, T>(serializer: S, key: &str, value: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

/// `js` is omitted when it equals `json`.
impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let renamed = self.js != self.json;
        let mut st = serializer.serialize_struct("Field", if renamed { 3 } else { 2 })?;
        st.serialize_field("json", &self.json)?;
        if renamed {
            st.serialize_field("js", &self.js)?;
        }
        st.serialize_field("typ", &self.ty)?;
        st.end()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DESERIALIZE
// ————————————————————————————————————————————————————————————————————————————

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DescriptorVisitor)
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawField::deserialize(deserializer)?;
        let js = raw.js.unwrap_or_else(|| raw.json.clone());
        Ok(Field::new(raw.json, js, raw.typ))
    }
}

struct DescriptorVisitor;

impl<'de> Visitor<'de> for DescriptorVisitor {
    type Value = Descriptor;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a descriptor keyword, `true`/`false`, or a descriptor object")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Descriptor, E> {
        Ok(if v { Descriptor::ANY } else { Descriptor::Never })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Descriptor, E> {
        keyword(v).ok_or_else(|| E::unknown_variant(v, KEYWORDS))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Descriptor, A::Error> {
        let mut shape: Option<Descriptor> = None;
        let mut props: Option<Vec<Field>> = None;
        let mut additional: Option<Descriptor> = None;
        while let Some(key) = map.next_key::<String>()? {
            let parsed = match key.as_str() {
                "props" => {
                    props = Some(map.next_value()?);
                    continue;
                }
                "additional" => {
                    additional = Some(map.next_value()?);
                    continue;
                }
                "ref" => Descriptor::Reference(map.next_value()?),
                "arrayItems" => Descriptor::array(map.next_value()?),
                "unionMembers" => Descriptor::Union(map.next_value()?),
                "enum" => Descriptor::Enum(map.next_value()?),
                "literal" => Descriptor::Literal(map.next_value()?),
                other => return Err(de::Error::unknown_field(other, SHAPE_KEYS)),
            };
            if shape.replace(parsed).is_some() {
                return Err(de::Error::custom("a descriptor object takes exactly one shape key"));
            }
        }
        match (shape, props, additional) {
            (None, Some(props), additional) => Ok(Descriptor::object(props, additional.unwrap_or(Descriptor::ANY))),
            (Some(shape), None, None) => Ok(shape),
            (None, None, _) => Err(de::Error::custom(
                "expected one of `ref`, `props`, `arrayItems`, `unionMembers`, `enum`, `literal`",
            )),
            _ => Err(de::Error::custom("`props`/`additional` cannot be combined with another shape key")),
        }
    }
}
