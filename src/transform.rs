//! The transform engine.
//!
//! One recursive walk serves both directions. Decoding turns JSON keys into
//! internal keys and date strings into dates; encoding does the reverse. The
//! only per-direction difference is which property map an object uses and
//! what a `Date` produces.
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::descriptor::{Descriptor, ObjectDescriptor, ObjectId, Primitive};
use crate::diagnostics::{Path, Segment, ValidationError};
use crate::registry::{PropertyMap, Registry};
use crate::typed::{self, ABSENT, Kind, Typed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// JSON → typed
    Decode,
    /// typed → JSON
    Encode,
}

type Result<T> = std::result::Result<T, ValidationError>;

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

impl Registry {
    /// Decode against the registered descriptor `name`.
    pub fn decode(&self, json: &Value, name: &str) -> Result<Typed> {
        self.decode_with(json, &Descriptor::reference(name))
    }

    /// Encode against the registered descriptor `name`.
    pub fn encode(&self, value: &Typed, name: &str) -> Result<Value> {
        self.encode_with(value, &Descriptor::reference(name))
    }

    pub fn decode_with(&self, json: &Value, descriptor: &Descriptor) -> Result<Typed> {
        self.transform(&Typed::from_json(json), descriptor, Direction::Decode)
    }

    pub fn encode_with(&self, value: &Typed, descriptor: &Descriptor) -> Result<Value> {
        self.transform(value, descriptor, Direction::Encode).map(Typed::into_json)
    }

    /// Run the walk in either direction without converting at the edges.
    pub fn transform(&self, value: &Typed, descriptor: &Descriptor, direction: Direction) -> Result<Typed> {
        let mut walker = Walker { registry: self, direction, path: Path::root(), scratch: HashMap::new() };
        walker.transform(value, descriptor, "", "")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// WALK
// ————————————————————————————————————————————————————————————————————————————

struct Walker<'r> {
    registry: &'r Registry,
    direction: Direction,
    path: Path,
    /// Maps for inline objects the registry does not own; dropped with the walk.
    scratch: HashMap<ObjectId, Arc<PropertyMap>>,
}

impl Walker<'_> {
    fn transform(&mut self, val: &Typed, typ: &Descriptor, key: &str, parent: &str) -> Result<Typed> {
        let registry = self.registry;

        // Chase references, keeping the last name for diagnostics.
        let mut typ = typ;
        let mut name: Option<&str> = None;
        while let Descriptor::Reference(r) = typ {
            match registry.get(r) {
                Some(resolved) => {
                    name = Some(r.as_str());
                    typ = resolved;
                }
                None => {
                    let missing = Descriptor::literal(format!("a registered descriptor named \"{r}\""));
                    return Err(self.invalid(&missing, val, key, parent));
                }
            }
        }

        match typ {
            Descriptor::Primitive(Primitive::Any) => Ok(val.clone()),
            Descriptor::Never => Err(self.invalid(typ, val, key, parent)),
            Descriptor::Primitive(p) => self.transform_primitive(*p, typ, val, key, parent),
            Descriptor::Enum(cases) => match val {
                Typed::String(s) if cases.iter().any(|c| c == s) => Ok(val.clone()),
                _ => Err(self.invalid(typ, val, key, parent)),
            },
            Descriptor::Union(members) => self.transform_union(members, typ, val, key, parent),
            Descriptor::Array(item) => self.transform_array(item, val, key, parent),
            Descriptor::Object(obj) => self.transform_object(obj, name, val, key, parent),
            Descriptor::Date => self.transform_date(val, key, parent),
            // Literals are diagnostic only and references were resolved above.
            Descriptor::Literal(_) | Descriptor::Reference(_) => Err(self.invalid(typ, val, key, parent)),
        }
    }

    fn transform_primitive(&self, p: Primitive, typ: &Descriptor, val: &Typed, key: &str, parent: &str) -> Result<Typed> {
        let ok = match p {
            Primitive::Any => true,
            Primitive::Null => val.kind() == Kind::Null,
            Primitive::Undefined => val.kind() == Kind::Undefined,
            Primitive::String => val.kind() == Kind::String,
            Primitive::Boolean => val.kind() == Kind::Boolean,
            Primitive::Number => val.kind() == Kind::Number,
        };
        if ok { Ok(val.clone()) } else { Err(self.invalid(typ, val, key, parent)) }
    }

    /// First member that accepts the value wins. Member failures are dropped;
    /// if none accepts, one error names the whole union.
    fn transform_union(&mut self, members: &[Descriptor], typ: &Descriptor, val: &Typed, key: &str, parent: &str) -> Result<Typed> {
        for member in members {
            if let Ok(out) = self.transform(val, member, key, parent) {
                return Ok(out);
            }
        }
        Err(self.invalid(typ, val, key, parent))
    }

    fn transform_array(&mut self, item: &Descriptor, val: &Typed, key: &str, parent: &str) -> Result<Typed> {
        let Typed::Array(xs) = val else {
            return Err(self.invalid(&Descriptor::literal("array"), val, key, parent));
        };
        let mut out = Vec::with_capacity(xs.len());
        for (ix, el) in xs.iter().enumerate() {
            out.push(self.descend(Segment::Index(ix), |w| w.transform(el, item, key, parent))?);
        }
        Ok(Typed::Array(out))
    }

    fn transform_object(
        &mut self,
        obj: &ObjectDescriptor,
        name: Option<&str>,
        val: &Typed,
        key: &str,
        parent: &str,
    ) -> Result<Typed> {
        let Typed::Object(map) = val else {
            let expected = Descriptor::literal(name.unwrap_or("object"));
            return Err(self.invalid(&expected, val, key, parent));
        };
        let props = self.property_map(obj);
        let here = name.unwrap_or("");

        let mut out = IndexMap::with_capacity(map.len().max(props.len()));
        for (source, target) in props.iter() {
            let field = &obj.fields()[target.field];
            let v = map.get(source).unwrap_or(&ABSENT);
            let t = self.descend(Segment::Key(source.to_string()), |w| w.transform(v, &field.ty, source, here))?;
            out.insert(target.key.clone(), t);
        }
        for (k, v) in map {
            if props.contains(k) { continue; }
            let t = self.descend(Segment::Key(k.clone()), |w| w.transform(v, obj.additional(), k, here))?;
            out.insert(k.clone(), t);
        }
        Ok(Typed::Object(out))
    }

    fn property_map(&mut self, obj: &ObjectDescriptor) -> Arc<PropertyMap> {
        let direction = self.direction;
        match self.registry.props().get_or_build(obj, direction) {
            Some(map) => map,
            None => Arc::clone(
                self.scratch
                    .entry(obj.id())
                    .or_insert_with(|| Arc::new(PropertyMap::build(obj, direction))),
            ),
        }
    }

    /// Numbers are never dates, even when they look like epoch seconds.
    fn transform_date(&self, val: &Typed, key: &str, parent: &str) -> Result<Typed> {
        let date = match val {
            Typed::Date(d) => Some(*d),
            Typed::String(s) => typed::parse_date(s),
            _ => None,
        };
        let Some(date) = date else {
            return Err(self.invalid(&Descriptor::literal("Date"), val, key, parent));
        };
        Ok(match self.direction {
            Direction::Decode => Typed::Date(date),
            Direction::Encode => Typed::String(typed::format_date(&date)),
        })
    }

    fn descend<T>(&mut self, seg: Segment, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.path.push(seg);
        let out = f(self);
        self.path.pop();
        out
    }

    fn invalid(&self, typ: &Descriptor, val: &Typed, key: &str, parent: &str) -> ValidationError {
        ValidationError::new(typ, val, key, parent, &self.path)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Field;
    use serde_json::json;

    fn open_object() -> Descriptor {
        Descriptor::object(vec![Field::same("id", Descriptor::NUMBER)], Descriptor::ANY)
    }

    fn closed_object() -> Descriptor {
        Descriptor::object(vec![Field::same("id", Descriptor::NUMBER)], Descriptor::Never)
    }

    #[test]
    fn any_passes_everything_through() {
        let reg = Registry::empty();
        for v in [json!(null), json!(1), json!("x"), json!([1, {"a": 2}])] {
            assert_eq!(reg.decode_with(&v, &Descriptor::ANY).unwrap().into_json(), v);
        }
    }

    #[test]
    fn null_requires_exact_null() {
        let reg = Registry::empty();
        assert_eq!(reg.decode_with(&json!(null), &Descriptor::NULL).unwrap(), Typed::Null);
        assert!(reg.decode_with(&json!(0), &Descriptor::NULL).is_err());
        assert!(reg.decode_with(&json!(""), &Descriptor::NULL).is_err());
    }

    #[test]
    fn primitives_match_kind_exactly() {
        let reg = Registry::empty();
        assert!(reg.decode_with(&json!("5"), &Descriptor::NUMBER).is_err());
        assert!(reg.decode_with(&json!(5), &Descriptor::STRING).is_err());
        assert!(reg.decode_with(&json!(1), &Descriptor::BOOLEAN).is_err());
        assert!(reg.decode_with(&json!(true), &Descriptor::BOOLEAN).is_ok());
        assert!(reg.decode_with(&json!(2.5), &Descriptor::NUMBER).is_ok());
    }

    #[test]
    fn additional_properties_pass_through_verbatim() {
        let reg = Registry::empty();
        let out = reg.decode_with(&json!({ "id": 1, "extra": 42, "Weird.Key": [1] }), &open_object()).unwrap();
        assert_eq!(out.into_json(), json!({ "id": 1, "extra": 42, "Weird.Key": [1] }));
    }

    #[test]
    fn additional_properties_can_be_forbidden() {
        let reg = Registry::empty();
        let err = reg.decode_with(&json!({ "id": 1, "extra": 42 }), &closed_object()).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("extra"));
        assert_eq!(err.expected, "never");
        assert_eq!(err.path.to_string(), "extra");
    }

    #[test]
    fn union_first_match_wins() {
        let reg = Registry::empty();
        let u = Descriptor::union([Descriptor::STRING, Descriptor::NUMBER]);
        assert_eq!(reg.decode_with(&json!("5"), &u).unwrap(), Typed::String("5".into()));
        assert_eq!(reg.decode_with(&json!(5), &u).unwrap().into_json(), json!(5));

        // overlapping members: the earlier one decides the shape
        let wide = Descriptor::map_of(Descriptor::ANY);
        let narrow = Descriptor::object(vec![Field::new("a", "renamed", Descriptor::NUMBER)], Descriptor::ANY);
        let first_wide = Descriptor::union([wide.clone(), narrow.clone()]);
        let first_narrow = Descriptor::union([narrow, wide]);
        let input = json!({ "a": 1 });
        assert_eq!(reg.decode_with(&input, &first_wide).unwrap().into_json(), json!({ "a": 1 }));
        assert_eq!(reg.decode_with(&input, &first_narrow).unwrap().into_json(), json!({ "renamed": 1 }));
    }

    #[test]
    fn union_failure_lists_every_member() {
        let reg = Registry::empty();
        let u = Descriptor::union([Descriptor::STRING, Descriptor::NUMBER, Descriptor::NULL]);
        let err = reg.decode_with(&json!(true), &u).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value. Expected one of [string, number, null] but got true");
    }

    #[test]
    fn optional_fields_tolerate_absence_but_not_null() {
        let reg = Registry::empty();
        let d = Descriptor::object(
            vec![
                Field::same("a", Descriptor::optional(Descriptor::STRING)),
                Field::same("b", Descriptor::optional(Descriptor::NUMBER)),
            ],
            Descriptor::Never,
        );
        let out = reg.decode_with(&json!({}), &d).unwrap();
        assert!(out.get("a").is_absent());
        assert!(out.get("b").is_absent());
        assert_eq!(out.into_json(), json!({}));

        let err = reg.decode_with(&json!({ "a": null }), &d).unwrap_err();
        assert_eq!(err.expected, "an optional string");
        assert_eq!(err.value, Typed::Null);
    }

    #[test]
    fn required_field_missing_reports_undefined() {
        let reg = Registry::builder()
            .with("Item", Descriptor::object(vec![Field::same("id", Descriptor::NUMBER)], Descriptor::ANY))
            .build()
            .unwrap();
        let err = reg.decode(&json!({}), "Item").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for key \"id\" on Item. Expected number but got undefined");
    }

    #[test]
    fn enum_rejection_lists_candidates() {
        let reg = Registry::builder()
            .with("Kind", Descriptor::enumeration(["dark", "light"]))
            .build()
            .unwrap();
        assert_eq!(reg.decode(&json!("dark"), "Kind").unwrap(), Typed::String("dark".into()));
        let err = reg.decode(&json!("purple"), "Kind").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dark"), "{msg}");
        assert!(msg.contains("light"), "{msg}");
        assert_eq!(msg, "Invalid value. Expected one of [dark, light] but got \"purple\"");
    }

    #[test]
    fn arrays_fail_fast_with_index_in_path() {
        let reg = Registry::builder()
            .with("Post", Descriptor::object(
                vec![Field::same("tags", Descriptor::array(Descriptor::STRING))],
                Descriptor::Never,
            ))
            .build()
            .unwrap();
        let err = reg.decode(&json!({ "tags": ["a", 5, true] }), "Post").unwrap_err();
        assert_eq!(err.path.to_string(), "tags[1]");
        assert_eq!(err.value.clone().into_json(), json!(5));
        assert_eq!(err.parent.as_deref(), Some("Post"));

        let err = reg.decode(&json!({ "tags": "a" }), "Post").unwrap_err();
        assert_eq!(err.expected, "array");
    }

    #[test]
    fn object_mismatch_names_the_descriptor() {
        let reg = Registry::builder()
            .with("Theme", Descriptor::object(vec![], Descriptor::ANY))
            .build()
            .unwrap();
        for bad in [json!(null), json!([]), json!("x")] {
            let err = reg.decode(&bad, "Theme").unwrap_err();
            assert_eq!(err.expected, "Theme");
        }
        let err = Registry::empty().decode_with(&json!([]), &Descriptor::map_of(Descriptor::ANY)).unwrap_err();
        assert_eq!(err.expected, "object");
    }

    #[test]
    fn recursive_and_mutually_recursive_schemas() {
        let reg = Registry::builder()
            .with("Tree", Descriptor::object(
                vec![
                    Field::same("value", Descriptor::NUMBER),
                    Field::same("children", Descriptor::array(Descriptor::reference("Tree"))),
                ],
                Descriptor::Never,
            ))
            .with("Ping", Descriptor::union([Descriptor::NULL, Descriptor::object(
                vec![Field::same("pong", Descriptor::reference("Pong"))],
                Descriptor::Never,
            )]))
            .with("Pong", Descriptor::object(vec![Field::same("ping", Descriptor::reference("Ping"))], Descriptor::Never))
            .build()
            .unwrap();

        let tree = json!({ "value": 1, "children": [
            { "value": 2, "children": [] },
            { "value": 3, "children": [{ "value": 4, "children": [] }] }
        ] });
        assert_eq!(reg.decode(&tree, "Tree").unwrap().into_json(), tree);

        let deep = json!({ "value": 1, "children": [
            { "value": 2, "children": [{ "value": "x", "children": [] }] }
        ] });
        let err = reg.decode(&deep, "Tree").unwrap_err();
        assert_eq!(err.path.to_string(), "children[0].children[0].value");
        assert_eq!(err.parent.as_deref(), Some("Tree"));

        let chain = json!({ "pong": { "ping": { "pong": { "ping": null } } } });
        assert!(reg.decode(&chain, "Ping").is_ok());
    }

    #[test]
    fn chained_references_resolve() {
        let reg = Registry::builder()
            .with("A", Descriptor::reference("B"))
            .with("B", Descriptor::reference("C"))
            .with("C", Descriptor::object(vec![Field::same("x", Descriptor::STRING)], Descriptor::Never))
            .build()
            .unwrap();
        assert!(reg.decode(&json!({ "x": "y" }), "A").is_ok());
        // the innermost name is reported
        let err = reg.decode(&json!(1), "A").unwrap_err();
        assert_eq!(err.expected, "C");
    }

    #[test]
    fn unresolved_reference_fails_at_dispatch_only() {
        let reg = Registry::builder()
            .with("Doc", Descriptor::object(
                vec![Field::same("body", Descriptor::optional(Descriptor::reference("Missing")))],
                Descriptor::Never,
            ))
            .build()
            .unwrap();
        // never reached: absent takes the `undefined` arm first
        assert!(reg.decode(&json!({}), "Doc").is_ok());
        assert!(reg.decode(&json!({ "body": 1 }), "Doc").is_err());

        let err = reg.decode(&json!(1), "Nope").unwrap_err();
        assert!(err.expected.contains("Nope"));
    }

    #[test]
    fn dates_decode_from_strings_only() {
        let reg = Registry::builder()
            .with("Event", Descriptor::object(vec![Field::same("at", Descriptor::Date)], Descriptor::Never))
            .build()
            .unwrap();

        let out = reg.decode(&json!({ "at": "2024-05-06T07:08:09Z" }), "Event").unwrap();
        assert!(out.get("at").as_date().is_some());

        let err = reg.decode(&json!({ "at": 1700000000 }), "Event").unwrap_err();
        assert_eq!(err.expected, "Date");
        assert_eq!(err.key.as_deref(), Some("at"));

        assert!(reg.decode(&json!({ "at": "not a date" }), "Event").is_err());
        assert!(reg.decode(&json!({ "at": null }), "Event").is_err());
    }

    #[test]
    fn dates_encode_to_normalized_strings() {
        let reg = Registry::empty();
        let d = typed::parse_date("2024-05-06T09:08:09+02:00").unwrap();
        assert_eq!(reg.encode_with(&Typed::Date(d), &Descriptor::Date).unwrap(), json!("2024-05-06T07:08:09.000Z"));
        // strings from the serde bridge are accepted if they parse
        let s = Typed::String("2024-05-06".into());
        assert_eq!(reg.encode_with(&s, &Descriptor::Date).unwrap(), json!("2024-05-06T00:00:00.000Z"));
        assert!(reg.encode_with(&Typed::from_json(&json!(0)), &Descriptor::Date).is_err());
    }

    #[test]
    fn encode_renames_back_and_rejects_malformed_values() {
        let d = Descriptor::object(
            vec![Field::new("page.background", "pageBackground", Descriptor::optional(Descriptor::STRING))],
            Descriptor::Never,
        );
        let reg = Registry::empty();
        let typed = Typed::from_json(&json!({ "pageBackground": "1, 2, 3, 1" }));
        assert_eq!(reg.encode_with(&typed, &d).unwrap(), json!({ "page.background": "1, 2, 3, 1" }));

        // a JSON key is not an internal key
        let wrong = Typed::from_json(&json!({ "page.background": "1, 2, 3, 1" }));
        let err = reg.encode_with(&wrong, &d).unwrap_err();
        assert_eq!(err.key.as_deref(), Some("page.background"));
    }

    #[test]
    fn round_trip_is_stable() {
        let reg = Registry::builder()
            .with("Doc", Descriptor::object(
                vec![
                    Field::new("created-at", "createdAt", Descriptor::Date),
                    Field::new("the.title", "title", Descriptor::optional(Descriptor::STRING)),
                    Field::same("n", Descriptor::union([Descriptor::NUMBER, Descriptor::NULL])),
                    Field::same("items", Descriptor::array(Descriptor::reference("Item"))),
                ],
                Descriptor::ANY,
            ))
            .with("Item", Descriptor::object(vec![Field::new("k.v", "kv", Descriptor::BOOLEAN)], Descriptor::Never))
            .build()
            .unwrap();

        let j = json!({
            "created-at": "2023-01-02T03:04:05+01:00",
            "n": null,
            "items": [{ "k.v": true }, { "k.v": false }],
            "extra": { "free": "form" }
        });
        let v = reg.decode(&j, "Doc").unwrap();
        let j2 = reg.encode(&v, "Doc").unwrap();
        let v2 = reg.decode(&j2, "Doc").unwrap();
        assert_eq!(v, v2);
        // dates are normalized once, then stable
        let j3 = reg.encode(&v2, "Doc").unwrap();
        assert_eq!(j2, j3);
        assert_eq!(j2["created-at"], json!("2023-01-02T02:04:05.000Z"));
        assert!(j2.get("the.title").is_none());
    }

    #[test]
    fn property_maps_are_cached_per_direction() {
        let reg = Registry::builder()
            .with("Item", Descriptor::object(vec![Field::new("k.v", "kv", Descriptor::BOOLEAN)], Descriptor::Never))
            .with("List", Descriptor::array(Descriptor::reference("Item")))
            .build()
            .unwrap();
        let input = json!([{ "k.v": true }, { "k.v": false }, { "k.v": true }]);
        let v = reg.decode(&input, "List").unwrap();
        assert_eq!(reg.props().len(), 1);
        reg.decode(&input, "List").unwrap();
        assert_eq!(reg.props().len(), 1);
        reg.encode(&v, "List").unwrap();
        assert_eq!(reg.props().len(), 2);
    }

    #[test]
    fn concurrent_decodes_share_one_registry() {
        let reg = Registry::builder()
            .with("Item", Descriptor::object(vec![Field::new("k.v", "kv", Descriptor::NUMBER)], Descriptor::Never))
            .build()
            .unwrap();
        let outs: Vec<Value> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let reg = &reg;
                    s.spawn(move || reg.decode(&json!({ "k.v": i }), "Item").unwrap().into_json())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (i, out) in outs.iter().enumerate() {
            assert_eq!(out, &json!({ "kv": i }));
        }
        assert_eq!(reg.props().len(), 1);
    }

    #[test]
    fn inline_copy_of_registered_object_is_walked_by_its_own_fields() {
        let reg = Registry::builder()
            .with("P", Descriptor::object(
                vec![Field::same("a", Descriptor::NUMBER), Field::same("b", Descriptor::NUMBER)],
                Descriptor::Never,
            ))
            .build()
            .unwrap();
        reg.decode(&json!({ "a": 1, "b": 2 }), "P").unwrap();

        let Some(Descriptor::Object(registered)) = reg.get("P") else { panic!("expected object") };
        let copy = Descriptor::Object(registered.clone());
        let v = reg.decode_with(&json!({ "a": 3, "b": 4 }), &copy).unwrap();
        assert_eq!(v.into_json(), json!({ "a": 3, "b": 4 }));

        let narrower = Descriptor::object(vec![Field::same("x", Descriptor::NUMBER)], Descriptor::Never);
        let v = reg.decode_with(&json!({ "x": 5 }), &narrower).unwrap();
        assert_eq!(v.into_json(), json!({ "x": 5 }));
        assert_eq!(reg.props().len(), 1);
    }

    #[test]
    fn inline_objects_leave_the_cache_untouched() {
        let reg = Registry::empty();
        let item = Descriptor::object(vec![Field::new("k.v", "kv", Descriptor::NUMBER)], Descriptor::Never);
        let list = Descriptor::array(item);
        for i in 0..100 {
            let v = reg.decode_with(&json!([{ "k.v": i }, { "k.v": i + 1 }]), &list).unwrap();
            assert_eq!(v.into_json(), json!([{ "kv": i }, { "kv": i + 1 }]));
        }
        assert!(reg.props().is_empty());
    }
}
