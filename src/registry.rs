//! Named descriptor table. Read-only once built; the only mutable state it
//! owns is the [`PropertyCache`] side-table.
pub mod props;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::descriptor::Descriptor;
use crate::error::{KeySide, SchemaError};
pub use props::{PropertyCache, PropertyMap};

#[derive(Debug, Default)]
pub struct Registry {
    descriptors: IndexMap<String, Descriptor>,
    props: PropertyCache,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<(String, Descriptor)>,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

impl RegistryBuilder {
    pub fn with(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.entries.push((name.into(), descriptor));
        self
    }

    /// Checks name uniqueness and per-object key uniqueness. References are
    /// not checked here; they only need to resolve when dispatched.
    pub fn build(self) -> Result<Registry, SchemaError> {
        let mut descriptors = IndexMap::with_capacity(self.entries.len());
        let mut owned = HashSet::new();
        for (name, descriptor) in self.entries {
            check_unique_keys(&name, &descriptor)?;
            descriptor.visit_objects(&mut |obj| { owned.insert(obj.id()); });
            match descriptors.entry(name) {
                Entry::Occupied(e) => return Err(SchemaError::DuplicateName(e.key().clone())),
                Entry::Vacant(e) => { e.insert(descriptor); }
            }
        }
        Ok(Registry { descriptors, props: PropertyCache::owning(owned) })
    }
}

fn check_unique_keys(name: &str, descriptor: &Descriptor) -> Result<(), SchemaError> {
    let mut result = Ok(());
    descriptor.visit_objects(&mut |obj| {
        if result.is_err() { return; }
        let mut json = HashSet::new();
        let mut js = HashSet::new();
        for f in obj.fields() {
            let dup = if !json.insert(f.json.as_str()) {
                Some((KeySide::Json, &f.json))
            } else if !js.insert(f.js.as_str()) {
                Some((KeySide::Internal, &f.js))
            } else {
                None
            };
            if let Some((side, key)) = dup {
                result = Err(SchemaError::DuplicateKey {
                    descriptor: name.to_string(),
                    side,
                    key: key.clone(),
                });
                return;
            }
        }
    });
    result
}

// ————————————————————————————————————————————————————————————————————————————
// ACCESS
// ————————————————————————————————————————————————————————————————————————————

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// A registry with no named descriptors, for inline descriptors only.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn props(&self) -> &PropertyCache {
        &self.props
    }

    /// Optional strict check that every reference names a registered
    /// descriptor. The engine itself only fails when it reaches one.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        for (name, descriptor) in &self.descriptors {
            if let Some(missing) = descriptor.references().into_iter().find(|r| !self.contains(r)) {
                return Err(SchemaError::UnresolvedReference {
                    from: name.clone(),
                    to: missing.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA DOCUMENTS
// ————————————————————————————————————————————————————————————————————————————

impl Registry {
    /// Load `{ "Name": <descriptor>, ... }`. See [`crate::descriptor::serde_repr`].
    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        Self::from_table(crate::path_de::from_str_with_path(src))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let bytes = std::fs::read(path)?;
        Self::from_table(crate::path_de::from_slice_with_path(&bytes))
    }

    fn from_table(table: Result<IndexMap<String, Descriptor>, (String, String)>) -> Result<Self, SchemaError> {
        table
            .map_err(|(path, message)| SchemaError::Document { path, message })?
            .into_iter()
            .fold(Registry::builder(), |b, (name, d)| b.with(name, d))
            .build()
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.descriptors)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
