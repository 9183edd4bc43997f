//! Property-map cache: per object descriptor and direction, the translation
//! from source keys to target keys.
//!
//! Maps are pure functions of an immutable descriptor, so a miss computes the
//! map outside the lock and the first insert wins. Two threads racing on the
//! same descriptor may both compute it; one copy is dropped.
//!
//! Only objects reachable from the registry's own descriptors are cached, so
//! the table is bounded by the schema and lives exactly as long as it.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::descriptor::{Field, ObjectDescriptor, ObjectId};
use crate::transform::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMap {
    entries: IndexMap<String, Target>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub key: String,
    /// Index into the descriptor's `fields`.
    pub field: usize,
}

#[derive(Debug, Default)]
pub struct PropertyCache {
    owned: HashSet<ObjectId>,
    maps: RwLock<HashMap<(ObjectId, Direction), Arc<PropertyMap>>>,
}

impl PropertyMap {
    pub fn build(obj: &ObjectDescriptor, direction: Direction) -> Self {
        let entries = obj
            .fields()
            .iter()
            .enumerate()
            .map(|(ix, f)| {
                let (source, target) = keys(f, direction);
                (source.to_string(), Target { key: target.to_string(), field: ix })
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, source_key: &str) -> Option<&Target> {
        self.entries.get(source_key)
    }

    pub fn contains(&self, source_key: &str) -> bool {
        self.entries.contains_key(source_key)
    }

    /// Declared fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn keys(f: &Field, direction: Direction) -> (&str, &str) {
    match direction {
        Direction::Decode => (&f.json, &f.js),
        Direction::Encode => (&f.js, &f.json),
    }
}

impl PropertyCache {
    pub(crate) fn owning(owned: HashSet<ObjectId>) -> Self {
        Self { owned, maps: RwLock::default() }
    }

    pub fn owns(&self, id: ObjectId) -> bool {
        self.owned.contains(&id)
    }

    /// Cached map for an owned object, `None` for anything else.
    pub fn get_or_build(&self, obj: &ObjectDescriptor, direction: Direction) -> Option<Arc<PropertyMap>> {
        if !self.owns(obj.id()) {
            return None;
        }
        let key = (obj.id(), direction);
        {
            let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(map) = maps.get(&key) {
                return Some(Arc::clone(map));
            }
        }
        let built = Arc::new(PropertyMap::build(obj, direction));
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(maps.entry(key).or_insert(built)))
    }

    /// Number of cached (descriptor, direction) maps.
    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
