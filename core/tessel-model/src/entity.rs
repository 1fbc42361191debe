use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessel_types::{EntityId, RefToken};

/// The untyped entity graph: id → entity record, in insertion order.
///
/// This is both the store's internal map and the snapshot format exchanged
/// over the replication channel. Entities are arbitrary JSON; whether they
/// conform to a schema is decided by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityGraph {
    entities: IndexMap<EntityId, Value>,
}

impl EntityGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from an untyped value. Returns `None` unless `value`
    /// is a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(
                map.into_iter()
                    .map(|(id, entity)| (EntityId::new(id), entity))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Renders the graph as a JSON object keyed by id.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entities
                .iter()
                .map(|(id, entity)| (id.to_string(), entity.clone()))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.entities.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Value> {
        self.entities.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Inserts or replaces an entity.
    pub fn insert(&mut self, id: impl Into<EntityId>, entity: Value) {
        self.entities.insert(id.into(), entity);
    }

    /// Iterates ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Value)> {
        self.entities.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<(EntityId, Value)> for EntityGraph {
    fn from_iter<I: IntoIterator<Item = (EntityId, Value)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

/// A read-only view of one validated entity and its kind.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub id: &'a EntityId,
    pub kind: &'a str,
    pub data: &'a Value,
}

impl<'a> EntityView<'a> {
    /// Top-level field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.data.get(field)
    }

    /// Extract a string value using a JSON pointer (e.g., "/nom").
    #[must_use]
    pub fn get_str(&self, pointer: &str) -> Option<&'a str> {
        self.data.pointer(pointer).and_then(Value::as_str)
    }

    /// Extract a boolean value using a JSON pointer.
    #[must_use]
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.data.pointer(pointer).and_then(Value::as_bool)
    }

    /// Extract a numeric value using a JSON pointer.
    #[must_use]
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.data.pointer(pointer).and_then(Value::as_f64)
    }

    /// Reads a `{ref: id}` field.
    #[must_use]
    pub fn get_ref(&self, field: &str) -> Option<RefToken> {
        self.get(field).and_then(|v| RefToken::from_value(v).ok())
    }

    /// Reads an array of `{ref: id}` tokens, skipping anything else.
    #[must_use]
    pub fn get_refs(&self, field: &str) -> Vec<RefToken> {
        self.get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| RefToken::from_value(v).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
