use crate::{Assignment, EntityGraph, EntityView, KindIndex, ModelError, ModelResult, Validator};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tessel_schema::Schema;
use tessel_types::{EntityId, IdMint, RefToken};
use tracing::debug;

/// The validating entity store.
///
/// Owns the entity graph and its id → kind index. The two always cover the
/// same ids: entities enter either through [`DataModel::create_value`]
/// (trusted, unvalidated) or through [`DataModel::init`] (validated as a
/// whole graph). Fields change only through [`DataModel::set_field`] and
/// [`DataModel::clear_field`], which type-check the new value first.
#[derive(Debug, Clone)]
pub struct DataModel {
    schema: Arc<Schema>,
    entities: EntityGraph,
    kinds: KindIndex,
    mint: IdMint,
}

impl DataModel {
    /// Creates an empty store over `schema`.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_mint(schema, IdMint::new())
    }

    /// Creates an empty store minting ids with `mint`.
    pub fn with_mint(schema: impl Into<Arc<Schema>>, mint: IdMint) -> Self {
        Self {
            schema: schema.into(),
            entities: EntityGraph::new(),
            kinds: KindIndex::new(),
            mint,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Shared handle to the schema, for building sibling stores.
    #[must_use]
    pub fn schema_handle(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// The live entity graph.
    #[must_use]
    pub fn entities(&self) -> &EntityGraph {
        &self.entities
    }

    /// The committed id → kind index.
    #[must_use]
    pub fn kinds(&self) -> &KindIndex {
        &self.kinds
    }

    /// A validator over the live graph.
    #[must_use]
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.schema, &self.entities)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Registers `value` as a new entity of `kind` under a fresh id.
    ///
    /// No validation is performed: this is the seeding path for callers that
    /// construct already-typed data. Use [`DataModel::is_valid`] to audit.
    pub fn create_value(&mut self, kind: impl Into<String>, value: Value) -> RefToken {
        let mut id = self.mint.mint();
        while self.entities.contains(id.as_str()) {
            id = self.mint.mint();
        }
        self.entities.insert(id.clone(), value);
        self.kinds.insert(id.clone(), kind.into());
        RefToken::from(id)
    }

    /// Serializes `value` and registers it like [`DataModel::create_value`].
    pub fn create_from<T: Serialize>(
        &mut self,
        kind: impl Into<String>,
        value: &T,
    ) -> ModelResult<RefToken> {
        let value = serde_json::to_value(value)?;
        Ok(self.create_value(kind, value))
    }

    /// Validates `graph` as a whole and adopts it.
    ///
    /// On success the graph and its index replace the current state and the
    /// index is returned. On failure nothing changes and `None` is returned.
    pub fn init(&mut self, graph: EntityGraph) -> Option<KindIndex> {
        self.try_init(graph).ok()
    }

    /// Like [`DataModel::init`], reporting the first entity no kind accepts.
    pub fn try_init(&mut self, graph: EntityGraph) -> Result<KindIndex, EntityId> {
        let assigned = Validator::new(&self.schema, &graph).assign();
        match assigned {
            Ok(index) => {
                for id in graph.ids() {
                    self.mint.observe(id);
                }
                self.entities = graph;
                self.kinds = index.clone();
                Ok(index)
            }
            Err(id) => {
                debug!(entity = %id, entities = graph.len(), "graph rejected: no kind matches");
                Err(id)
            }
        }
    }

    /// Like [`DataModel::init`] for an untyped value; anything but a JSON
    /// object is rejected.
    pub fn init_json(&mut self, value: Value) -> Option<KindIndex> {
        self.init(EntityGraph::from_value(value)?)
    }

    /// Re-validates the live graph from scratch without changing state.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validator().assign().is_ok()
    }

    // ── Mutation ─────────────────────────────────────────────────

    /// Type-checks `value` against the declared descriptor of `field` on the
    /// entity's kind, and stores it only if it matches.
    ///
    /// Returns `false` without any change when the id is unknown, the field is
    /// not declared, or the value does not match.
    pub fn set_field(&mut self, id: &str, field: &str, value: Value) -> bool {
        let Some(kind) = self.kinds.get(id) else {
            return false;
        };
        let Some(descriptor) = self.schema.field(kind, field) else {
            return false;
        };
        // Ref targets must keep the kinds they were committed with.
        let mut assignment = Assignment::seeded(&self.kinds);
        if !self.validator().matches(descriptor, Some(&value), &mut assignment) {
            debug!(entity = id, field, "field update rejected");
            return false;
        }
        match self.entities.get_mut(id).and_then(Value::as_object_mut) {
            Some(fields) => {
                fields.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Removes an optional field. Required fields cannot be cleared.
    pub fn clear_field(&mut self, id: &str, field: &str) -> bool {
        let Some(kind) = self.kinds.get(id) else {
            return false;
        };
        if !self.schema.field(kind, field).is_some_and(|d| d.is_optional()) {
            return false;
        }
        match self.entities.get_mut(id).and_then(Value::as_object_mut) {
            Some(fields) => {
                fields.remove(field);
                true
            }
            None => false,
        }
    }

    // ── Access ───────────────────────────────────────────────────

    /// All entities with their kinds, in graph order.
    pub fn get_values(&self) -> impl Iterator<Item = EntityView<'_>> {
        self.entities.iter().filter_map(|(id, data)| {
            self.kinds.get(id).map(|kind| EntityView {
                id,
                kind: kind.as_str(),
                data,
            })
        })
    }

    /// The raw entity stored under `id`.
    #[must_use]
    pub fn get_value(&self, id: &str) -> Option<&Value> {
        self.entities.get(id)
    }

    /// A kind-tagged view of the entity stored under `id`.
    #[must_use]
    pub fn view(&self, id: &str) -> Option<EntityView<'_>> {
        let (id, kind) = self.kinds.get_key_value(id)?;
        let data = self.entities.get(id.as_str())?;
        Some(EntityView {
            id,
            kind: kind.as_str(),
            data,
        })
    }

    /// The kind `id` was registered or validated as.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<&str> {
        self.kinds.get(id).map(String::as_str)
    }

    /// Ids registered as `kind`, in graph order.
    pub fn ids_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a EntityId> + 'a {
        self.kinds
            .iter()
            .filter(move |(_, k)| k.as_str() == kind)
            .map(|(id, _)| id)
    }

    /// Whether entity `id` is of `kind`.
    #[must_use]
    pub fn is(&self, id: &str, kind: &str) -> bool {
        self.kind_of(id) == Some(kind)
    }

    /// Whether `token` points at an entity of `kind`.
    #[must_use]
    pub fn is_ref(&self, token: &RefToken, kind: &str) -> bool {
        self.is(token.id.as_str(), kind)
    }

    /// Resolves a token to its pointee. Pure lookup; never mutates the token.
    #[must_use]
    pub fn resolve(&self, token: &RefToken) -> Option<&Value> {
        self.entities.get(token.id.as_str())
    }

    /// Resolves a token only if it points at an entity of `kind`.
    #[must_use]
    pub fn resolve_as(&self, token: &RefToken, kind: &str) -> Option<EntityView<'_>> {
        if self.is_ref(token, kind) {
            self.view(token.id.as_str())
        } else {
            None
        }
    }

    /// Deserializes entity `id` into `T` after checking its kind.
    pub fn get_typed<T: DeserializeOwned>(&self, id: &str, kind: &str) -> ModelResult<T> {
        let view = self
            .view(id)
            .ok_or_else(|| ModelError::NotFound(EntityId::new(id)))?;
        if view.kind != kind {
            return Err(ModelError::WrongKind {
                id: view.id.clone(),
                expected: kind.to_string(),
                actual: view.kind.to_string(),
            });
        }
        Ok(T::deserialize(view.data)?)
    }

    // ── Snapshots ────────────────────────────────────────────────

    /// Deep copy of the entity graph.
    #[must_use]
    pub fn snapshot(&self) -> EntityGraph {
        self.entities.clone()
    }

    /// The entity graph as a JSON object keyed by id.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.entities.to_value()
    }
}
