use crate::{SchemaError, SchemaResult, TypeDescriptor};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The ordered field table of one entity kind.
///
/// Field order is declaration order; it only matters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Structure {
    fields: IndexMap<String, TypeDescriptor>,
}

impl Structure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field with an arbitrary descriptor.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }

    /// Shorthand for a required string field.
    #[must_use]
    pub fn string(self, name: impl Into<String>) -> Self {
        self.field(name, TypeDescriptor::string())
    }

    /// Shorthand for a required number field.
    #[must_use]
    pub fn number(self, name: impl Into<String>) -> Self {
        self.field(name, TypeDescriptor::number())
    }

    /// Shorthand for a required boolean field.
    #[must_use]
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, TypeDescriptor::boolean())
    }

    /// Shorthand for an optional field of `descriptor`.
    #[must_use]
    pub fn optional(self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.field(name, TypeDescriptor::optional(descriptor))
    }

    /// Shorthand for a required reference to one of `kinds`.
    #[must_use]
    pub fn reference<I, S>(self, name: impl Into<String>, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field(name, TypeDescriptor::reference(kinds))
    }

    /// Looks up a field's descriptor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.fields.get(name)
    }

    /// Whether `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Whether `name` is declared and not optional.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|d| !d.is_optional())
    }

    /// Iterates fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates the names of required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, d)| !d.is_optional())
            .map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, TypeDescriptor)> for Structure {
    fn from_iter<I: IntoIterator<Item = (S, TypeDescriptor)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A `Ref` that names a kind the schema does not declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub kind: String,
    pub field: String,
    pub missing: String,
}

/// Mapping of entity-kind name to its [`Structure`].
///
/// Kind order is declaration order, and it is semantically relevant: whole
/// graph validation tries kinds in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    kinds: IndexMap<String, Structure>,
}

impl Schema {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parses a schema from its JSON DSL form.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a schema from an untyped JSON value.
    pub fn from_value(value: serde_json::Value) -> SchemaResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Looks up a kind's structure.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<&Structure> {
        self.kinds.get(name)
    }

    /// Position of a kind in declaration order.
    #[must_use]
    pub fn kind_index(&self, name: &str) -> Option<usize> {
        self.kinds.get_index_of(name)
    }

    /// Whether the schema declares `name`.
    #[must_use]
    pub fn contains_kind(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Iterates kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = (&str, &Structure)> {
        self.kinds.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates kind names in declaration order.
    pub fn kind_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Descriptor of `field` on `kind`, if both exist.
    #[must_use]
    pub fn field(&self, kind: &str, field: &str) -> Option<&TypeDescriptor> {
        self.kinds.get(kind)?.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Lists every `Ref` target that is not a declared kind.
    ///
    /// Validation tolerates these (such a target simply never matches); this is
    /// an authoring-time diagnostic.
    #[must_use]
    pub fn dangling_refs(&self) -> Vec<DanglingRef> {
        let mut dangling = Vec::new();
        for (kind, structure) in &self.kinds {
            for (field, descriptor) in structure.fields() {
                let mut targets = Vec::new();
                descriptor.referenced_kinds(&mut targets);
                for target in targets {
                    if !self.contains_kind(target) {
                        dangling.push(DanglingRef {
                            kind: kind.clone(),
                            field: field.to_string(),
                            missing: target.to_string(),
                        });
                    }
                }
            }
        }
        dangling
    }
}

/// Incremental schema construction.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    kinds: IndexMap<String, Structure>,
    duplicates: Vec<String>,
}

impl SchemaBuilder {
    /// Declares a kind. Redeclaring a name replaces the earlier structure in
    /// place and is reported by [`SchemaBuilder::build_checked`].
    #[must_use]
    pub fn kind(mut self, name: impl Into<String>, structure: Structure) -> Self {
        let name = name.into();
        if self.kinds.insert(name.clone(), structure).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Finishes without further checks.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema { kinds: self.kinds }
    }

    /// Finishes, rejecting duplicate kinds and refs to undeclared kinds.
    pub fn build_checked(self) -> SchemaResult<Schema> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(SchemaError::DuplicateKind(name));
        }
        let schema = Schema { kinds: self.kinds };
        if let Some(d) = schema.dangling_refs().into_iter().next() {
            return Err(SchemaError::UnknownKind {
                kind: d.kind,
                field: d.field,
                missing: d.missing,
            });
        }
        Ok(schema)
    }
}
