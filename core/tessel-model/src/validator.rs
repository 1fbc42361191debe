//! Structural validation of entity graphs.
//!
//! A [`Validator`] borrows a schema and the root graph and decides whether
//! values conform to type descriptors. Resolving a `Ref` checks the pointee
//! structurally, and graphs may be cyclic, so every pass threads an
//! [`Assignment`] (id → kind) through the descent:
//!
//! - `id` already bound to the requested kind: succeed (memoized; breaks cycles)
//! - `id` bound to another kind: fail (one kind per id per pass)
//! - otherwise bind speculatively, check, and undo on failure
//!
//! Undo is trail-based: a failed attempt removes its own binding and every
//! binding made after it, so nothing justified by a refuted assumption
//! survives the backtrack.
//!
//! Checking an entity first matches every non-reference part of it and
//! collects its references as pending goals. Goals are resolved on an
//! explicit frame stack, so ref chains of any length run in constant
//! thread-stack depth.

use crate::EntityGraph;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tessel_schema::{Schema, Structure, TypeDescriptor};
use tessel_types::{EntityId, RefToken};

/// Committed id → kind index, in graph order.
pub type KindIndex = IndexMap<EntityId, String>;

/// Working id → kind map for one validation pass.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    kinds: HashMap<EntityId, String>,
    trail: Vec<EntityId>,
}

impl Assignment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already committed index. Seeded bindings are never
    /// rolled back.
    #[must_use]
    pub fn seeded(index: &KindIndex) -> Self {
        Self {
            kinds: index
                .iter()
                .map(|(id, kind)| (id.clone(), kind.clone()))
                .collect(),
            trail: Vec::new(),
        }
    }

    /// Kind currently bound to `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.kinds.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    fn bind(&mut self, id: &EntityId, kind: &str) {
        self.kinds.insert(id.clone(), kind.to_string());
        self.trail.push(id.clone());
    }

    const fn mark(&self) -> usize {
        self.trail.len()
    }

    fn rollback(&mut self, mark: usize) {
        for id in self.trail.drain(mark..) {
            self.kinds.remove(&id);
        }
    }

    /// Orders the bindings by `graph` order.
    fn into_index(mut self, graph: &EntityGraph) -> KindIndex {
        graph
            .ids()
            .filter_map(|id| self.kinds.remove(id).map(|kind| (id.clone(), kind)))
            .collect()
    }
}

/// Why an entity does not conform to a kind. Diagnostic only.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The kind is not declared by the schema.
    UnknownKind,
    /// The entity is not a JSON object.
    NotAnObject,
    /// Strict mode: the entity carries a field the kind does not declare.
    UndeclaredField(String),
    /// A required field is absent.
    MissingField(String),
    /// A present field does not match its descriptor.
    FieldType {
        field: String,
        expected: TypeDescriptor,
        found: Value,
    },
    /// The entity conforms in isolation but not together with the kinds
    /// chosen for the rest of the graph.
    Conflict,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind => f.write_str("kind is not declared"),
            Self::NotAnObject => f.write_str("entity is not an object"),
            Self::UndeclaredField(name) => write!(f, "field {name:?} is not declared"),
            Self::MissingField(name) => write!(f, "required field {name:?} is missing"),
            Self::FieldType {
                field,
                expected,
                found,
            } => write!(f, "field {field:?}: expected {expected}, found {found}"),
            Self::Conflict => f.write_str("conflicts with the kinds of other entities"),
        }
    }
}

/// A reference still to be resolved: `id` must check as one of `kinds`.
#[derive(Debug)]
struct RefGoal<'d> {
    id: EntityId,
    kinds: &'d [String],
}

/// An entity bound speculatively, with the references its fields carry.
#[derive(Debug)]
struct Frame<'d> {
    mark: usize,
    goals: Vec<RefGoal<'d>>,
    goal: usize,
    kind: usize,
}

impl<'d> Frame<'d> {
    fn new(mark: usize, goals: Vec<RefGoal<'d>>) -> Self {
        Self {
            mark,
            goals,
            goal: 0,
            kind: 0,
        }
    }

    /// Records the outcome of the current candidate kind.
    fn settle(&mut self, ok: bool) {
        if ok {
            self.goal += 1;
            self.kind = 0;
        } else {
            self.kind += 1;
        }
    }
}

enum Step<'d> {
    Done(bool),
    Descend(Frame<'d>),
}

/// Structural matcher over one root graph.
///
/// Holds only shared borrows; all mutable state lives in the [`Assignment`]
/// passed by the caller, so independent passes may run concurrently.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    schema: &'a Schema,
    graph: &'a EntityGraph,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, graph: &'a EntityGraph) -> Self {
        Self { schema, graph }
    }

    /// Whether `value` conforms to `descriptor`. `None` means absent.
    ///
    /// On failure `assignment` is left as it was.
    pub fn matches(
        &self,
        descriptor: &TypeDescriptor,
        value: Option<&Value>,
        assignment: &mut Assignment,
    ) -> bool {
        let mut goals = Vec::new();
        if !self.collect(descriptor, value, &mut goals) {
            return false;
        }
        self.resolve(Frame::new(assignment.mark(), goals), assignment)
    }

    /// Checks entity `id` of the root graph against `kind`, memoizing through
    /// `assignment`.
    pub fn check(&self, id: &EntityId, kind: &str, assignment: &mut Assignment) -> bool {
        match self.enter(id, kind, assignment) {
            Step::Done(ok) => ok,
            Step::Descend(frame) => self.resolve(frame, assignment),
        }
    }

    /// Strict structural check of a free-standing entity against `kind`.
    pub fn matches_structure(
        &self,
        kind: &str,
        entity: &Value,
        assignment: &mut Assignment,
    ) -> bool {
        let Some(structure) = self.schema.kind(kind) else {
            return false;
        };
        let mut goals = Vec::new();
        if !self.collect_fields(structure, entity, &mut goals) {
            return false;
        }
        self.resolve(Frame::new(assignment.mark(), goals), assignment)
    }

    /// Binds `id` to `kind` and matches the entity locally. References are
    /// returned as a frame still to be resolved.
    fn enter(&self, id: &EntityId, kind: &str, assignment: &mut Assignment) -> Step<'a> {
        if let Some(bound) = assignment.get(id.as_str()) {
            return Step::Done(bound == kind);
        }
        let (Some(structure), Some(entity)) = (self.schema.kind(kind), self.graph.get(id.as_str()))
        else {
            return Step::Done(false);
        };

        let mark = assignment.mark();
        assignment.bind(id, kind);
        let mut goals = Vec::new();
        if self.collect_fields(structure, entity, &mut goals) {
            Step::Descend(Frame::new(mark, goals))
        } else {
            assignment.rollback(mark);
            Step::Done(false)
        }
    }

    /// Drives `root` and every frame it opens to completion. A frame whose
    /// goal runs out of candidate kinds rolls back to its mark and fails its
    /// parent's current candidate.
    fn resolve<'d>(&self, root: Frame<'d>, assignment: &mut Assignment) -> bool
    where
        'a: 'd,
    {
        let mut stack = vec![root];
        let mut settled = None;
        while let Some(frame) = stack.last_mut() {
            if let Some(ok) = settled.take() {
                frame.settle(ok);
            }
            let Some(goal) = frame.goals.get(frame.goal) else {
                stack.pop();
                settled = Some(true);
                continue;
            };
            let Some(kind) = goal.kinds.get(frame.kind) else {
                assignment.rollback(frame.mark);
                stack.pop();
                settled = Some(false);
                continue;
            };
            match self.enter(&goal.id, kind, assignment) {
                Step::Done(ok) => settled = Some(ok),
                Step::Descend(child) => stack.push(child),
            }
        }
        settled == Some(true)
    }

    /// Matches the non-reference parts of `value` and queues its references.
    fn collect<'d>(
        &self,
        descriptor: &'d TypeDescriptor,
        value: Option<&Value>,
        goals: &mut Vec<RefGoal<'d>>,
    ) -> bool {
        match (descriptor, value) {
            (TypeDescriptor::Optional(_), None) => true,
            (TypeDescriptor::Optional(inner), Some(_)) => self.collect(inner, value, goals),
            (_, None) => false,
            (TypeDescriptor::Primitive(p), Some(v)) => p.accepts(v),
            (TypeDescriptor::Union(literals), Some(v)) => {
                v.as_str().is_some_and(|s| literals.contains(s))
            }
            (TypeDescriptor::ArrayOf(inner), Some(v)) => v.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| self.collect(inner, Some(item), goals))
            }),
            (TypeDescriptor::Ref(kinds), Some(v)) => match self.ref_target(v) {
                Some(id) => {
                    goals.push(RefGoal { id, kinds });
                    true
                }
                None => false,
            },
        }
    }

    fn collect_fields<'d>(
        &self,
        structure: &'d Structure,
        entity: &Value,
        goals: &mut Vec<RefGoal<'d>>,
    ) -> bool {
        let Some(fields) = entity.as_object() else {
            return false;
        };
        if fields.keys().any(|name| !structure.contains(name)) {
            return false;
        }
        structure
            .fields()
            .all(|(name, descriptor)| self.collect(descriptor, fields.get(name), goals))
    }

    /// The id a well-formed token points at, if it is in the root graph.
    fn ref_target(&self, value: &Value) -> Option<EntityId> {
        // Exactly `{ref: id}`, nothing else on the token.
        let id = value
            .as_object()
            .filter(|token| token.len() == 1)
            .and_then(|_| RefToken::peek(value))?;
        self.graph.contains(id).then(|| EntityId::new(id))
    }

    /// Assigns a kind to every entity of the graph, trying kinds in schema
    /// order. Fails with the first id no kind accepts.
    pub fn assign(&self) -> Result<KindIndex, EntityId> {
        let mut assignment = Assignment::new();
        for id in self.graph.ids() {
            let assigned = self
                .schema
                .kind_names()
                .any(|kind| self.check(id, kind, &mut assignment));
            if !assigned {
                return Err(id.clone());
            }
        }
        Ok(assignment.into_index(self.graph))
    }

    /// Explains, per declared kind, why entity `id` does not conform.
    ///
    /// Each kind is tried with a fresh assignment, so the first failing field
    /// is reported even when the whole-graph pass failed elsewhere. Returns
    /// `None` when `id` is not in the graph.
    #[must_use]
    pub fn explain(&self, id: &str) -> Option<Vec<(String, Mismatch)>> {
        let entity = self.graph.get(id)?;
        Some(
            self.schema
                .kind_names()
                .map(|kind| {
                    let mismatch = self.diagnose(kind, entity).unwrap_or(Mismatch::Conflict);
                    (kind.to_string(), mismatch)
                })
                .collect(),
        )
    }

    /// First field-level reason `entity` fails `kind`, or `None` if every
    /// field matches in isolation.
    #[must_use]
    pub fn diagnose(&self, kind: &str, entity: &Value) -> Option<Mismatch> {
        let Some(structure) = self.schema.kind(kind) else {
            return Some(Mismatch::UnknownKind);
        };
        let Some(fields) = entity.as_object() else {
            return Some(Mismatch::NotAnObject);
        };
        if let Some(name) = fields.keys().find(|name| !structure.contains(name)) {
            return Some(Mismatch::UndeclaredField(name.clone()));
        }
        for (name, descriptor) in structure.fields() {
            match fields.get(name) {
                None if !descriptor.is_optional() => {
                    return Some(Mismatch::MissingField(name.to_string()));
                }
                None => {}
                Some(value) => {
                    if !self.matches(descriptor, Some(value), &mut Assignment::new()) {
                        return Some(Mismatch::FieldType {
                            field: name.to_string(),
                            expected: descriptor.clone(),
                            found: value.clone(),
                        });
                    }
                }
            }
        }
        None
    }
}
