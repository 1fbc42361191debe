//! Static audit of a schema for structural ambiguity.
//!
//! Kind `A` implies kind `B` when every entity that validates as `A` would also
//! validate as `B` under strict-mode checking. Entities carry no discriminant
//! field, so such a pair makes kind dispatch depend on the order in which kinds
//! are tried. The checker computes the implication relation as a monotone
//! fixpoint: reference implication depends on the implication of the referenced
//! kinds, which may only be established in a later pass.

use crate::{Primitive, Schema, SchemaError, SchemaResult, Structure, TypeDescriptor};
use std::fmt;
use tracing::debug;

/// One off-diagonal `from => to` entry of the implication relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Implication {
    pub from: String,
    pub to: String,
}

impl fmt::Display for Implication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.from, self.to)
    }
}

/// Square boolean matrix indexed by kind position in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicationMatrix {
    kinds: Vec<String>,
    cells: Vec<bool>,
}

impl ImplicationMatrix {
    /// The reflexive seed: every kind implies itself and nothing else.
    #[must_use]
    pub fn identity(schema: &Schema) -> Self {
        let kinds: Vec<String> = schema.kind_names().map(str::to_string).collect();
        let n = kinds.len();
        let mut cells = vec![false; n * n];
        for i in 0..n {
            cells[i * n + i] = true;
        }
        Self { kinds, cells }
    }

    fn position(&self, kind: &str) -> Option<usize> {
        self.kinds.iter().position(|k| k == kind)
    }

    fn at(&self, a: usize, b: usize) -> bool {
        self.cells[a * self.kinds.len() + b]
    }

    fn set(&mut self, a: usize, b: usize) {
        let n = self.kinds.len();
        self.cells[a * n + b] = true;
    }

    /// Current entry for `a => b`. Unknown kinds never imply anything.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> bool {
        match (self.position(a), self.position(b)) {
            (Some(i), Some(j)) => self.at(i, j),
            _ => false,
        }
    }

    /// Kind names in matrix order.
    #[must_use]
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Off-diagonal true entries, row-major.
    #[must_use]
    pub fn off_diagonal(&self) -> Vec<Implication> {
        let n = self.kinds.len();
        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i != j && self.at(i, j) {
                    out.push(Implication {
                        from: self.kinds[i].clone(),
                        to: self.kinds[j].clone(),
                    });
                }
            }
        }
        out
    }
}

/// Result of a full analysis.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub matrix: ImplicationMatrix,
    pub problems: Vec<Implication>,
    /// Number of passes until the fixpoint was reached (including the last,
    /// unchanged pass).
    pub passes: usize,
}

impl Analysis {
    /// Whether `a => b` holds in the fixpoint.
    #[must_use]
    pub fn implies(&self, a: &str, b: &str) -> bool {
        self.matrix.get(a, b)
    }

    /// Whether no kind implies a different kind.
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Computes the implication relation between the kinds of a schema.
#[derive(Debug, Clone, Copy)]
pub struct ImplicationChecker<'a> {
    schema: &'a Schema,
}

impl<'a> ImplicationChecker<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Runs the fixpoint and collects every off-diagonal implication.
    #[must_use]
    pub fn analyze(&self) -> Analysis {
        let mut matrix = ImplicationMatrix::identity(self.schema);
        let kinds: Vec<(&str, &Structure)> = self.schema.kinds().collect();
        let mut passes = 0;

        loop {
            passes += 1;
            let mut changed = false;
            for (i, (a, sa)) in kinds.iter().enumerate() {
                for (j, (b, sb)) in kinds.iter().enumerate() {
                    if i == j || matrix.at(i, j) {
                        continue;
                    }
                    if implies_structures(sa, sb, &matrix) {
                        debug!(from = a, to = b, pass = passes, "implication found");
                        matrix.set(i, j);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let problems = matrix.off_diagonal();
        Analysis {
            matrix,
            problems,
            passes,
        }
    }

    /// Whether no kind implies a different kind.
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.analyze().is_coherent()
    }

    /// Fails with every `A => B` pair when the schema is incoherent.
    pub fn assert_coherent(&self) -> SchemaResult<()> {
        let analysis = self.analyze();
        if analysis.is_coherent() {
            Ok(())
        } else {
            Err(SchemaError::Incoherent {
                problems: analysis.problems,
            })
        }
    }

    /// Strict-mode structural implication `a => b` against `matrix`.
    ///
    /// Returns false when either kind is undeclared.
    #[must_use]
    pub fn implies_structure(&self, a: &str, b: &str, matrix: &ImplicationMatrix) -> bool {
        match (self.schema.kind(a), self.schema.kind(b)) {
            (Some(sa), Some(sb)) => implies_structures(sa, sb, matrix),
            _ => false,
        }
    }

    /// Descriptor implication `a => b` against `matrix`.
    #[must_use]
    pub fn implies_type(
        &self,
        a: &TypeDescriptor,
        b: &TypeDescriptor,
        matrix: &ImplicationMatrix,
    ) -> bool {
        implies_type(a, b, matrix)
    }
}

fn implies_structures(sa: &Structure, sb: &Structure, matrix: &ImplicationMatrix) -> bool {
    // An A-shaped object carrying a field B does not declare fails B's strict check.
    if sa.fields().any(|(name, _)| !sb.contains(name)) {
        return false;
    }

    sb.fields().all(|(name, tb)| {
        let ta = sa.get(name);
        if tb.is_optional() {
            match ta {
                None => true,
                Some(ta) => implies_type(ta.unwrap_optional(), tb.unwrap_optional(), matrix),
            }
        } else {
            match ta {
                Some(ta) if !ta.is_optional() => implies_type(ta, tb, matrix),
                _ => false,
            }
        }
    })
}

fn implies_type(a: &TypeDescriptor, b: &TypeDescriptor, matrix: &ImplicationMatrix) -> bool {
    use TypeDescriptor as T;

    match (a, b) {
        (T::Optional(x), T::Optional(y)) => implies_type(x, y, matrix),
        // An absent A-value has no B-counterpart.
        (T::Optional(_), _) => false,
        (_, T::Optional(y)) => implies_type(a, y, matrix),
        (T::Primitive(p), T::Primitive(q)) => p == q,
        (T::Union(_), T::Primitive(Primitive::String)) => true,
        (T::Union(xs), T::Union(ys)) => xs.is_subset(ys),
        (T::ArrayOf(x), T::ArrayOf(y)) => implies_type(x, y, matrix),
        (T::Ref(xs), T::Ref(ys)) => xs.iter().all(|x| ys.iter().any(|y| matrix.get(x, y))),
        _ => false,
    }
}
