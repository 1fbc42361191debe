//! Reports behind the `tessel` binary.
//!
//! Each command loads its inputs, computes a report, and renders it as plain
//! text. The binary only maps reports to exit codes.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tessel_model::{EntityGraph, KindIndex, Mismatch, Validator};
use tessel_schema::{Analysis, DanglingRef, ImplicationChecker, Schema};
use tessel_types::EntityId;
use tracing::debug;

/// Reads a schema from a JSON file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    Schema::from_json(&text).with_context(|| format!("invalid schema {}", path.display()))
}

/// Reads an entity graph from a JSON file.
pub fn load_graph(path: &Path) -> Result<EntityGraph> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid entity graph {} (expected an object keyed by id)", path.display()))
}

// ── check ────────────────────────────────────────────────────────

/// Outcome of `tessel check`.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub analysis: Analysis,
    pub dangling: Vec<DanglingRef>,
}

impl CheckReport {
    #[must_use]
    pub fn new(schema: &Schema) -> Self {
        let analysis = ImplicationChecker::new(schema).analyze();
        debug!(kinds = schema.len(), passes = analysis.passes, "implication fixpoint reached");
        Self {
            analysis,
            dangling: schema.dangling_refs(),
        }
    }

    /// Whether no kind implies another. Dangling refs only warn.
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.analysis.is_coherent()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let kinds = self.analysis.matrix.kinds();
        let _ = writeln!(out, "kinds: {} ({})", kinds.len(), kinds.join(", "));
        let _ = writeln!(out, "fixpoint reached after {} pass(es)", self.analysis.passes);
        for d in &self.dangling {
            let _ = writeln!(
                out,
                "warning: {}.{} references undeclared kind {}",
                d.kind, d.field, d.missing
            );
        }
        if self.is_coherent() {
            let _ = writeln!(out, "coherent: no kind implies another");
        } else {
            let _ = writeln!(
                out,
                "incoherent: {} implication(s) found",
                self.analysis.problems.len()
            );
            for implication in &self.analysis.problems {
                let _ = writeln!(out, "  {implication}");
            }
        }
        out
    }
}

/// Loads `path` and audits it.
pub fn check_file(path: &Path) -> Result<CheckReport> {
    let schema = load_schema(path)?;
    Ok(CheckReport::new(&schema))
}

// ── validate ─────────────────────────────────────────────────────

/// Per-kind reasons one entity was rejected.
pub type Diagnostics = Vec<(String, Mismatch)>;

/// Outcome of `tessel validate`.
#[derive(Debug, Clone)]
pub enum ValidateReport {
    /// Every entity got a kind.
    Valid(KindIndex),
    /// Whole-graph validation stopped at `failed`. `unmatched` lists every
    /// entity whose diagnostics are reported, starting with `failed`.
    Invalid {
        failed: EntityId,
        unmatched: Vec<(EntityId, Diagnostics)>,
    },
}

impl ValidateReport {
    #[must_use]
    pub fn new(schema: &Schema, graph: &EntityGraph) -> Self {
        let validator = Validator::new(schema, graph);
        let failed = match validator.assign() {
            Ok(index) => return Self::Valid(index),
            Err(id) => id,
        };

        // The failing entity first, then every other entity that no kind
        // accepts even in isolation.
        let mut unmatched = Vec::new();
        if let Some(report) = validator.explain(failed.as_str()) {
            unmatched.push((failed.clone(), report));
        }
        for id in graph.ids().filter(|id| **id != failed) {
            let Some(report) = validator.explain(id.as_str()) else {
                continue;
            };
            if report.iter().all(|(_, m)| *m != Mismatch::Conflict) {
                unmatched.push((id.clone(), report));
            }
        }
        Self::Invalid { failed, unmatched }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Valid(index) => {
                let _ = writeln!(out, "valid: {} entities", index.len());
                for (id, kind) in index {
                    let _ = writeln!(out, "  {id}: {kind}");
                }
            }
            Self::Invalid { failed, unmatched } => {
                let _ = writeln!(out, "invalid: no kind accepts entity {failed}");
                for (id, report) in unmatched {
                    let _ = writeln!(out, "  {id}:");
                    if report.is_empty() {
                        let _ = writeln!(out, "    (schema declares no kinds)");
                    }
                    for (kind, mismatch) in report {
                        let _ = writeln!(out, "    {kind}: {mismatch}");
                    }
                }
            }
        }
        out
    }
}

/// Loads both files and validates the graph against the schema.
pub fn validate_files(schema: &Path, graph: &Path) -> Result<ValidateReport> {
    let schema = load_schema(schema)?;
    let graph = load_graph(graph)?;
    Ok(ValidateReport::new(&schema, &graph))
}
