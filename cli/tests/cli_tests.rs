use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use tessel_cli::{CheckReport, ValidateReport, check_file, load_graph, validate_files};
use tessel_model::Mismatch;
use tessel_types::EntityId;

const CELL_SCHEMA: &str = r#"{
    "Cell": {"nom": "string", "state": "boolean", "p": {"ref": ["Point"]}},
    "Groupe": {"state": "boolean", "membres": {"arrayOf": {"ref": ["Cell"]}}},
    "Point": {"x": "number", "y": "number"}
}"#;

const AMBIGUOUS_SCHEMA: &str = r#"{
    "A": {"x": "number"},
    "B": {"x": "number", "y": {"optional": "number"}}
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// ── check ────────────────────────────────────────────────────────

#[test]
fn check_coherent_schema() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.json", CELL_SCHEMA);

    let report = check_file(&path).unwrap();
    assert!(report.is_coherent());
    let text = report.render();
    assert!(text.starts_with("kinds: 3 (Cell, Groupe, Point)\n"));
    assert!(text.contains("coherent: no kind implies another"));
}

#[test]
fn check_incoherent_schema_lists_pairs() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.json", AMBIGUOUS_SCHEMA);

    let report = check_file(&path).unwrap();
    assert!(!report.is_coherent());
    let text = report.render();
    assert!(text.contains("incoherent: 1 implication(s) found\n  A => B\n"));
}

#[test]
fn check_warns_about_dangling_refs() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "schema.json", r#"{"Cell": {"p": {"ref": ["Ghost"]}}}"#);

    let report = check_file(&path).unwrap();
    assert_eq!(report.dangling.len(), 1);
    assert!(report
        .render()
        .contains("warning: Cell.p references undeclared kind Ghost"));
}

#[test]
fn check_reports_unreadable_and_malformed_files() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let err = check_file(&missing).unwrap_err();
    assert!(err.to_string().starts_with("failed to read schema"));

    let bad = write(&dir, "bad.json", r#"{"Cell": {"x": "integer"}}"#);
    let err = check_file(&bad).unwrap_err();
    assert!(err.to_string().starts_with("invalid schema"));
}

#[test]
fn empty_schema_is_coherent() {
    let report = CheckReport::new(&Default::default());
    assert!(report.is_coherent());
    assert!(report.render().starts_with("kinds: 0 ()\n"));
}

// ── validate ─────────────────────────────────────────────────────

#[test]
fn validate_assigns_kinds_in_graph_order() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", CELL_SCHEMA);
    let graph = write(
        &dir,
        "graph.json",
        r#"{
            "g": {"state": false, "membres": [{"ref": "c"}]},
            "c": {"nom": "A", "state": true, "p": {"ref": "p"}},
            "p": {"x": 45, "y": 7}
        }"#,
    );

    let report = validate_files(&schema, &graph).unwrap();
    assert!(report.is_valid());
    assert_eq!(
        report.render(),
        "valid: 3 entities\n  g: Groupe\n  c: Cell\n  p: Point\n"
    );
}

#[test]
fn validate_explains_rejected_entities() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", CELL_SCHEMA);
    let graph = write(
        &dir,
        "graph.json",
        r#"{
            "p": {"x": 1, "y": 2},
            "c": {"nom": 3, "state": true, "p": {"ref": "p"}},
            "q": {"x": 1}
        }"#,
    );

    let report = validate_files(&schema, &graph).unwrap();
    let ValidateReport::Invalid { failed, unmatched } = &report else {
        panic!("expected a rejected graph");
    };
    assert_eq!(failed, &EntityId::new("c"));
    let ids: Vec<&str> = unmatched.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["c", "q"]);
    assert_eq!(
        unmatched[1].1[2],
        ("Point".to_string(), Mismatch::MissingField("y".into()))
    );

    let text = report.render();
    assert!(text.starts_with("invalid: no kind accepts entity c\n"));
    assert!(text.contains("    Cell: field \"nom\": expected string, found 3\n"));
    assert!(text.contains("    Point: required field \"y\" is missing\n"));
}

#[test]
fn validate_rejects_non_object_graph() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", CELL_SCHEMA);
    let graph = write(&dir, "graph.json", "[1, 2, 3]");

    let err = validate_files(&schema, &graph).unwrap_err();
    assert!(err.to_string().contains("expected an object keyed by id"));
    assert!(load_graph(&graph).is_err());
}
