use serde_json::json;
use tessel_model::{EntityGraph, EntityView};
use tessel_types::{EntityId, RefToken};

fn view<'a>(id: &'a EntityId, data: &'a serde_json::Value) -> EntityView<'a> {
    EntityView {
        id,
        kind: "Cell",
        data,
    }
}

// ── EntityGraph ──────────────────────────────────────────────────

#[test]
fn graph_from_value_requires_object() {
    assert!(EntityGraph::from_value(json!({})).is_some());
    assert!(EntityGraph::from_value(json!([])).is_none());
    assert!(EntityGraph::from_value(json!(null)).is_none());
    assert!(EntityGraph::from_value(json!("graph")).is_none());
}

#[test]
fn graph_insert_and_lookup() {
    let mut g = EntityGraph::new();
    g.insert("$0", json!({"x": 1}));
    g.insert(EntityId::new("$1"), json!({"x": 2}));

    assert_eq!(g.len(), 2);
    assert!(g.contains("$0"));
    assert_eq!(g.get("$1"), Some(&json!({"x": 2})));
    assert_eq!(g.get("$9"), None);
}

#[test]
fn graph_preserves_insertion_order() {
    let mut g = EntityGraph::new();
    g.insert("b", json!({}));
    g.insert("a", json!({}));
    g.insert("c", json!({}));
    let ids: Vec<&str> = g.ids().map(EntityId::as_str).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[test]
fn graph_serializes_as_plain_object() {
    let mut g = EntityGraph::new();
    g.insert("$0", json!({"p": {"ref": "$1"}}));
    g.insert("$1", json!({"x": 1}));
    let v = serde_json::to_value(&g).unwrap();
    assert_eq!(v, json!({"$0": {"p": {"ref": "$1"}}, "$1": {"x": 1}}));
    assert_eq!(g.to_value(), v);
}

#[test]
fn graph_deserialize_keeps_document_order() {
    let g: EntityGraph = serde_json::from_str(r#"{"z": {}, "a": {}}"#).unwrap();
    let ids: Vec<&str> = g.ids().map(EntityId::as_str).collect();
    assert_eq!(ids, vec!["z", "a"]);
}

// ── EntityView accessors ─────────────────────────────────────────

#[test]
fn view_pointer_accessors() {
    let id = EntityId::new("$0");
    let data = json!({"nom": "a", "state": true, "n": 2, "meta": {"w": 1.5}});
    let v = view(&id, &data);

    assert_eq!(v.get_str("/nom"), Some("a"));
    assert_eq!(v.get_bool("/state"), Some(true));
    assert_eq!(v.get_number("/n"), Some(2.0));
    assert_eq!(v.get_number("/meta/w"), Some(1.5));
    assert_eq!(v.get_str("/state"), None);
    assert_eq!(v.get_bool("/missing"), None);
}

#[test]
fn view_reads_refs() {
    let id = EntityId::new("$0");
    let data = json!({
        "p": {"ref": "$1"},
        "membres": [{"ref": "$2"}, "junk", {"ref": "$3"}],
        "nom": "x"
    });
    let v = view(&id, &data);

    assert_eq!(v.get_ref("p"), Some(RefToken::new("$1")));
    assert_eq!(v.get_ref("nom"), None);
    assert_eq!(
        v.get_refs("membres"),
        vec![RefToken::new("$2"), RefToken::new("$3")]
    );
    assert!(v.get_refs("nom").is_empty());
    assert!(v.get_refs("missing").is_empty());
}

#[test]
fn view_get_top_level_field() {
    let id = EntityId::new("$0");
    let data = json!({"x": [1, 2]});
    let v = view(&id, &data);
    assert_eq!(v.get("x"), Some(&json!([1, 2])));
    assert_eq!(v.get("y"), None);
}
