use proptest::prelude::*;
use serde_json::json;
use std::str::FromStr;
use tessel_types::{EntityId, IdMint, RefToken, DEFAULT_ID_PREFIX};

// ── EntityId ──────────────────────────────────────────────────────

#[test]
fn entity_id_display_matches_inner() {
    let id = EntityId::new("$3");
    assert_eq!(id.to_string(), "$3");
    assert_eq!(id.as_str(), "$3");
}

#[test]
fn entity_id_parse_rejects_empty() {
    assert!(EntityId::parse("").is_err());
    assert!(EntityId::from_str("").is_err());
}

#[test]
fn entity_id_from_str_accepts_any_non_empty() {
    let id: EntityId = "cell-a".parse().unwrap();
    assert_eq!(id, EntityId::from("cell-a"));
}

#[test]
fn entity_id_serializes_transparently() {
    let id = EntityId::new("$0");
    assert_eq!(serde_json::to_value(&id).unwrap(), json!("$0"));
    let back: EntityId = serde_json::from_value(json!("$0")).unwrap();
    assert_eq!(back, id);
}

#[test]
fn entity_id_borrows_as_str_for_map_lookup() {
    let mut map = std::collections::HashMap::new();
    map.insert(EntityId::new("x"), 1);
    assert_eq!(map.get("x"), Some(&1));
}

// ── IdMint ────────────────────────────────────────────────────────

#[test]
fn mint_produces_sequential_ids() {
    let mut mint = IdMint::new();
    assert_eq!(mint.prefix(), DEFAULT_ID_PREFIX);
    assert_eq!(mint.mint().as_str(), "$0");
    assert_eq!(mint.mint().as_str(), "$1");
    assert_eq!(mint.peek(), 2);
}

#[test]
fn mint_observe_skips_past_adopted_ids() {
    let mut mint = IdMint::new();
    mint.observe(&EntityId::new("$7"));
    assert_eq!(mint.mint().as_str(), "$8");
}

#[test]
fn mint_observe_ignores_lower_and_foreign_ids() {
    let mut mint = IdMint::new();
    mint.observe(&EntityId::new("$4"));
    mint.observe(&EntityId::new("$2"));
    mint.observe(&EntityId::new("cell"));
    mint.observe(&EntityId::new("#99"));
    assert_eq!(mint.peek(), 5);
}

#[test]
fn mint_observe_ignores_counter_without_successor() {
    let mut mint = IdMint::new();
    mint.observe(&EntityId::new("$3"));
    mint.observe(&EntityId::new(format!("${}", u64::MAX)));
    assert_eq!(mint.peek(), 4);
}

#[test]
fn mint_wraps_at_counter_limit() {
    let mut mint = IdMint::new();
    mint.observe(&EntityId::new(format!("${}", u64::MAX - 1)));
    assert_eq!(mint.mint().as_str(), format!("${}", u64::MAX));
    assert_eq!(mint.mint().as_str(), "$0");
}

#[test]
fn mint_with_custom_prefix() {
    let mut mint = IdMint::with_prefix("node-");
    mint.observe(&EntityId::new("$10"));
    assert_eq!(mint.mint().as_str(), "node-0");
}

// ── RefToken ──────────────────────────────────────────────────────

#[test]
fn ref_token_wire_shape() {
    let token = RefToken::new("$1");
    assert_eq!(serde_json::to_value(&token).unwrap(), json!({"ref": "$1"}));
    assert_eq!(token.to_value(), json!({"ref": "$1"}));
}

#[test]
fn ref_token_from_value() {
    let token = RefToken::from_value(&json!({"ref": "$2"})).unwrap();
    assert_eq!(token.id().as_str(), "$2");
}

#[test]
fn ref_token_from_value_rejects_non_refs() {
    assert!(RefToken::from_value(&json!("$2")).is_err());
    assert!(RefToken::from_value(&json!({"ref": 2})).is_err());
    assert!(RefToken::from_value(&json!([{"ref": "$2"}])).is_err());
    assert!(RefToken::from_value(&json!(null)).is_err());
}

#[test]
fn ref_token_peek() {
    assert_eq!(RefToken::peek(&json!({"ref": "a"})), Some("a"));
    assert_eq!(RefToken::peek(&json!({"other": "a"})), None);
}

// ── Properties ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn minted_ids_are_unique(n in 1usize..200) {
        let mut mint = IdMint::new();
        let ids: std::collections::HashSet<_> = (0..n).map(|_| mint.mint()).collect();
        prop_assert_eq!(ids.len(), n);
    }

    #[test]
    fn observe_then_mint_never_collides(seen in 0u64..10_000) {
        let mut mint = IdMint::new();
        let adopted = EntityId::new(format!("${seen}"));
        mint.observe(&adopted);
        prop_assert_ne!(mint.mint(), adopted);
    }
}
