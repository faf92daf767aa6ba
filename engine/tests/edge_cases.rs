//! Edge case tests for tally-engine
//!
//! These tests cover boundary conditions and unusual inputs.

use serde_json::{json, Value};
use tally_engine::{
    compute_view, Collection, Error, FieldDef, Metric, Page, Predicate, Record, Schema, SortSpec,
    SummarySpec, ViewConfig,
};

fn create_test_schema() -> Schema {
    Schema::new("items", "id")
        .with_field(FieldDef::text("id").not_searchable())
        .with_field(FieldDef::text("name"))
        .with_field(FieldDef::number("count").optional())
        .with_field(FieldDef::date("seen").optional())
}

fn item(id: &str, payload: Value) -> Record {
    let mut payload = payload;
    payload["id"] = json!(id);
    Record::new(id, payload)
}

fn sorted_ids(records: &[Record], schema: &Schema, sort: SortSpec) -> Vec<String> {
    let config = ViewConfig::builder().sort(sort).build(schema).unwrap();
    compute_view(records, schema, &config, &SummarySpec::new()).unwrap()
        .ids()
        .into_iter()
        .map(String::from)
        .collect()
}

// ============================================================================
// String Edge Cases
// ============================================================================

#[test]
fn empty_string_fields() {
    let schema = create_test_schema();
    let records = vec![
        item("a", json!({"name": ""})),
        item("b", json!({"name": "Cable"})),
    ];

    // Empty strings sort with the blanks
    assert_eq!(sorted_ids(&records, &schema, SortSpec::asc("name")), vec!["a", "b"]);
    assert_eq!(sorted_ids(&records, &schema, SortSpec::desc("name")), vec!["b", "a"]);
}

#[test]
fn unicode_strings() {
    let schema = create_test_schema();

    let unicode_names = vec![
        "日本語テスト",      // Japanese
        "Привет мир",        // Russian
        "مرحبا بالعالم",     // Arabic
        "🎉🚀💯",            // Emoji
        "Ω≈ç√∫",             // Math symbols
        "Hello\nWorld\tTab", // Whitespace
        "Null\0Test",        // Embedded null
    ];

    let records: Vec<Record> = unicode_names
        .iter()
        .enumerate()
        .map(|(i, name)| item(&format!("item_{}", i), json!({"name": name})))
        .collect();

    for (i, name) in unicode_names.iter().enumerate() {
        let config = ViewConfig::builder()
            .search_term(*name)
            .build(&schema)
            .unwrap();
        let view = compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap();

        assert_eq!(view.total_matches, 1, "Failed for: {}", name);
        assert_eq!(view.rows[0].id, format!("item_{}", i));
    }
}

#[test]
fn case_folding_beyond_ascii() {
    let schema = create_test_schema();
    let records = vec![item("1", json!({"name": "ÉCLAIR Café"}))];
    let config = ViewConfig::builder()
        .search_term("éclair")
        .build(&schema)
        .unwrap();

    assert_eq!(
        compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap().total_matches,
        1
    );
}

#[test]
fn very_long_strings() {
    let schema = create_test_schema();

    // 1MB string
    let long_string = "x".repeat(1024 * 1024);
    let records = vec![item("1", json!({"name": format!("{long_string}needle")}))];

    let config = ViewConfig::builder()
        .search_term("NEEDLE")
        .build(&schema)
        .unwrap();
    let view = compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap();
    assert_eq!(view.total_matches, 1);
}

#[test]
fn search_term_with_surrounding_whitespace() {
    let schema = create_test_schema();
    let records = vec![item("1", json!({"name": "Power Bank"}))];
    let config = ViewConfig::builder()
        .search_term("  power ")
        .build(&schema)
        .unwrap();

    assert_eq!(
        compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap().total_matches,
        1
    );
}

// ============================================================================
// Numeric Edge Cases
// ============================================================================

#[test]
fn integer_boundaries() {
    let schema = create_test_schema();
    let values = vec![i64::MAX, 0i64, i64::MIN, -1i64, 1i64];

    let records: Vec<Record> = values
        .iter()
        .enumerate()
        .map(|(i, value)| item(&i.to_string(), json!({"name": "n", "count": value})))
        .collect();

    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::asc("count")),
        vec!["2", "3", "1", "4", "0"]
    );
}

#[test]
fn floats_and_integers_mix() {
    let schema = create_test_schema();
    let records = vec![
        item("a", json!({"name": "a", "count": 10})),
        item("b", json!({"name": "b", "count": 9.5})),
        item("c", json!({"name": "c", "count": 100})),
    ];

    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::asc("count")),
        vec!["b", "a", "c"]
    );
}

#[test]
fn sum_of_large_values() {
    let schema = create_test_schema();
    let records = vec![
        item("a", json!({"name": "a", "count": 1e300})),
        item("b", json!({"name": "b", "count": 1e300})),
    ];
    let config = ViewConfig::default_for(&schema).unwrap();
    let summary = SummarySpec::new().with("total", Metric::sum("count"));

    let view = compute_view(&records, &schema, &config, &summary).unwrap();
    assert_eq!(view.summary["total"], 2e300);
}

// ============================================================================
// Missing and Mixed Values
// ============================================================================

#[test]
fn missing_values_sort_first_ascending_last_descending() {
    let schema = create_test_schema();
    let records = vec![
        item("has", json!({"name": "a", "count": 3})),
        item("null", json!({"name": "b", "count": null})),
        item("absent", json!({"name": "c"})),
        item("low", json!({"name": "d", "count": 1})),
    ];

    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::asc("count")),
        vec!["null", "absent", "low", "has"]
    );
    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::desc("count")),
        vec!["has", "low", "null", "absent"]
    );
}

#[test]
fn mistyped_values_sort_after_typed_ones() {
    let schema = create_test_schema();
    let records = vec![
        item("text", json!({"name": "a", "count": "many"})),
        item("two", json!({"name": "b", "count": 2})),
        item("one", json!({"name": "c", "count": 1})),
    ];

    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::asc("count")),
        vec!["one", "two", "text"]
    );
}

#[test]
fn blank_dates_sort_with_missing() {
    let schema = create_test_schema();
    let records = vec![
        item("late", json!({"name": "a", "seen": "2023-11-15T09:30:00"})),
        item("blank", json!({"name": "b", "seen": ""})),
        item("early", json!({"name": "c", "seen": "2023-10-15"})),
    ];

    assert_eq!(
        sorted_ids(&records, &schema, SortSpec::asc("seen")),
        vec!["blank", "early", "late"]
    );
}

#[test]
fn predicate_skips_missing_values() {
    let schema = create_test_schema();
    let records = vec![
        item("a", json!({"name": "a", "count": 3})),
        item("b", json!({"name": "b"})),
    ];
    let config = ViewConfig::builder()
        .predicate(Predicate::not_equals("count", 5))
        .build(&schema)
        .unwrap();

    let view = compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap();
    assert_eq!(view.ids(), vec!["a"]);
}

#[test]
fn non_object_payloads_match_nothing_by_field() {
    let schema = create_test_schema();
    let records = vec![Record::new("odd", json!([1, 2, 3]))];
    let config = ViewConfig::builder()
        .search_term("1")
        .build(&schema)
        .unwrap();

    let view = compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap();
    assert_eq!(view.total_matches, 0);
}

// ============================================================================
// Paging Edge Cases
// ============================================================================

#[test]
fn page_larger_than_rows() {
    let schema = create_test_schema();
    let records = vec![item("a", json!({"name": "a"})), item("b", json!({"name": "b"}))];
    let config = ViewConfig::builder()
        .page(Page::new(1, usize::MAX))
        .build(&schema)
        .unwrap();

    let view = compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap();
    assert_eq!(view.ids(), vec!["b"]);
    assert_eq!(view.total_matches, 2);
}

#[test]
fn offset_at_usize_max() {
    let schema = create_test_schema();
    let records = vec![item("a", json!({"name": "a"}))];
    let config = ViewConfig::builder()
        .page(Page::new(usize::MAX, 10))
        .build(&schema)
        .unwrap();

    assert!(compute_view(&records, &schema, &config, &SummarySpec::new()).unwrap().is_empty());
}

// ============================================================================
// Collection Edge Cases
// ============================================================================

#[test]
fn ids_with_special_characters() {
    let schema = create_test_schema();
    let ids = [
        "with space",
        "with/slash",
        "with:colon",
        "émoji🎉",
        "a-very-long-id-that-goes-on-and-on-and-on-and-on-and-on",
    ];

    let mut collection = Collection::new(schema);
    for id in ids {
        collection
            .insert_payload(json!({"id": id, "name": "x"}))
            .unwrap();
    }

    for id in ids {
        assert!(collection.contains(id), "missing {}", id);
    }
    assert_eq!(collection.remove("with/slash").unwrap().id, "with/slash");
    assert_eq!(collection.len(), ids.len() - 1);
}

#[test]
fn numeric_ids_become_strings() {
    let schema = Schema::new("numbers", "id")
        .with_field(FieldDef::number("id"))
        .with_field(FieldDef::text("name"));
    let mut collection = Collection::new(schema);

    let id = collection
        .insert_payload(json!({"id": 42, "name": "answer"}))
        .unwrap();
    assert_eq!(id, "42");
    assert!(collection.get("42").is_some());
}

#[test]
fn payload_without_id_is_rejected() {
    let mut collection = Collection::new(create_test_schema());
    let result = collection.insert_payload(json!({"name": "anonymous"}));

    assert!(matches!(result, Err(Error::MissingRequiredField(f)) if f == "id"));
    assert!(collection.is_empty());
}

#[test]
fn deeply_nested_payload_values() {
    let schema = create_test_schema();

    // Create deeply nested JSON (50 levels)
    let mut nested = json!({"value": "leaf"});
    for _ in 0..50 {
        nested = json!({"nested": nested});
    }

    let mut collection = Collection::new(schema);
    collection
        .insert_payload(json!({"id": "deep", "name": "deep", "extra": nested}))
        .unwrap();

    let record = collection.get("deep").unwrap();
    assert_eq!(record.get("extra"), Some(&nested));
}
