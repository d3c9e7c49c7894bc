//! Value typing tests

use solax_exporter::solax::RawValue;
use solax_exporter::value::{type_value, TypedValue};

#[test]
fn test_numeric_string_becomes_number() {
    let raw = RawValue::from("12.5");
    assert_eq!(type_value(Some(&raw)), TypedValue::Number(12.5));
}

#[test]
fn test_negative_and_padded_numbers() {
    assert_eq!(
        type_value(Some(&RawValue::from("-150"))),
        TypedValue::Number(-150.0)
    );
    assert_eq!(
        type_value(Some(&RawValue::from(" 42 "))),
        TypedValue::Number(42.0)
    );
}

#[test]
fn test_non_numeric_string_passes_through() {
    let raw = RawValue::from("Waiting");
    assert_eq!(
        type_value(Some(&raw)),
        TypedValue::Text("Waiting".to_string())
    );
}

#[test]
fn test_comma_list_passes_through() {
    let raw = RawValue::from("1,0,3");
    assert_eq!(type_value(Some(&raw)), TypedValue::Text("1,0,3".to_string()));
}

#[test]
fn test_empty_string_passes_through() {
    assert_eq!(
        type_value(Some(&RawValue::from(""))),
        TypedValue::Text(String::new())
    );
}

#[test]
fn test_number_stays_number() {
    assert_eq!(
        type_value(Some(&RawValue::Number(3456.7))),
        TypedValue::Number(3456.7)
    );
}

#[test]
fn test_absent_key_is_unavailable() {
    let value = type_value(None);
    assert_eq!(value, TypedValue::Unavailable);
    assert!(!value.is_available());
    assert_eq!(value.as_number(), None);
}

#[test]
fn test_typed_value_serializes_untagged() {
    assert_eq!(
        serde_json::to_string(&TypedValue::Number(1.5)).unwrap(),
        "1.5"
    );
    assert_eq!(
        serde_json::to_string(&TypedValue::Text("Normal".to_string())).unwrap(),
        "\"Normal\""
    );
    assert_eq!(
        serde_json::to_string(&TypedValue::Unavailable).unwrap(),
        "null"
    );
}
