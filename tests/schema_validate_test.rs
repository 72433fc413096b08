//! Tests for validating typed values against schemas.

use chrono::{NaiveDate, TimeZone, Utc};
use enforcer::{Enforcer, Schema, SchemaBuilder, Value, Version};
use serde_json::json;

fn enforcer() -> Enforcer {
    Enforcer::new(Version::V3)
}

fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

#[test]
fn test_valid_value_returns_none() {
    let schema = Schema::object()
        .field("id", Schema::integer().minimum(1.0))
        .field("name", Schema::string().min_length(1).max_length(20))
        .optional("tags", Schema::array(Schema::string()).unique_items())
        .build();

    let result = enforcer().validate(
        &schema,
        &value(json!({"id": 7, "name": "Rex", "tags": ["a", "b"]})),
    );
    assert!(result.is_none());
}

#[test]
fn test_every_problem_is_reported() {
    let schema = Schema::object()
        .field("id", Schema::integer().minimum(1.0))
        .field("name", Schema::string().min_length(1))
        .field("owner", Schema::string())
        .optional("tags", Schema::array(Schema::string()).max_items(2))
        .build();

    let exception = enforcer()
        .validate(
            &schema,
            &value(json!({"id": 0, "name": "", "tags": ["a", 1, "c"]})),
        )
        .unwrap();

    assert_eq!(exception.count(), 5);
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: id: Expected number to be greater than or equal to 1. Received: 0"
                .to_string(),
            "Invalid value: name: Expected at least 1 characters. Received 0".to_string(),
            "Invalid value: tags[1]: Expected a string. Received: 1".to_string(),
            "Invalid value: tags: Too many items in the array. Expected at most 2. Received 3"
                .to_string(),
            "Invalid value: Missing required properties: owner".to_string(),
        ]
    );
}

#[test]
fn test_wrong_container_type() {
    let schema = Schema::array(Schema::integer()).build();
    let exception = enforcer().validate(&schema, &value(json!({"a": 1}))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Expected an array. Received: {\"a\":1}".to_string()]
    );

    let schema = Schema::object().build();
    let exception = enforcer().validate(&schema, &value(json!([1]))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Expected an object. Received: [1]".to_string()]
    );
}

#[test]
fn test_enum_membership_is_by_value() {
    let schema = Schema::array(Schema::integer())
        .enumeration([value(json!([1, 2])), value(json!([3, 4]))])
        .build();

    assert!(enforcer().validate(&schema, &value(json!([1, 2]))).is_none());
    assert!(enforcer().validate(&schema, &value(json!([3, 4]))).is_none());

    let exception = enforcer().validate(&schema, &value(json!([1, 2, 1]))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: Value must be one of the enumerated values: [1,2], [3,4]. Received: [1,2,1]"
                .to_string()
        ]
    );
}

#[test]
fn test_date_enum_accepts_typed_dates() {
    let enforcer = enforcer();
    let schema = Schema::string()
        .format("date")
        .enumeration(["2020-01-01", "2020-06-30"])
        .build();

    let typed = enforcer
        .deserialize(&schema, &value(json!("2020-01-01")), false)
        .into_result()
        .unwrap();
    assert_eq!(typed, Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
    assert!(enforcer.validate(&schema, &typed).is_none());

    let other = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
    let exception = enforcer.validate(&schema, &other).unwrap();
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: Value must be one of the enumerated values: \"2020-01-01\", \"2020-06-30\". Received: \"2020-01-02\""
                .to_string()
        ]
    );
}

#[test]
fn test_date_time_enum_compares_instants() {
    let schema = Schema::string()
        .format("date-time")
        .enumeration(["2020-01-01T12:00:00+02:00"])
        .build();

    let same_instant = Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap());
    assert!(enforcer().validate(&schema, &same_instant).is_none());

    let later = Value::DateTime(Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap());
    assert_eq!(enforcer().validate(&schema, &later).map(|e| e.count()), Some(1));
}

#[test]
fn test_check_example_accepts_matching_date_enum() {
    let schema = Schema::string()
        .format("date")
        .enumeration(["2020-01-01"])
        .example("2020-01-01")
        .build();

    let result = enforcer().check_example(&schema);
    assert!(result.is_ok());
    assert!(result.warning().is_none());
}

#[test]
fn test_nullable() {
    let plain = Schema::string().build();
    let nullable = Schema::string().nullable().build();

    let exception = enforcer().validate(&plain, &Value::Null).unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Null value is not allowed".to_string()]
    );
    assert!(enforcer().validate(&nullable, &Value::Null).is_none());
    assert!(enforcer().validate(&Schema::any().build(), &Value::Null).is_none());
}

#[test]
fn test_numeric_constraints() {
    let schema = Schema::number()
        .exclusive_minimum(0.0)
        .maximum(10.0)
        .multiple_of(0.5)
        .build();

    assert!(enforcer().validate(&schema, &Value::Number(2.5)).is_none());
    assert!(enforcer().validate(&schema, &Value::Integer(10)).is_none());
    assert!(enforcer().validate(&schema, &Value::Integer(0)).is_some());
    assert!(enforcer().validate(&schema, &Value::Number(10.5)).is_some());

    let exception = enforcer().validate(&schema, &Value::Number(0.3)).unwrap();
    assert_eq!(exception.count(), 1);
}

#[test]
fn test_int32_range() {
    let schema = Schema::integer().format("int32").build();
    assert!(enforcer().validate(&schema, &Value::Integer(2_147_483_647)).is_none());

    let exception = enforcer()
        .validate(&schema, &Value::Integer(2_147_483_648))
        .unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Expected a 32-bit integer. Received: 2147483648".to_string()]
    );
}

#[test]
fn test_pattern() {
    let schema = Schema::string().pattern("^[a-z]+$").unwrap().build();
    assert!(enforcer().validate(&schema, &value(json!("abc"))).is_none());
    assert!(enforcer().validate(&schema, &value(json!("abc1"))).is_some());
}

#[test]
fn test_additional_properties() {
    let closed = Schema::object()
        .optional("a", Schema::integer())
        .additional_properties(false)
        .build();
    let exception = enforcer()
        .validate(&closed, &value(json!({"a": 1, "b": 2, "c": 3})))
        .unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Properties not allowed: b, c".to_string()]
    );

    let typed = Schema::object()
        .additional_properties(Schema::integer().build())
        .build();
    assert!(enforcer().validate(&typed, &value(json!({"x": 1}))).is_none());

    let exception = enforcer()
        .validate(&typed, &value(json!({"x": "one"})))
        .unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: x: Expected an integer. Received: \"one\"".to_string()]
    );
}

#[test]
fn test_property_count_bounds() {
    let schema = Schema::object().min_properties(1).max_properties(2).build();
    assert!(enforcer().validate(&schema, &value(json!({"a": 1}))).is_none());
    assert!(enforcer().validate(&schema, &value(json!({}))).is_some());
    assert!(enforcer()
        .validate(&schema, &value(json!({"a": 1, "b": 2, "c": 3})))
        .is_some());
}

#[test]
fn test_typed_formats_validate_typed_values() {
    let enforcer = enforcer();
    let date = Schema::string()
        .format("date")
        .minimum("2020-01-01")
        .build();

    let typed = enforcer
        .deserialize(&date, &value(json!("2020-06-01")), false)
        .into_result()
        .unwrap();
    assert!(enforcer.validate(&date, &typed).is_none());

    // The wire form is not a date yet
    assert!(enforcer.validate(&date, &value(json!("2020-06-01"))).is_some());

    let early = enforcer
        .deserialize(&date, &value(json!("2019-12-31")), false)
        .into_result()
        .unwrap();
    assert!(enforcer.validate(&date, &early).is_some());
}

#[test]
fn test_byte_length_applies_to_bytes() {
    let schema = Schema::string().format("byte").max_length(2).build();
    assert!(enforcer().validate(&schema, &Value::Bytes(vec![1, 2])).is_none());

    let exception = enforcer()
        .validate(&schema, &Value::Bytes(vec![1, 2, 3]))
        .unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Expected at most 2 bytes. Received 3".to_string()]
    );
}

#[test]
fn test_references_are_followed() {
    let enforcer = enforcer();
    enforcer
        .definitions()
        .register("Id", Schema::integer().minimum(1.0))
        .unwrap();
    let schema = Schema::object()
        .field("id", Schema::reference("#/components/schemas/Id"))
        .build();

    assert!(enforcer.validate(&schema, &value(json!({"id": 3}))).is_none());
    assert!(enforcer.validate(&schema, &value(json!({"id": 0}))).is_some());

    let missing = Schema::reference("Nope");
    let exception = enforcer.validate(&missing, &value(json!(1))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Unresolved schema reference \"Nope\"".to_string()]
    );
}

#[test]
fn test_validate_named() {
    let enforcer = enforcer();
    enforcer
        .definitions()
        .register("Name", Schema::string().min_length(2))
        .unwrap();

    assert!(enforcer
        .validate_named("Name", &value(json!("Al")))
        .unwrap()
        .is_none());
    assert!(enforcer
        .validate_named("Name", &value(json!("A")))
        .unwrap()
        .is_some());
    assert!(enforcer.validate_named("Other", &value(json!("A"))).is_err());
}

#[test]
fn test_check_example_reports_warnings_only() {
    let enforcer = enforcer();
    let schema = Schema::object()
        .field("born", Schema::string().format("date").example("not a date"))
        .field(
            "tags",
            Schema::array(Schema::string().example("fine")).example(json!(["a", 1])),
        )
        .example(json!({"born": "2020-01-01", "tags": []}))
        .build();

    let result = enforcer.check_example(&schema);
    assert!(result.is_ok());
    assert!(result.error().is_none());

    let warning = result.warning().unwrap();
    assert_eq!(warning.count(), 2);
    assert!(warning.get("born").is_some_and(|w| w.has_exception()));
    assert!(warning.get("tags").is_some_and(|w| w.has_exception()));
}
