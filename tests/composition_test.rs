//! Tests for allOf / anyOf / oneOf / not and discriminator dispatch.

use std::time::{Duration, Instant};

use enforcer::{Discriminator, Enforcer, Schema, SchemaBuilder, Value, Version};
use serde_json::json;

fn value(json: serde_json::Value) -> Value {
    Value::from(json)
}

/// `Pet` carries an inheritance-style discriminator; `Cat` and `Dog` extend
/// it through `allOf`; `Animal` picks one of them.
fn pets(version: Version) -> Enforcer {
    let enforcer = Enforcer::new(version);
    let definitions = enforcer.definitions();
    definitions
        .register(
            "Pet",
            Schema::object()
                .field("petType", Schema::string())
                .field("name", Schema::string())
                .discriminator(Discriminator::new("petType")),
        )
        .unwrap();
    definitions
        .register(
            "Cat",
            Schema::all_of([
                Schema::reference("Pet").into(),
                Schema::object()
                    .field("huntingSkill", Schema::string())
                    .shared(),
            ]),
        )
        .unwrap();
    definitions
        .register(
            "Dog",
            Schema::all_of([
                Schema::reference("Pet").into(),
                Schema::object()
                    .field("packSize", Schema::integer().minimum(0.0))
                    .shared(),
            ]),
        )
        .unwrap();
    definitions
        .register(
            "Animal",
            Schema::one_of([Schema::reference("Cat"), Schema::reference("Dog")])
                .discriminator(Discriminator::new("petType")),
        )
        .unwrap();
    enforcer
}

#[test]
fn test_all_of_reports_each_branch() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::all_of([
        Schema::object().field("a", Schema::integer()),
        Schema::object().field("b", Schema::string()),
    ])
    .build();

    assert!(enforcer
        .validate(&schema, &value(json!({"a": 1, "b": "x"})))
        .is_none());

    let exception = enforcer.validate(&schema, &value(json!({"a": "1"}))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: Did not validate against all schemas: [0].a: Expected an integer. Received: \"1\""
                .to_string(),
            "Invalid value: Did not validate against all schemas: [1]: Missing required properties: b"
                .to_string(),
        ]
    );
}

#[test]
fn test_all_of_merges_conversions() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::all_of([
        Schema::object().field("born", Schema::string().format("date")),
        Schema::object().field("name", Schema::string()),
    ])
    .build();

    let typed = enforcer
        .deserialize(&schema, &value(json!({"born": "2000-01-01", "name": "x"})), false)
        .into_result()
        .unwrap();
    assert!(matches!(typed.get("born"), Some(Value::Date(_))));
    assert_eq!(typed.get("name"), Some(Value::from("x")));
}

#[test]
fn test_any_of_accepts_the_first_match() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::any_of([
        Schema::string().format("date").build(),
        Schema::string().build(),
    ])
    .build();

    let typed = enforcer
        .deserialize(&schema, &value(json!("2021-02-03")), false)
        .into_value();
    assert!(matches!(typed, Some(Value::Date(_))));

    let typed = enforcer
        .deserialize(&schema, &value(json!("tomorrow")), false)
        .into_value();
    assert_eq!(typed, Some(Value::from("tomorrow")));

    let result = enforcer.deserialize(&schema, &Value::Integer(3), false);
    let error = result.error().unwrap();
    assert_eq!(error.count(), 2);
    assert!(error.flatten()[0].contains("Did not validate against any schemas"));
}

#[test]
fn test_one_of_requires_exactly_one_match() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::one_of([
        Schema::integer().maximum(10.0).build(),
        Schema::integer().minimum(5.0).build(),
    ])
    .build();

    assert!(enforcer.validate(&schema, &Value::Integer(1)).is_none());
    assert!(enforcer.validate(&schema, &Value::Integer(20)).is_none());

    let both = enforcer.validate(&schema, &Value::Integer(7)).unwrap();
    assert_eq!(
        both.flatten(),
        vec![
            "Invalid value: Value matched 2 schemas (indexes 0, 1). Expected exactly one"
                .to_string()
        ]
    );

    let neither = enforcer.validate(&schema, &value(json!("7"))).unwrap();
    assert_eq!(neither.count(), 2);
    assert!(neither.flatten()[0].contains("Did not validate against exactly one schema"));
}

#[test]
fn test_one_of_exclusivity_on_deserialize() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::one_of([
        Schema::string().format("date").build(),
        Schema::string().pattern("^[a-z]+$").unwrap().build(),
    ])
    .build();

    let typed = enforcer
        .deserialize(&schema, &value(json!("2020-01-01")), false)
        .into_value();
    assert!(matches!(typed, Some(Value::Date(_))));

    let typed = enforcer
        .deserialize(&schema, &value(json!("abc")), false)
        .into_value();
    assert_eq!(typed, Some(Value::from("abc")));

    let result = enforcer.deserialize(&schema, &value(json!("ABC1")), false);
    assert!(!result.is_ok());
}

fn tagged_branches() -> Schema {
    Schema::one_of([
        Schema::object()
            .field("a", Schema::integer())
            .additional_properties(false)
            .shared(),
        Schema::object()
            .field("b", Schema::integer())
            .additional_properties(false)
            .shared(),
    ])
    .build()
}

#[test]
fn test_one_of_over_a_large_array_is_linear() {
    let enforcer = Enforcer::new(Version::V3);
    enforcer.definitions().register("Item", tagged_branches()).unwrap();
    let schema = Schema::array(Schema::reference("Item")).build();
    let items: Vec<Value> = (0..20_000)
        .map(|i| Value::object([("a", Value::Integer(i))]))
        .collect();
    let wire = Value::array(items);

    let started = Instant::now();
    assert!(enforcer.validate(&schema, &wire).is_none());
    let typed = enforcer
        .deserialize(&schema, &wire, false)
        .into_result()
        .unwrap();
    assert_eq!(typed.items().map(|items| items.len()), Some(20_000));
    assert!(
        started.elapsed() < Duration::from_secs(15),
        "took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_one_of_keeps_the_visits_of_the_matching_branch() {
    let enforcer = Enforcer::new(Version::V3);
    let definitions = enforcer.definitions();
    definitions
        .register(
            "Leaf",
            Schema::object()
                .field("a", Schema::integer())
                .optional("self", Schema::reference("Leaf"))
                .additional_properties(false),
        )
        .unwrap();
    definitions
        .register(
            "Item",
            Schema::one_of([
                Schema::reference("Leaf").into(),
                Schema::object()
                    .field("b", Schema::integer())
                    .additional_properties(false)
                    .shared(),
            ]),
        )
        .unwrap();
    let schema = Schema::object()
        .field("first", Schema::reference("Item"))
        .field("second", Schema::reference("Leaf"))
        .build();

    let leaf = Value::object([("a", Value::Integer(1))]);
    leaf.insert("self", leaf.clone());
    let wire = Value::object([("first", leaf.clone()), ("second", leaf)]);

    let typed = enforcer
        .deserialize(&schema, &wire, false)
        .into_result()
        .unwrap();
    let converted = typed.get("first").unwrap().get("self").unwrap();
    assert_eq!(converted.get("self").unwrap().identity(), converted.identity());
    // The leaf converted inside the matching branch is reused
    assert_eq!(typed.get("second").unwrap().identity(), converted.identity());
}

#[test]
fn test_not() {
    let enforcer = Enforcer::new(Version::V3);
    let schema = Schema::not(Schema::string()).build();

    assert!(enforcer.validate(&schema, &Value::Integer(1)).is_none());
    let exception = enforcer.validate(&schema, &value(json!("x"))).unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Value should not validate against the schema".to_string()]
    );
}

#[test]
fn test_inheritance_discriminator_dispatch() {
    let enforcer = pets(Version::V3);

    let dog = value(json!({"petType": "Dog", "name": "Rex", "packSize": 2}));
    assert!(enforcer.validate_named("Pet", &dog).unwrap().is_none());

    let bad_dog = value(json!({"petType": "Dog", "name": "Rex", "packSize": -1}));
    let exception = enforcer.validate_named("Pet", &bad_dog).unwrap().unwrap();
    assert_eq!(exception.count(), 1);

    let mouse = value(json!({"petType": "Mouse", "name": "Jerry"}));
    let exception = enforcer.validate_named("Pet", &mouse).unwrap().unwrap();
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: Discriminator property \"petType\" value \"Mouse\" mapped to no schema"
                .to_string()
        ]
    );
}

#[test]
fn test_one_of_discriminator_still_checks_the_base() {
    let enforcer = pets(Version::V3);

    let cat = value(json!({"petType": "Cat", "name": "Tom", "huntingSkill": "lazy"}));
    assert!(enforcer.validate_named("Animal", &cat).unwrap().is_none());

    // The base Pet requires a name even when reached through Animal -> Cat
    let nameless = value(json!({"petType": "Cat", "huntingSkill": "lazy"}));
    let exception = enforcer.validate_named("Animal", &nameless).unwrap().unwrap();
    assert_eq!(exception.count(), 1);
    assert!(exception.flatten()[0].ends_with("Missing required properties: name"));

    let missing = value(json!({"name": "Tom"}));
    let exception = enforcer.validate_named("Animal", &missing).unwrap().unwrap();
    assert_eq!(
        exception.flatten(),
        vec!["Invalid value: Missing required discriminator property \"petType\"".to_string()]
    );
}

#[test]
fn test_discriminator_lookup() {
    let enforcer = pets(Version::V3);
    let animal = enforcer.definitions().get("Animal").unwrap();

    let found = enforcer
        .discriminator(&animal, &value(json!({"petType": "Dog"})))
        .unwrap();
    assert_eq!(found.key.as_deref(), Some("Dog"));
    assert!(found.schema.is_some());

    let absent = enforcer.discriminator(&animal, &value(json!({}))).unwrap();
    assert!(absent.key.is_none());
    assert!(absent.schema.is_none());

    let plain = Schema::string().build();
    assert!(enforcer.discriminator(&plain, &value(json!({}))).is_none());

    let by_reference = Schema::reference("Pet");
    let found = enforcer
        .discriminator(&by_reference, &value(json!({"petType": "Cat"})))
        .unwrap();
    assert_eq!(found.key.as_deref(), Some("Cat"));
}

#[test]
fn test_explicit_mapping_in_v3() {
    let enforcer = Enforcer::new(Version::V3);
    enforcer
        .definitions()
        .register("Feline", Schema::object().field("lives", Schema::integer()))
        .unwrap();
    let schema = Schema::one_of([Schema::reference("Feline")])
        .discriminator(
            Discriminator::new("kind").mapping("cat", "#/components/schemas/Feline"),
        )
        .build();

    assert!(enforcer
        .validate(&schema, &value(json!({"kind": "cat", "lives": 9})))
        .is_none());
    // Falls back to the definition name when the mapping has no entry
    assert!(enforcer
        .validate(&schema, &value(json!({"kind": "Feline", "lives": 9})))
        .is_none());
    assert!(enforcer
        .validate(&schema, &value(json!({"kind": "dog", "lives": 9})))
        .is_some());
}

#[test]
fn test_mapping_to_an_undefined_schema_selects_nothing() {
    let enforcer = Enforcer::new(Version::V3);
    enforcer
        .definitions()
        .register("cat", Schema::object())
        .unwrap();
    let schema = Schema::one_of([Schema::reference("cat")])
        .discriminator(Discriminator::new("kind").mapping("cat", "#/components/schemas/Feline"))
        .build();
    let cat = value(json!({"kind": "cat"}));

    // The definition named like the key is not consulted
    let found = enforcer.discriminator(&schema, &cat).unwrap();
    assert_eq!(found.key.as_deref(), Some("cat"));
    assert!(found.schema.is_none());

    let exception = enforcer.validate(&schema, &cat).unwrap();
    assert_eq!(
        exception.flatten(),
        vec![
            "Invalid value: Discriminator property \"kind\" value \"cat\" mapped to no schema"
                .to_string()
        ]
    );
}

#[test]
fn test_v2_ignores_mappings() {
    let enforcer = Enforcer::new(Version::V2);
    enforcer
        .definitions()
        .register("Feline", Schema::object())
        .unwrap();
    let schema = Schema::one_of([Schema::reference("Feline")])
        .discriminator(Discriminator::new("kind").mapping("cat", "Feline"))
        .build();

    assert!(enforcer
        .validate(&schema, &value(json!({"kind": "Feline"})))
        .is_none());
    assert!(enforcer
        .validate(&schema, &value(json!({"kind": "cat"})))
        .is_some());
}

#[test]
fn test_discriminated_deserialize() {
    let enforcer = Enforcer::new(Version::V3);
    enforcer
        .definitions()
        .register(
            "Event",
            Schema::object()
                .field("type", Schema::string())
                .field("at", Schema::string().format("date-time")),
        )
        .unwrap();
    let schema = Schema::one_of([Schema::reference("Event")])
        .discriminator(Discriminator::new("type"))
        .build();

    let typed = enforcer
        .deserialize(
            &schema,
            &value(json!({"type": "Event", "at": "2020-01-01T00:00:00Z"})),
            false,
        )
        .into_result()
        .unwrap();
    assert!(matches!(typed.get("at"), Some(Value::DateTime(_))));
}
