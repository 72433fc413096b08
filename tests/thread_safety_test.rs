//! Tests for sharing one enforcer across threads.

use std::sync::Arc;
use std::thread;

use enforcer::{Enforcer, Location, Parameter, Schema, SchemaBuilder, Value, Version};
use serde_json::json;

fn shared_enforcer() -> Arc<Enforcer> {
    let enforcer = Enforcer::new(Version::V3);
    enforcer
        .definitions()
        .register(
            "Event",
            Schema::object()
                .field("id", Schema::integer().minimum(1.0))
                .field("at", Schema::string().format("date-time")),
        )
        .unwrap();
    Arc::new(enforcer)
}

#[test]
fn test_concurrent_operations() {
    let enforcer = shared_enforcer();
    let schema = enforcer.definitions().get("Event").unwrap();
    let parameter = Arc::new(
        Parameter::builder("ids", Location::Query, Schema::array(Schema::integer()))
            .build(&enforcer)
            .unwrap(),
    );

    let handles: Vec<_> = (1..=8)
        .map(|i| {
            let enforcer = Arc::clone(&enforcer);
            let schema = Arc::clone(&schema);
            let parameter = Arc::clone(&parameter);
            thread::spawn(move || {
                let wire = Value::from(json!({"id": i, "at": "2020-01-01T00:00:00Z"}));
                let typed = enforcer
                    .deserialize(&schema, &wire, false)
                    .into_result()
                    .unwrap();
                assert!(enforcer.validate(&schema, &typed).is_none());

                let invalid = Value::from(json!({"id": 0, "at": "2020-01-01T00:00:00Z"}));
                let typed = enforcer
                    .deserialize(&schema, &invalid, false)
                    .into_result()
                    .unwrap();
                assert_eq!(enforcer.validate(&schema, &typed).map(|e| e.count()), Some(1));

                let query = format!("ids={}&ids={}", i, i + 1);
                let parsed = parameter.parse(&enforcer, &query, None).unwrap();
                assert_eq!(
                    parsed.into_result().unwrap(),
                    Value::array([Value::Integer(i), Value::Integer(i + 1)])
                );
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_definitions_registered_from_another_thread() {
    let enforcer = shared_enforcer();

    let writer = {
        let enforcer = Arc::clone(&enforcer);
        thread::spawn(move || {
            enforcer
                .definitions()
                .register("Name", Schema::string().min_length(1))
                .unwrap();
        })
    };
    writer.join().unwrap();

    let reader = {
        let enforcer = Arc::clone(&enforcer);
        thread::spawn(move || {
            enforcer
                .validate_named("Name", &Value::from(""))
                .unwrap()
                .map(|e| e.count())
        })
    };
    assert_eq!(reader.join().unwrap(), Some(1));
}

#[test]
fn test_clones_share_definitions() {
    let enforcer = Enforcer::new(Version::V2);
    let clone = enforcer.clone();
    enforcer
        .definitions()
        .register("Flag", Schema::boolean())
        .unwrap();

    assert!(clone.definitions().contains("Flag"));
    assert!(clone
        .validate_named("Flag", &Value::Bool(true))
        .unwrap()
        .is_none());
}
