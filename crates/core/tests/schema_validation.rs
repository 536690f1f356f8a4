//! Validates serialized designs against the formal design schema at
//! schema/design-schema.json.

mod common;

use common::{cellar, init_tracing};
use plinth_core::{new_engine, serialize};
use std::path::Path;

fn validator() -> jsonschema::Validator {
    let schema_path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../schema/design-schema.json");
    let schema_src = std::fs::read_to_string(&schema_path)
        .unwrap_or_else(|e| panic!("Failed to read schema at {}: {}", schema_path.display(), e));
    let schema_value: serde_json::Value = serde_json::from_str(&schema_src).unwrap();
    jsonschema::validator_for(&schema_value)
        .unwrap_or_else(|e| panic!("Failed to compile schema: {}", e))
}

fn assert_valid(validator: &jsonschema::Validator, instance: &serde_json::Value) {
    if let Err(error) = validator.validate(instance) {
        panic!("Schema validation failed: {}\n{:#}", error, instance);
    }
}

#[test]
fn empty_design_matches_schema() {
    let engine = new_engine();
    let json = serialize(engine.world());
    assert!(json["api"].is_null());
    assert_valid(&validator(), &json);
}

#[test]
fn finished_design_matches_schema() {
    init_tracing();
    let mut engine = new_engine();
    engine.declare(cellar);
    engine.run().unwrap();

    let json = serialize(engine.world());
    assert_eq!(json["format"], "plinth-design");
    assert_eq!(json["media_types"].as_array().unwrap().len(), 3);
    assert_valid(&validator(), &json);
}

#[test]
fn cyclic_design_matches_schema() {
    let mut engine = new_engine();
    engine.declare(|s| {
        s.type_("A", |t| t.attribute("b", "B"));
        s.type_("B", |t| {
            t.attribute("a", "A");
            t.attribute("others", plinth_core::array_of("A"));
        });
    });
    engine.run().unwrap();
    assert_valid(&validator(), &serialize(engine.world()));
}
