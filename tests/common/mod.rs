//! Shared fixtures for the integration suites
#![allow(dead_code)]

use lodestone::{
    FieldType, FieldValue, ObjectSchema, PropertySchema, Schema, Store, StoreConfig,
};
use std::path::Path;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route engine logs to the test harness; safe to call from every suite
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// The schema most suites run against: a mix of string, bool, and both
/// float widths, plus an ignored property.
pub fn person_schema() -> Schema {
    Schema::new(vec![ObjectSchema::new("Person")
        .with_property(PropertySchema::persisted("first_name", FieldType::String))
        .with_property(PropertySchema::persisted("interesting", FieldType::Bool))
        .with_property(PropertySchema::persisted("score", FieldType::Float))
        .with_property(PropertySchema::persisted("latitude", FieldType::Double))
        .with_property(PropertySchema::ignored("session_tag", FieldType::String))])
    .expect("fixture schema is valid")
}

/// Open a store on `path` with the person schema and default configuration
pub fn open_person_store(path: &Path) -> Store {
    init_tracing();
    Store::open(path, person_schema(), StoreConfig::default()).expect("open store")
}

/// Commit three Person objects with the given scores, in order
pub fn seed_scores(store: &Store, scores: &[f32]) {
    let tx = store.begin_write().expect("begin");
    for &score in scores {
        let person = store.create("Person").expect("create");
        person.set("score", FieldValue::Float(score)).expect("set");
    }
    tx.commit().expect("commit");
}

/// Collect the scores of a results sequence in iteration order
pub fn collect_scores(results: &lodestone::Results) -> Vec<f32> {
    results
        .iter()
        .expect("evaluate")
        .map(|o| o.get("score").expect("get").as_float().expect("float"))
        .collect()
}
