//! Query-engine suites
//!
//! Covers the six comparison operators over a committed score set, exactness
//! of equality at the stored width, creation-order results, and lazy
//! composition.

mod common;

use common::{collect_scores, open_person_store, seed_scores};
use lodestone::{FieldValue, Predicate};
use tempfile::TempDir;

const SCORES: [f32; 3] = [-0.9907, 100.0, 42.42];

#[test]
fn equality_matches_exactly_one() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let hits = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::eq("score", 42.42f32));
    assert_eq!(hits.count().unwrap(), 1);
    assert_eq!(
        hits.first().unwrap().unwrap().get("score").unwrap(),
        FieldValue::Float(42.42)
    );
}

#[test]
fn inequality_yields_two_in_creation_order() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let hits = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::ne("score", 100.0f32));
    assert_eq!(collect_scores(&hits), vec![-0.9907, 42.42]);
}

#[test]
fn less_than_zero_yields_the_negative_score() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let hits = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::lt("score", 0i64));
    assert_eq!(collect_scores(&hits), vec![-0.9907]);
}

#[test]
fn greater_equal_hundred_yields_the_hundred() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let hits = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::ge("score", 100i64));
    assert_eq!(collect_scores(&hits), vec![100.0]);
}

#[test]
fn remaining_operators() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let le = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::le("score", 42.42f64));
    assert_eq!(collect_scores(&le), vec![-0.9907, 42.42]);

    let gt = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::gt("score", 42.42f64));
    assert_eq!(collect_scores(&gt), vec![100.0]);
}

#[test]
fn double_precision_literal_does_not_equal_single_precision_storage() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    // 42.42f64 is not the same real number as 42.42f32
    let hits = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::eq("score", 42.42f64));
    assert_eq!(hits.count().unwrap(), 0);
}

#[test]
fn sequences_are_lazy_and_restartable() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    // built before the mutation, consumed after it: sees the new state
    let all = store.objects("Person").unwrap();
    let tx = store.begin_write().unwrap();
    let extra = store.create("Person").unwrap();
    extra.set("score", FieldValue::Float(7.0)).unwrap();
    assert_eq!(all.count().unwrap(), 4);
    tx.rollback();

    // restartable: same sequence, fresh evaluation
    assert_eq!(all.count().unwrap(), 3);
    assert_eq!(collect_scores(&all), SCORES.to_vec());
}

#[test]
fn count_agrees_with_materialization_under_composed_filters() {
    let dir = TempDir::new().unwrap();
    let store = open_person_store(&dir.path().join("s.lode"));
    seed_scores(&store, &SCORES);

    let filtered = store
        .objects("Person")
        .unwrap()
        .filter(Predicate::gt("score", 0i64))
        .filter(Predicate::lt("score", 99i64));
    assert_eq!(filtered.count().unwrap(), 1);
    assert_eq!(filtered.iter().unwrap().len(), 1);
    assert_eq!(collect_scores(&filtered), vec![42.42]);
}
