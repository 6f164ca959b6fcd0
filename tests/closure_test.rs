//! Exact-match closure against a scripted backend

mod common;

use common::{closure_backend, entity, garbanzo, item_row, strings, ScriptedBackend};
use garbanzo::{CurieError, LookupError};
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test]
async fn test_concrete_scenario() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let matches = garbanzo
        .close_exact_matches(&strings(&["DOID:1234", "MESH:1234", "wd:Q1049021"]))
        .await
        .unwrap();

    assert_eq!(matches, vec!["DOID:1234", "MESH:D000068116", "wd:Q1049021"]);
    assert!(!matches.contains(&"MESH:1234".to_string()));
}

#[tokio::test]
async fn test_claims_fetched_in_one_batch() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    garbanzo.close_exact_matches(&strings(&["DOID:1234", "MESH:D1"])).await.unwrap();
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test]
async fn test_dead_ids_are_pruned() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let set = garbanzo.equivalence_set(&strings(&["MESH:D1"])).await.unwrap();
    assert_eq!(set.native_ids.len(), 2);
    assert_eq!(set.dead_ids.iter().map(|id| id.to_curie()).collect::<Vec<_>>(), vec!["wd:Q20"]);

    let matches = garbanzo.close_exact_matches(&strings(&["MESH:D1"])).await.unwrap();
    assert_eq!(matches, vec!["DOID:5", "MESH:D1", "wd:Q10"]);
}

#[tokio::test]
async fn test_no_new_information_is_empty() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let unresolved = garbanzo.close_exact_matches(&strings(&["MESH:1234"])).await.unwrap();
    assert!(unresolved.is_empty());
    // nothing resolved, so no entity lookup either
    assert_eq!(backend.fetch_count(), 0);

    let known = garbanzo
        .close_exact_matches(&strings(&["DOID:1234", "MESH:D000068116", "wd:Q1049021"]))
        .await
        .unwrap();
    assert!(known.is_empty());
}

#[tokio::test]
async fn test_closure_is_idempotent() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let inputs = strings(&["DOID:1234", "MESH:1234"]);
    let first = garbanzo.close_exact_matches(&inputs).await.unwrap();
    assert!(!first.is_empty());

    let mut combined: BTreeSet<String> = inputs.into_iter().collect();
    combined.extend(first);
    let combined: Vec<String> = combined.into_iter().collect();

    let second = garbanzo.close_exact_matches(&combined).await.unwrap();
    assert!(second.iter().all(|id| combined.contains(id)), "second pass found {:?}", second);
}

#[tokio::test]
async fn test_unknown_namespace_contributes_nothing() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let with_unknown = garbanzo
        .close_exact_matches(&strings(&["FOO:1", "DOID:1234"]))
        .await
        .unwrap();
    let without = garbanzo.close_exact_matches(&strings(&["DOID:1234"])).await.unwrap();
    assert_eq!(with_unknown, without);
}

#[tokio::test]
async fn test_malformed_input_is_surfaced() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let err = garbanzo
        .close_exact_matches(&strings(&["DOID:1234", "MESH"]))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Curie(CurieError::Malformed(ref c)) if c == "MESH"));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_upstream_failure_is_fatal() {
    let backend = Arc::new(ScriptedBackend::new().failing());
    let garbanzo = garbanzo(&backend);

    let err = garbanzo.close_exact_matches(&strings(&["DOID:1234"])).await.unwrap_err();
    assert!(matches!(err, LookupError::Graph(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_unknown_native_id_is_fatal() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let err = garbanzo.close_exact_matches(&strings(&["wd:Q999"])).await.unwrap_err();
    assert!(matches!(err, LookupError::Graph(_)));
}

#[tokio::test]
async fn test_single_concept_exact_matches() {
    let backend = Arc::new(closure_backend());
    let garbanzo = garbanzo(&backend);

    let foreign = garbanzo.exact_matches("DOID:1234").await.unwrap();
    assert_eq!(foreign, vec!["DOID:1234", "MESH:D000068116", "wd:Q1049021"]);

    let native = garbanzo.exact_matches("wd:Q1049021").await.unwrap();
    assert_eq!(native, foreign);

    assert!(garbanzo.exact_matches("MESH:1234").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolution_is_cached() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_rows("wdt:P486 \"D009755\"", vec![item_row("Q7758678")])
            .with_entity(entity("Q7758678", "night blindness", &["Q12136"], &[("P486", "D009755")])),
    );
    let garbanzo = garbanzo(&backend);

    for _ in 0..3 {
        assert_eq!(garbanzo.resolve_equivalent_item("MESH:D009755").await.unwrap(), vec!["wd:Q7758678"]);
    }
    assert_eq!(backend.query_count(), 1);
}
