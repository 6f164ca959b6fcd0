//! Statement traversal, filters and paging against a scripted backend

mod common;

use common::{entity, garbanzo, statement_row, strings, ScriptedBackend};
use garbanzo::StatementQuery;
use std::sync::Arc;

fn traversal_backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .with_rows(
            "VALUES ?item",
            vec![
                statement_row(
                    "Q133696-c3",
                    ("Q133696", "color blindness"),
                    ("P279", "subclass of"),
                    ("Q1", "visual impairment"),
                ),
                statement_row(
                    "Q133696-a1",
                    ("Q133696", "color blindness"),
                    ("P2293", "genetic association"),
                    ("Q7187", "OPN1LW"),
                ),
            ],
        )
        .with_rows(
            "VALUES ?value",
            vec![statement_row(
                "Q26738259-2f0e5941-494d-ba20-1233-e03023321846",
                ("Q26738259", "congenital color blindness"),
                ("P279", "subclass of"),
                ("Q133696", "color blindness"),
            )],
        )
        .with_entity(entity("Q133696", "color blindness", &["Q12136"], &[]))
        .with_entity(entity("Q1", "visual impairment", &["Q169872"], &[]))
        .with_entity(entity("Q7187", "OPN1LW", &["Q7187"], &[]))
        .with_entity(entity("Q26738259", "congenital color blindness", &["Q12136"], &[]))
}

#[tokio::test]
async fn test_statements_sorted_by_id() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let statements = garbanzo.get_statements(&strings(&["wd:Q133696"]), &[], &[]).await.unwrap();
    let ids: Vec<&str> = statements.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "wds:Q133696$a1",
            "wds:Q133696$c3",
            "wds:Q26738259$2f0e5941-494d-ba20-1233-e03023321846",
        ]
    );

    let again = garbanzo.get_statements(&strings(&["wd:Q133696"]), &[], &[]).await.unwrap();
    assert_eq!(statements, again);
}

#[tokio::test]
async fn test_unfiltered_statements_are_cached() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    garbanzo.get_statements(&strings(&["wd:Q133696"]), &[], &[]).await.unwrap();
    garbanzo
        .get_statements(&strings(&["Q133696"]), &strings(&["subclass"]), &[])
        .await
        .unwrap();
    // one forward and one reverse query
    assert_eq!(backend.query_count(), 2);
}

#[tokio::test]
async fn test_statement_serialization() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let statements = garbanzo.get_statements(&strings(&["wd:Q133696"]), &[], &[]).await.unwrap();
    let json = serde_json::to_value(&statements[2]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": "wds:Q26738259$2f0e5941-494d-ba20-1233-e03023321846",
            "subject": {"id": "wd:Q26738259", "name": "congenital color blindness"},
            "predicate": {"id": "wd:P279", "name": "subclass of"},
            "object": {"id": "wd:Q133696", "name": "color blindness"}
        })
    );
}

#[tokio::test]
async fn test_keyword_filter() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let statements = garbanzo
        .get_statements(&strings(&["wd:Q133696"]), &strings(&["CONGENITAL", "opn1"]), &[])
        .await
        .unwrap();
    let ids: Vec<&str> = statements.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["wds:Q133696$a1", "wds:Q26738259$2f0e5941-494d-ba20-1233-e03023321846"]);
}

#[tokio::test]
async fn test_type_filter_matches_either_end() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let genes = garbanzo
        .get_statements(&strings(&["wd:Q133696"]), &[], &strings(&["GENE"]))
        .await
        .unwrap();
    assert_eq!(genes.len(), 1);
    assert_eq!(genes[0].object.id, "wd:Q7187");

    let diseases = garbanzo
        .get_statements(&strings(&["wd:Q133696"]), &[], &strings(&["DISO"]))
        .await
        .unwrap();
    assert_eq!(diseases.len(), 3);

    let chemicals = garbanzo
        .get_statements(&strings(&["wd:Q133696"]), &[], &strings(&["CHEM"]))
        .await
        .unwrap();
    assert!(chemicals.is_empty());
}

#[tokio::test]
async fn test_type_filter_uses_one_concept_batch() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    garbanzo
        .get_statements(&strings(&["wd:Q133696"]), &[], &strings(&["GENE"]))
        .await
        .unwrap();
    assert_eq!(backend.fetch_count(), 1);
}

#[tokio::test]
async fn test_targets_and_relations() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let query = StatementQuery {
        sources: strings(&["wd:Q133696", "MESH:D003117"]),
        targets: strings(&["wd:Q26738259", "wd:Q1"]),
        ..StatementQuery::default()
    };
    let statements = garbanzo.query_statements_page(&query).await.unwrap();
    assert_eq!(statements.len(), 2);

    let query = StatementQuery {
        sources: strings(&["wd:Q133696"]),
        relations: strings(&["P2293"]),
        ..StatementQuery::default()
    };
    let statements = garbanzo.query_statements_page(&query).await.unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].predicate.name, "genetic association");
}

#[tokio::test]
async fn test_only_native_sources_are_queried() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let query = StatementQuery { sources: strings(&["MESH:D003117"]), ..StatementQuery::default() };
    assert!(garbanzo.query_statements_page(&query).await.unwrap().is_empty());
    assert_eq!(backend.query_count(), 0);
}

#[tokio::test]
async fn test_pagination_over_twenty_five_statements() {
    let rows = (0..25)
        .rev()
        .map(|i| {
            statement_row(
                &format!("Q1-s{:02}", i),
                ("Q1", "subject"),
                ("P279", "subclass of"),
                ("Q2", "object"),
            )
        })
        .collect();
    let backend = Arc::new(ScriptedBackend::new().with_rows("VALUES ?item", rows));
    let garbanzo = garbanzo(&backend);

    let query = StatementQuery {
        sources: strings(&["wd:Q1"]),
        page_number: Some(2),
        page_size: Some(10),
        ..StatementQuery::default()
    };
    let page = garbanzo.query_statements_page(&query).await.unwrap();
    let ids: Vec<String> = page.into_iter().map(|s| s.id).collect();
    let expected: Vec<String> = (10..20).map(|i| format!("wds:Q1$s{:02}", i)).collect();
    assert_eq!(ids, expected);

    let default_page = garbanzo
        .query_statements_page(&StatementQuery { sources: strings(&["wd:Q1"]), ..StatementQuery::default() })
        .await
        .unwrap();
    assert_eq!(default_page.len(), 10);
    assert_eq!(default_page[0].id, "wds:Q1$s00");
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let backend = Arc::new(traversal_backend());
    let garbanzo = garbanzo(&backend);

    let query = StatementQuery {
        sources: strings(&["wd:Q133696"]),
        page_size: Some(0),
        ..StatementQuery::default()
    };
    let err = garbanzo.query_statements_page(&query).await.unwrap_err();
    assert!(err.is_client_error());
}
