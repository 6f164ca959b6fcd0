//! Bulk claim retrieval through the entity source

mod common;

use common::{entity, garbanzo, strings, ScriptedBackend};
use serde_json::json;
use std::sync::Arc;

fn backend_with_mixed_claims() -> ScriptedBackend {
    let mut record = entity(
        "Q7758678",
        "night blindness",
        &["Q12136"],
        &[("P486", "D009755"), ("P493", "368.6")],
    );
    record["claims"]["P625"] = json!([{
        "id": "Q7758678$geo",
        "mainsnak": {
            "snaktype": "value", "property": "P625", "datatype": "globe-coordinate",
            "datavalue": {"type": "globecoordinate", "value": {"latitude": 1.0, "longitude": 2.0}}
        }
    }]);
    record["claims"]["P699"] = json!([{
        "id": "Q7758678$none",
        "mainsnak": {"snaktype": "novalue", "property": "P699", "datatype": "external-id"}
    }]);
    ScriptedBackend::new().with_entity(record)
}

#[tokio::test]
async fn test_unsupported_values_do_not_abort_batch() {
    let backend = Arc::new(backend_with_mixed_claims());
    let garbanzo = garbanzo(&backend);

    let curies = garbanzo.get_claims_as_curies(&strings(&["wd:Q7758678"])).await.unwrap();
    assert_eq!(curies["wd:Q7758678"], vec!["MESH:D009755"]);
}

#[tokio::test]
async fn test_curie_claims_are_projected() {
    let backend = Arc::new(backend_with_mixed_claims());
    let garbanzo = garbanzo(&backend);

    let claims = garbanzo.get_curie_claims(&strings(&["Q7758678"])).await.unwrap();
    let claims: Vec<_> = claims.into_values().flatten().collect();
    assert_eq!(claims.len(), 1);

    let json = serde_json::to_value(&claims[0]).unwrap();
    assert_eq!(json["datavaluecurie"], "MESH:D009755");
    assert!(json.get("property").is_none());
    assert!(json.get("datavalue").is_none());
}

#[tokio::test]
async fn test_no_ids_means_no_request() {
    let backend = Arc::new(backend_with_mixed_claims());
    let garbanzo = garbanzo(&backend);

    let curies = garbanzo.get_claims_as_curies(&strings(&["MESH:D009755"])).await.unwrap();
    assert!(curies.is_empty());
    assert_eq!(backend.fetch_count(), 0);
}
