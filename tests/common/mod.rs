//! Scripted in-memory backend shared by the integration tests.
//!
//! Graph queries are answered by the first rule whose fragment occurs in the
//! query text; entity lookups come from a fixed table of JSON records.

#![allow(dead_code)]

use async_trait::async_trait;
use garbanzo::config::GarbanzoConfig;
use garbanzo::curie::{NamespaceRegistry, NativeId};
use garbanzo::graph::{EntitySource, GraphQuery, RawEntity, Row};
use garbanzo::{Garbanzo, GraphError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ENTITY: &str = "http://www.wikidata.org/entity/";
pub const STATEMENT: &str = "http://www.wikidata.org/entity/statement/";

#[derive(Default)]
pub struct ScriptedBackend {
    rules: Vec<(String, Vec<Row>)>,
    entities: HashMap<String, Value>,
    search_hits: Vec<String>,
    claim_properties: HashMap<String, String>,
    fail_queries: bool,
    pub query_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any query containing `fragment` with `rows`
    pub fn with_rows(mut self, fragment: &str, rows: Vec<Row>) -> Self {
        self.rules.push((fragment.to_string(), rows));
        self
    }

    pub fn with_entity(mut self, entity: Value) -> Self {
        let id = entity["id"].as_str().unwrap().to_string();
        self.entities.insert(id, entity);
        self
    }

    pub fn with_search_hits(mut self, hits: &[&str]) -> Self {
        self.search_hits = hits.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_claim(mut self, guid: &str, property: &str) -> Self {
        self.claim_properties.insert(guid.to_string(), property.to_string());
        self
    }

    /// Every graph query fails as an unavailable endpoint would
    pub fn failing(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphQuery for ScriptedBackend {
    async fn query(&self, pattern_body: &str) -> Result<Vec<Row>, GraphError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(pattern_body.to_string());
        if self.fail_queries {
            return Err(GraphError::QueryExecution("SPARQL endpoint returned status 503".to_string()));
        }
        Ok(self
            .rules
            .iter()
            .find(|(fragment, _)| pattern_body.contains(fragment.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl EntitySource for ScriptedBackend {
    async fn fetch_entities(&self, ids: &[NativeId]) -> Result<HashMap<String, RawEntity>, GraphError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut found = HashMap::new();
        for id in ids {
            let value = self
                .entities
                .get(id.bare())
                .ok_or_else(|| GraphError::RemoteLookup(format!("unknown entity {}", id.bare())))?;
            let entity: RawEntity = serde_json::from_value(value.clone())
                .map_err(|e| GraphError::RemoteLookup(e.to_string()))?;
            found.insert(id.bare().to_string(), entity);
        }
        Ok(found)
    }

    async fn search_entities(&self, _search: &str, limit: usize, offset: usize) -> Result<Vec<NativeId>, GraphError> {
        Ok(self
            .search_hits
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|hit| NativeId::parse(hit))
            .collect())
    }

    async fn claim_property(&self, statement_guid: &str) -> Result<Option<String>, GraphError> {
        Ok(self.claim_properties.get(statement_guid).cloned())
    }
}

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Result row of an equivalent-item query
pub fn item_row(qid: &str) -> Row {
    let uri = format!("{}{}", ENTITY, qid);
    row(&[("item", uri.as_str())])
}

/// Result row of a statement query
pub fn statement_row(id: &str, subject: (&str, &str), predicate: (&str, &str), object: (&str, &str)) -> Row {
    let id = format!("{}{}", STATEMENT, id);
    let item = format!("{}{}", ENTITY, subject.0);
    let property = format!("{}{}", ENTITY, predicate.0);
    let value = format!("{}{}", ENTITY, object.0);
    row(&[
        ("id", id.as_str()),
        ("item", item.as_str()),
        ("itemLabel", subject.1),
        ("property", property.as_str()),
        ("propertyLabel", predicate.1),
        ("value", value.as_str()),
        ("valueLabel", object.1),
    ])
}

fn external_id_claim(qid: &str, n: usize, property: &str, value: &str) -> Value {
    json!({
        "id": format!("{}${}", qid, n),
        "rank": "normal",
        "mainsnak": {
            "snaktype": "value",
            "property": property,
            "datatype": "external-id",
            "datavalue": {"type": "string", "value": value}
        }
    })
}

fn instance_of_claim(qid: &str, n: usize, type_qid: &str) -> Value {
    json!({
        "id": format!("{}${}", qid, n),
        "rank": "normal",
        "mainsnak": {
            "snaktype": "value",
            "property": "P31",
            "datatype": "wikibase-item",
            "datavalue": {"type": "wikibase-entityid", "value": {"entity-type": "item", "id": type_qid}}
        }
    })
}

/// Entity record with a label, `instance of` types and external-id claims
pub fn entity(qid: &str, label: &str, types: &[&str], xrefs: &[(&str, &str)]) -> Value {
    let mut claims = serde_json::Map::new();
    let mut n = 0;
    for type_qid in types {
        n += 1;
        claims
            .entry("P31")
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .unwrap()
            .push(instance_of_claim(qid, n, type_qid));
    }
    for (property, value) in xrefs {
        n += 1;
        claims
            .entry(property.to_string())
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .unwrap()
            .push(external_id_claim(qid, n, property, value));
    }
    json!({
        "id": qid,
        "labels": {"en": {"language": "en", "value": label}},
        "descriptions": {"en": {"language": "en", "value": format!("{} description", label)}},
        "aliases": {},
        "claims": claims
    })
}

pub fn garbanzo(backend: &Arc<ScriptedBackend>) -> Garbanzo {
    Garbanzo::new(
        &GarbanzoConfig::default(),
        Arc::new(NamespaceRegistry::wikidata_default()),
        backend.clone(),
        backend.clone(),
    )
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Backend for the DOID:1234 / MESH:1234 / wd:Q1049021 scenario
pub fn closure_backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .with_rows("wdt:P699 \"DOID:1234\"", vec![item_row("Q1049021")])
        .with_rows("wdt:P486 \"D000068116\"", vec![item_row("Q1049021")])
        .with_rows("wdt:P486 \"D1\"", vec![item_row("Q10"), item_row("Q20")])
        .with_entity(entity(
            "Q1049021",
            "schizophrenia spectrum disorder",
            &["Q12136"],
            &[("P699", "DOID:1234"), ("P486", "D000068116")],
        ))
        .with_entity(entity("Q10", "night blindness", &["Q12136"], &[("P486", "D1"), ("P699", "DOID:5")]))
        .with_entity(entity("Q20", "duplicate entry", &["Q12136"], &[]))
}
