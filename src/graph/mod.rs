//! The knowledge-graph boundary.
//!
//! The lookup core talks to Wikidata through two seams only:
//! [`GraphQuery`] (graph-pattern queries returning rows of bindings) and
//! [`EntitySource`] (bulk entity records from the action API). Everything
//! behind them is swappable: [`WikidataClient`] for the live service,
//! [`LocalGraph`] for an in-memory store, scripted fakes in tests.

pub mod local;
pub mod wikidata;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::curie::NativeId;
use crate::error::GraphError;

pub use local::LocalGraph;
pub use wikidata::WikidataClient;

/// One solution: query variable name -> bound IRI or literal lexical form
pub type Row = HashMap<String, String>;

/// Prefix declarations prepended to every pattern body
pub const STANDARD_PREFIXES: &str = r"PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX wikibase: <http://wikiba.se/ontology#>
PREFIX p: <http://www.wikidata.org/prop/>
PREFIX v: <http://www.wikidata.org/prop/statement/>
PREFIX q: <http://www.wikidata.org/prop/qualifier/>
PREFIX ps: <http://www.wikidata.org/prop/statement/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
PREFIX schema: <http://schema.org/>
PREFIX bd: <http://www.bigdata.com/rdf#>
";

/// Full query text for a caller's pattern body
pub fn with_standard_prefixes(pattern_body: &str) -> String {
    format!("{}\n{}", STANDARD_PREFIXES, pattern_body)
}

/// Escape a value for use inside a double-quoted SPARQL literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Executes graph-pattern queries against the knowledge graph.
///
/// One call is one request: no retries, no pagination. Callers shape the
/// pattern to bound cardinality.
#[async_trait]
pub trait GraphQuery: Send + Sync {
    async fn query(&self, pattern_body: &str) -> Result<Vec<Row>, GraphError>;
}

/// Bulk entity retrieval and the other action-API lookups the beacon needs
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Entity records keyed by bare id. Fails if any id is unknown.
    async fn fetch_entities(&self, ids: &[NativeId]) -> Result<HashMap<String, RawEntity>, GraphError>;

    /// Items whose label or alias matches `search`, in relevance order
    async fn search_entities(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NativeId>, GraphError>;

    /// Property of the statement with the given GUID, `None` if it does not exist
    async fn claim_property(&self, statement_guid: &str) -> Result<Option<String>, GraphError>;
}

/// Entity record as returned by `wbgetentities`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    pub id: String,
    #[serde(default)]
    pub labels: HashMap<String, LangValue>,
    #[serde(default)]
    pub descriptions: HashMap<String, LangValue>,
    #[serde(default)]
    pub aliases: HashMap<String, Vec<LangValue>>,
    #[serde(default)]
    pub claims: HashMap<String, Vec<RawStatement>>,
}

impl RawEntity {
    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels.get(language).map(|l| l.value.as_str())
    }

    pub fn description(&self, language: &str) -> Option<&str> {
        self.descriptions.get(language).map(|d| d.value.as_str())
    }

    pub fn aliases(&self, language: &str) -> Vec<String> {
        self.aliases
            .get(language)
            .map(|aliases| aliases.iter().map(|a| a.value.clone()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LangValue {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatement {
    pub id: String,
    pub mainsnak: RawSnak,
    #[serde(default = "default_rank")]
    pub rank: String,
    /// Qualifier snaks grouped by property, in `qualifiers-order`
    #[serde(default)]
    pub qualifiers: HashMap<String, Vec<RawSnak>>,
    #[serde(default, rename = "qualifiers-order")]
    pub qualifiers_order: Vec<String>,
    #[serde(default)]
    pub references: Vec<RawReference>,
}

fn default_rank() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReference {
    #[serde(default)]
    pub snaks: HashMap<String, Vec<RawSnak>>,
    #[serde(default, rename = "snaks-order")]
    pub snaks_order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSnak {
    pub property: String,
    #[serde(default = "default_snak_type")]
    pub snaktype: String,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub datavalue: Option<RawDataValue>,
}

fn default_snak_type() -> String {
    "value".to_string()
}

/// Value of a snak, tagged with its Wikibase value type
#[derive(Debug, Clone, Deserialize)]
pub struct RawDataValue {
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
}

/// Snaks of a property-keyed map, following `order` first then any remaining keys
pub(crate) fn ordered_snaks<'a>(
    snaks: &'a HashMap<String, Vec<RawSnak>>,
    order: &[String],
) -> Vec<&'a RawSnak> {
    let mut keys: Vec<&String> = order.iter().filter(|k| snaks.contains_key(*k)).collect();
    let mut rest: Vec<&String> = snaks.keys().filter(|k| !order.contains(k)).collect();
    rest.sort();
    keys.extend(rest);
    keys.into_iter().flat_map(|k| snaks[k].iter()).collect()
}
