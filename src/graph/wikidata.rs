//! HTTP backend for the public Wikidata services.
//!
//! Graph-pattern queries go to the SPARQL endpoint; entity records, search
//! and single-claim lookups go to the MediaWiki action API.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{GarbanzoConfig, DEFAULT_USER_AGENT};
use crate::curie::NativeId;
use crate::error::GraphError;
use crate::graph::{with_standard_prefixes, EntitySource, GraphQuery, RawEntity, Row};

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlBinding>>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    value: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, serde_json::Value>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ClaimsResponse {
    #[serde(default)]
    claims: HashMap<String, serde_json::Value>,
    error: Option<serde_json::Value>,
}

/// Client for the Wikidata SPARQL endpoint and action API
pub struct WikidataClient {
    client: Client,
    sparql_endpoint: String,
    api_endpoint: String,
    entity_batch_size: usize,
}

impl WikidataClient {
    pub fn new(config: &GarbanzoConfig) -> Result<Self, GraphError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(remote_lookup_error)?;

        Ok(Self {
            client,
            sparql_endpoint: config.sparql_endpoint.clone(),
            api_endpoint: config.api_endpoint.clone(),
            entity_batch_size: config.entity_batch_size(),
        })
    }

    pub fn sparql_endpoint(&self) -> &str {
        &self.sparql_endpoint
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    async fn get_api<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, GraphError> {
        let response = self
            .client
            .get(&self.api_endpoint)
            .query(params)
            .send()
            .await
            .map_err(remote_lookup_error)?;

        if !response.status().is_success() {
            return Err(GraphError::RemoteLookup(format!(
                "action API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(remote_lookup_error)?;
        serde_json::from_str(&body)
            .map_err(|e| GraphError::RemoteLookup(format!("malformed action API response: {}", e)))
    }

    async fn fetch_entity_batch(
        &self,
        ids: &[NativeId],
    ) -> Result<HashMap<String, RawEntity>, GraphError> {
        let joined = ids.iter().map(NativeId::bare).collect::<Vec<_>>().join("|");
        debug!(count = ids.len(), "fetching entities");
        let response: EntitiesResponse = self
            .get_api(&[
                ("action", "wbgetentities".to_string()),
                ("ids", joined),
                ("languages", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(GraphError::RemoteLookup(error_info(&error)));
        }

        let mut entities = HashMap::with_capacity(response.entities.len());
        for (id, value) in response.entities {
            if value.get("missing").is_some() {
                return Err(GraphError::RemoteLookup(format!("unknown entity {}", id)));
            }
            let entity: RawEntity = serde_json::from_value(value).map_err(|e| {
                GraphError::RemoteLookup(format!("malformed entity {}: {}", id, e))
            })?;
            entities.insert(id, entity);
        }
        Ok(entities)
    }
}

/// Transport error text, without the request URL and its query string
fn remote_lookup_error(err: reqwest::Error) -> GraphError {
    GraphError::RemoteLookup(err.without_url().to_string())
}

fn query_execution_error(err: reqwest::Error) -> GraphError {
    GraphError::QueryExecution(err.without_url().to_string())
}

fn error_info(error: &serde_json::Value) -> String {
    error
        .get("info")
        .and_then(|info| info.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[async_trait]
impl GraphQuery for WikidataClient {
    async fn query(&self, pattern_body: &str) -> Result<Vec<Row>, GraphError> {
        let query = with_standard_prefixes(pattern_body);
        debug!(bytes = query.len(), "sending SPARQL query");

        let response = self
            .client
            .get(&self.sparql_endpoint)
            .query(&[("query", query.as_str()), ("format", "json")])
            .header(ACCEPT, "application/sparql-results+json")
            .send()
            .await
            .map_err(query_execution_error)?;

        if !response.status().is_success() {
            return Err(GraphError::QueryExecution(format!(
                "SPARQL endpoint returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(query_execution_error)?;
        let parsed: SparqlResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .results
            .bindings
            .into_iter()
            .map(|binding| binding.into_iter().map(|(k, v)| (k, v.value)).collect())
            .collect())
    }
}

#[async_trait]
impl EntitySource for WikidataClient {
    async fn fetch_entities(
        &self,
        ids: &[NativeId],
    ) -> Result<HashMap<String, RawEntity>, GraphError> {
        let mut unique: Vec<NativeId> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let mut entities = HashMap::with_capacity(unique.len());
        for chunk in unique.chunks(self.entity_batch_size) {
            entities.extend(self.fetch_entity_batch(chunk).await?);
        }
        Ok(entities)
    }

    async fn search_entities(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<NativeId>, GraphError> {
        let response: SearchResponse = self
            .get_api(&[
                ("action", "wbsearchentities".to_string()),
                ("language", "en".to_string()),
                ("search", search.to_string()),
                ("type", "item".to_string()),
                ("format", "json".to_string()),
                ("limit", limit.to_string()),
                ("continue", offset.to_string()),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(GraphError::RemoteLookup(error_info(&error)));
        }

        Ok(response.search.iter().filter_map(|hit| NativeId::parse(&hit.id)).collect())
    }

    async fn claim_property(&self, statement_guid: &str) -> Result<Option<String>, GraphError> {
        let response: ClaimsResponse = self
            .get_api(&[
                ("action", "wbgetclaims".to_string()),
                ("claim", statement_guid.to_string()),
                ("format", "json".to_string()),
            ])
            .await?;

        if let Some(error) = response.error {
            return Err(GraphError::RemoteLookup(error_info(&error)));
        }

        let mut properties: Vec<String> = response.claims.into_keys().collect();
        properties.sort();
        Ok(properties.into_iter().next())
    }
}
