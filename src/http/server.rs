//! HTTP API Server for Garbanzo
//!
//! Exposes the lookup core as a read-only REST API in the knowledge-beacon
//! style: concepts, exact matches, statements, evidence, predicates and type
//! summaries, plus the CURIE translation helpers.

use crate::{
    error::LookupError,
    lookup::{
        Annotation, Concept, ConceptWithDetails, ItemMapping, ItemProperty, Predicate,
        PropertyMapping, Statement, StatementQuery, TypeCount,
    },
    service::Garbanzo,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending identifier, echoed back on client errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Message shown for upstream failures; details go to the log only
pub const UPSTREAM_FAILURE: &str = "Knowledge graph request failed";

/// Space-delimited list parameter
fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split_whitespace().map(str::to_string).collect()).unwrap_or_default()
}

/// Comma-delimited list parameter
fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Value of a required query parameter
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        ApiError(LookupError::InvalidRequest(format!("missing required parameter '{}'", name)))
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptsParams {
    pub keywords: Option<String>,
    pub semantic_groups: Option<String>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExactMatchesParams {
    /// Space-delimited CURIEs
    pub c: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementsParams {
    pub s: Option<String>,
    pub t: Option<String>,
    pub relations: Option<String>,
    pub keywords: Option<String>,
    pub semantic_groups: Option<String>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

impl From<StatementsParams> for StatementQuery {
    fn from(params: StatementsParams) -> Self {
        StatementQuery {
            sources: split_list(params.s.as_deref()),
            targets: split_list(params.t.as_deref()),
            relations: split_list(params.relations.as_deref()),
            keywords: split_list(params.keywords.as_deref()),
            types: split_list(params.semantic_groups.as_deref()),
            page_number: params.page_number,
            page_size: params.page_size,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CurieParams {
    pub curie: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EquivalentClassParams {
    pub curie: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimsParams {
    /// Space-delimited native ids
    pub ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyMappingParams {
    pub from_prop: Option<String>,
    /// Comma-delimited property values
    pub from_ids: Option<String>,
    pub to_prop: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemExternalIdsParams {
    /// Comma-delimited item ids
    pub qid: Option<String>,
}

/// Shared application state
pub struct AppState {
    pub garbanzo: Arc<Garbanzo>,
}

/// Lookup failure mapped onto an HTTP status
pub struct ApiError(LookupError);

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            LookupError::Curie(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse { error: err.to_string(), id: Some(err.identifier().to_string()) },
            ),
            LookupError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse { error: msg.clone(), id: None })
            }
            other => {
                error!(error = %other, "upstream lookup failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse { error: UPSTREAM_FAILURE.to_string(), id: None },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Create the HTTP server with all routes
pub fn create_server(garbanzo: Arc<Garbanzo>) -> Router {
    let state = Arc::new(AppState { garbanzo });

    // Configure CORS
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/concepts", get(search_concepts))
        .route("/concepts/:concept_id", get(get_concept_details))
        .route("/exactmatches", get(get_exact_matches_to_concept_list))
        .route("/exactmatches/:concept_id", get(get_exact_matches_to_concept))
        .route("/statements", get(get_statements))
        .route("/evidence/:statement_id", get(get_evidence))
        .route("/predicates", get(get_predicates))
        .route("/types", get(get_types))
        .route("/getEquivalentWikidataItem", get(get_equivalent_wikidata_item))
        .route("/getEquivalentClass", get(get_equivalent_class))
        .route("/claims", get(get_claims))
        .route("/query", get(map_property_values))
        .route("/item_externalids", get(get_item_external_ids))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(SuccessResponse { message: "Garbanzo HTTP API is running".to_string() })
}

/// GET /concepts - Keyword search over items, one page at a time
async fn search_concepts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConceptsParams>,
) -> Result<Json<Vec<Concept>>, ApiError> {
    let keywords = required(params.keywords.as_deref(), "keywords")?;
    let concepts = state
        .garbanzo
        .search_concepts(
            &split_list(Some(keywords)),
            &split_list(params.semantic_groups.as_deref()),
            params.page_number.unwrap_or(1),
            params.page_size.unwrap_or(10),
        )
        .await?;
    Ok(Json(concepts))
}

/// GET /concepts/:conceptId - Concept with every direct claim
async fn get_concept_details(
    State(state): State<Arc<AppState>>,
    Path(concept_id): Path<String>,
) -> Result<Json<Vec<ConceptWithDetails>>, ApiError> {
    Ok(Json(state.garbanzo.get_concept_details(&concept_id).await?))
}

/// GET /exactmatches/:conceptId - Identifiers equivalent to one concept
async fn get_exact_matches_to_concept(
    State(state): State<Arc<AppState>>,
    Path(concept_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.garbanzo.exact_matches(&concept_id).await?))
}

/// GET /exactmatches?c= - Closure over a set of identifiers
async fn get_exact_matches_to_concept_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExactMatchesParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let inputs = split_list(params.c.as_deref());
    Ok(Json(state.garbanzo.close_exact_matches(&inputs).await?))
}

/// GET /statements - Paged statements around source items
async fn get_statements(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatementsParams>,
) -> Result<Json<Vec<Statement>>, ApiError> {
    required(params.s.as_deref(), "s")?;
    let query = StatementQuery::from(params);
    Ok(Json(state.garbanzo.query_statements_page(&query).await?))
}

/// GET /evidence/:statementId - Where a statement can be inspected
async fn get_evidence(
    State(state): State<Arc<AppState>>,
    Path(statement_id): Path<String>,
) -> Result<Json<Vec<Annotation>>, ApiError> {
    Ok(Json(state.garbanzo.evidence(&statement_id).await?))
}

/// GET /predicates - Every property with its type
async fn get_predicates(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Predicate>>, ApiError> {
    Ok(Json(state.garbanzo.predicates().await?))
}

/// GET /types - Instance counts per semantic-group type
async fn get_types(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TypeCount>>, ApiError> {
    Ok(Json(state.garbanzo.type_summary().await?))
}

/// GET /getEquivalentWikidataItem?curie= - Items carrying a CURIE
async fn get_equivalent_wikidata_item(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CurieParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let curie = required(params.curie.as_deref(), "curie")?;
    Ok(Json(state.garbanzo.resolve_equivalent_item(curie).await?))
}

/// GET /getEquivalentClass?curie=&namespace= - The CURIE's identifier in another namespace
async fn get_equivalent_class(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EquivalentClassParams>,
) -> Result<Json<Vec<ItemMapping>>, ApiError> {
    let curie = required(params.curie.as_deref(), "curie")?;
    let namespace = required(params.namespace.as_deref(), "namespace")?;
    Ok(Json(state.garbanzo.equivalent_class(curie, namespace).await?))
}

/// GET /claims?ids= - CURIEs carried by each item
async fn get_claims(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ClaimsParams>,
) -> Result<Json<BTreeMap<String, Vec<String>>>, ApiError> {
    let ids = split_list(Some(required(params.ids.as_deref(), "ids")?));
    Ok(Json(state.garbanzo.get_claims_as_curies(&ids).await?))
}

/// GET /query?from_prop=&from_ids=&to_prop= - Property values translated through the items holding them
async fn map_property_values(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PropertyMappingParams>,
) -> Result<Json<Vec<PropertyMapping>>, ApiError> {
    let from_prop = required(params.from_prop.as_deref(), "from_prop")?;
    let to_prop = required(params.to_prop.as_deref(), "to_prop")?;
    let values = split_commas(required(params.from_ids.as_deref(), "from_ids")?);
    Ok(Json(state.garbanzo.map_property_values(from_prop, &values, to_prop).await?))
}

/// GET /item_externalids?qid= - External-id properties used by items
async fn get_item_external_ids(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ItemExternalIdsParams>,
) -> Result<Json<Vec<ItemProperty>>, ApiError> {
    let ids = split_commas(required(params.qid.as_deref(), "qid")?);
    Ok(Json(state.garbanzo.item_external_ids(&ids).await?))
}

/// Start the HTTP server on the specified address
pub async fn start_server(addr: &str, garbanzo: Arc<Garbanzo>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(garbanzo);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Garbanzo HTTP API server listening on http://{}", addr);
    info!("  GET /concepts?keywords=             - Search concepts");
    info!("  GET /concepts/:conceptId             - Concept details");
    info!("  GET /exactmatches/:conceptId         - Exact matches of one concept");
    info!("  GET /exactmatches?c=                 - Exact-match closure");
    info!("  GET /statements?s=                   - Statements around items");
    info!("  GET /evidence/:statementId           - Statement evidence");
    info!("  GET /predicates                      - Predicates");
    info!("  GET /types                           - Type summary");
    info!("  GET /getEquivalentWikidataItem?curie= - Items for a CURIE");
    info!("  GET /getEquivalentClass?curie=&namespace= - CURIE in another namespace");
    info!("  GET /claims?ids=                     - CURIEs per item");
    info!("  GET /query?from_prop=&from_ids=&to_prop= - Map property values");
    info!("  GET /item_externalids?qid=           - External-id properties of items");
    info!("  GET /health                          - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
