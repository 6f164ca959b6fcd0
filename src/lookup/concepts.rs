//! Concept records: label, description, aliases and semantic groups of an item.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::cache::TtlCache;
use crate::curie::{entity_uri_to_curie, NativeId};
use crate::error::{LookupError, Result};
use crate::graph::{EntitySource, GraphQuery, RawEntity};
use crate::lookup::claims::ClaimValue;
use crate::lookup::semgroup::semantic_groups;

pub const INSTANCE_OF: &str = "P31";
/// `wbsearchentities` refuses larger pages
pub const MAX_SEARCH_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub definition: String,
    pub synonyms: Vec<String>,
    #[serde(rename = "semanticGroup", serialize_with = "space_joined")]
    pub semantic_groups: BTreeSet<String>,
}

fn space_joined<S: Serializer>(groups: &BTreeSet<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let joined = groups.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
    serializer.serialize_str(&joined)
}

impl Concept {
    /// English-language view of an entity record
    pub fn from_entity(entity: &RawEntity) -> Option<Concept> {
        let id = NativeId::parse(&entity.id)?;
        let types: Vec<String> = entity
            .claims
            .get(INSTANCE_OF)
            .into_iter()
            .flatten()
            .filter_map(|statement| {
                match ClaimValue::decode(&statement.mainsnak.snaktype, statement.mainsnak.datavalue.as_ref()) {
                    ClaimValue::EntityId(qid) => Some(qid),
                    _ => None,
                }
            })
            .collect();

        Some(Concept {
            id: id.to_curie(),
            name: entity.label("en").unwrap_or_default().to_string(),
            definition: entity.description("en").unwrap_or_default().to_string(),
            synonyms: entity.aliases("en"),
            semantic_groups: semantic_groups(types.iter().map(String::as_str)),
        })
    }

    pub fn in_any_group(&self, groups: &[String]) -> bool {
        groups.iter().any(|g| self.semantic_groups.contains(g))
    }
}

/// One direct claim of a concept, labelled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptDetail {
    pub tag: String,
    pub prop: String,
    #[serde(rename = "propLabel")]
    pub prop_label: String,
    pub value: String,
    #[serde(rename = "valueLabel")]
    pub value_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptWithDetails {
    #[serde(flatten)]
    pub concept: Concept,
    pub details: Vec<ConceptDetail>,
}

pub fn concept_details_query(id: &NativeId) -> String {
    format!(
        r#"SELECT DISTINCT ?prop ?propLabel ?value ?valueLabel WHERE {{
  {} ?p ?value .
  ?prop wikibase:directClaim ?p .
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" . }}
}}"#,
        id.to_curie()
    )
}

pub struct ConceptCatalog {
    entities: Arc<dyn EntitySource>,
    graph: Arc<dyn GraphQuery>,
    cache: TtlCache<NativeId, Concept>,
}

impl ConceptCatalog {
    pub fn new(
        entities: Arc<dyn EntitySource>,
        graph: Arc<dyn GraphQuery>,
        cache: TtlCache<NativeId, Concept>,
    ) -> Self {
        Self { entities, graph, cache }
    }

    /// Concepts keyed by `wd:Q…`; uncached ids are fetched in one batch
    pub async fn get_concepts(&self, ids: &[NativeId]) -> Result<BTreeMap<String, Concept>> {
        let mut concepts = BTreeMap::new();
        let mut missing: Vec<NativeId> = Vec::new();
        for id in ids {
            match self.cache.get(id) {
                Some(concept) => {
                    concepts.insert(id.to_curie(), concept);
                }
                None => missing.push(id.clone()),
            }
        }
        missing.sort();
        missing.dedup();

        if !missing.is_empty() {
            debug!(cached = concepts.len(), missing = missing.len(), "fetching concepts");
            let entities = self.entities.fetch_entities(&missing).await?;
            for concept in entities.values().filter_map(Concept::from_entity) {
                if let Some(id) = NativeId::parse(&concept.id) {
                    self.cache.insert(id, concept.clone());
                }
                concepts.insert(concept.id.clone(), concept);
            }
        }
        Ok(concepts)
    }

    pub async fn get_concept(&self, id: &NativeId) -> Result<Option<Concept>> {
        let mut concepts = self.get_concepts(std::slice::from_ref(id)).await?;
        Ok(concepts.remove(&id.to_curie()))
    }

    /// The concept plus every direct claim it makes
    pub async fn get_concept_details(&self, id: &NativeId) -> Result<Option<ConceptWithDetails>> {
        let Some(concept) = self.get_concept(id).await? else {
            return Ok(None);
        };
        let rows = self.graph.query(&concept_details_query(id)).await?;
        let details = rows
            .into_iter()
            .map(|mut row| {
                let mut take = |key: &str| row.remove(key).unwrap_or_default();
                let prop = entity_uri_to_curie(&take("prop"));
                ConceptDetail {
                    tag: prop.clone(),
                    prop,
                    prop_label: take("propLabel"),
                    value: entity_uri_to_curie(&take("value")),
                    value_label: take("valueLabel"),
                }
            })
            .collect();
        Ok(Some(ConceptWithDetails { concept, details }))
    }

    /// Keyword search, one page at a time, optionally restricted to semantic groups
    pub async fn search_concepts(
        &self,
        keywords: &[String],
        groups: &[String],
        page_number: usize,
        page_size: usize,
    ) -> Result<Vec<Concept>> {
        if page_size > MAX_SEARCH_PAGE_SIZE {
            return Err(LookupError::InvalidRequest(format!(
                "pageSize can not be greater than {}",
                MAX_SEARCH_PAGE_SIZE
            )));
        }
        if page_number == 0 || page_size == 0 {
            return Err(LookupError::InvalidRequest("pageNumber and pageSize start at 1".to_string()));
        }

        let offset = (page_number - 1)
            .checked_mul(page_size)
            .ok_or_else(|| LookupError::InvalidRequest(format!("pageNumber {} is out of range", page_number)))?;

        let search = keywords.join(" ");
        let hits = self.entities.search_entities(&search, page_size, offset).await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let mut concepts = self.get_concepts(&hits).await?;
        Ok(hits
            .iter()
            .filter_map(|id| concepts.remove(&id.to_curie()))
            .filter(|concept| groups.is_empty() || concept.in_any_group(groups))
            .collect())
    }
}
