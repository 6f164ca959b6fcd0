//! The `Garbanzo` facade: one owned instance of every lookup component.
//!
//! The HTTP layer and the CLI only ever talk to this type. Native ids cross
//! this boundary as `wd:Q…` strings, statement ids as `wds:<qid>$<uuid>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::TtlCache;
use crate::config::GarbanzoConfig;
use crate::curie::{NamespaceRegistry, NativeId};
use crate::error::{GraphError, Result};
use crate::graph::{EntitySource, GraphQuery, WikidataClient};
use crate::lookup::claims::ClaimsById;
use crate::lookup::{
    closure, Annotation, Catalog, ClaimsRetriever, Concept, ConceptCatalog, ConceptWithDetails,
    EquivalenceResolver, EquivalenceSet, ItemMapping, ItemProperty, Predicate, PropertyMapping,
    Statement, StatementQuery, StatementTraversal, TypeCount,
};

pub struct Garbanzo {
    registry: Arc<NamespaceRegistry>,
    resolver: EquivalenceResolver,
    claims: ClaimsRetriever,
    concepts: Arc<ConceptCatalog>,
    statements: StatementTraversal,
    catalog: Catalog,
}

impl Garbanzo {
    /// Wire every component to the given backends, with fresh caches sized by `config`
    pub fn new(
        config: &GarbanzoConfig,
        registry: Arc<NamespaceRegistry>,
        graph: Arc<dyn GraphQuery>,
        entities: Arc<dyn EntitySource>,
    ) -> Self {
        let concepts = Arc::new(ConceptCatalog::new(
            entities.clone(),
            graph.clone(),
            TtlCache::from_config(config.lookup_cache),
        ));
        Self {
            resolver: EquivalenceResolver::new(
                registry.clone(),
                graph.clone(),
                TtlCache::from_config(config.lookup_cache),
            ),
            claims: ClaimsRetriever::new(registry.clone(), entities.clone()),
            statements: StatementTraversal::new(
                graph.clone(),
                concepts.clone(),
                TtlCache::from_config(config.statement_cache),
            ),
            catalog: Catalog::new(registry.clone(), graph, entities, config.lookup_cache.ttl()),
            concepts,
            registry,
        }
    }

    /// Live Wikidata backends and the default namespace registry
    pub fn from_config(config: &GarbanzoConfig) -> std::result::Result<Self, GraphError> {
        let client = Arc::new(WikidataClient::new(config)?);
        Ok(Self::new(
            config,
            Arc::new(NamespaceRegistry::wikidata_default()),
            client.clone(),
            client,
        ))
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    pub async fn resolve_equivalent_item(&self, curie: &str) -> Result<Vec<String>> {
        let items = self.resolver.resolve(curie).await?;
        Ok(items.iter().map(NativeId::to_curie).collect())
    }

    pub async fn close_exact_matches(&self, curies: &[String]) -> Result<Vec<String>> {
        closure::close_exact_matches(&self.resolver, &self.claims, curies).await
    }

    /// Working state of a closure, for callers that want the per-item breakdown
    pub async fn equivalence_set(&self, curies: &[String]) -> Result<EquivalenceSet> {
        closure::build_equivalence_set(&self.resolver, &self.claims, curies).await
    }

    pub async fn exact_matches(&self, concept_id: &str) -> Result<Vec<String>> {
        closure::exact_matches(&self.resolver, &self.claims, concept_id).await
    }

    pub async fn get_claims_as_curies(&self, ids: &[String]) -> Result<BTreeMap<String, Vec<String>>> {
        self.claims.get_claims_as_curies(&parse_native_ids(ids)).await
    }

    pub async fn get_curie_claims(&self, ids: &[String]) -> Result<ClaimsById> {
        self.claims.get_curie_claims(&parse_native_ids(ids)).await
    }

    pub async fn get_statements(
        &self,
        ids: &[String],
        keywords: &[String],
        types: &[String],
    ) -> Result<Vec<Statement>> {
        self.statements.get_statements(&parse_native_ids(ids), keywords, types).await
    }

    pub async fn query_statements_page(&self, query: &StatementQuery) -> Result<Vec<Statement>> {
        self.statements.query_statements_page(query).await
    }

    pub async fn get_concepts(&self, ids: &[String]) -> Result<BTreeMap<String, Concept>> {
        self.concepts.get_concepts(&parse_native_ids(ids)).await
    }

    /// Only `wd:` ids have details; anything else yields nothing
    pub async fn get_concept_details(&self, concept_id: &str) -> Result<Vec<ConceptWithDetails>> {
        let Some(id) = NativeId::parse_prefixed(concept_id) else {
            return Ok(Vec::new());
        };
        Ok(self.concepts.get_concept_details(&id).await?.into_iter().collect())
    }

    pub async fn search_concepts(
        &self,
        keywords: &[String],
        semantic_groups: &[String],
        page_number: usize,
        page_size: usize,
    ) -> Result<Vec<Concept>> {
        self.concepts
            .search_concepts(keywords, semantic_groups, page_number, page_size)
            .await
    }

    pub async fn equivalent_class(&self, curie: &str, to_namespace: &str) -> Result<Vec<ItemMapping>> {
        self.catalog.equivalent_class(curie, to_namespace).await
    }

    pub async fn map_property_values(
        &self,
        from_property: &str,
        values: &[String],
        to_property: &str,
    ) -> Result<Vec<PropertyMapping>> {
        self.catalog.map_property_values(from_property, values, to_property).await
    }

    pub async fn item_external_ids(&self, ids: &[String]) -> Result<Vec<ItemProperty>> {
        self.catalog.item_external_ids(&parse_native_ids(ids)).await
    }

    pub async fn predicates(&self) -> Result<Vec<Predicate>> {
        self.catalog.predicates().await
    }

    pub async fn type_summary(&self) -> Result<Vec<TypeCount>> {
        self.catalog.type_summary().await
    }

    pub async fn evidence(&self, statement_id: &str) -> Result<Vec<Annotation>> {
        self.catalog.evidence(statement_id).await
    }
}

/// Native ids among `raw`, accepting bare, `wd:` and IRI forms; others are dropped
pub fn parse_native_ids(raw: &[String]) -> Vec<NativeId> {
    let mut ids: Vec<NativeId> = raw.iter().filter_map(|s| NativeId::parse(s)).collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_ids_normalizes() {
        let raw = vec![
            "wd:Q2".to_string(),
            "Q1".to_string(),
            "http://www.wikidata.org/entity/Q2".to_string(),
            "DOID:1234".to_string(),
        ];
        let ids: Vec<String> = parse_native_ids(&raw).iter().map(NativeId::to_curie).collect();
        assert_eq!(ids, vec!["wd:Q1", "wd:Q2"]);
    }

    #[test]
    fn test_from_default_config() {
        let garbanzo = Garbanzo::from_config(&GarbanzoConfig::default()).unwrap();
        assert_eq!(garbanzo.registry().len(), 16);
    }
}
