//! Knowledge-source metadata and cross-namespace mapping.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::curie::{
    entity_uri_to_curie, make_curie, parse_curie, statement_guid, NamespaceRegistry, NativeId,
};
use crate::error::{CurieError, GraphError, LookupError, Result};
use crate::graph::{escape_literal, EntitySource, GraphQuery};
use crate::lookup::semgroup::{SEMANTIC_GROUPS, UNCOUNTED_TYPES};

const WIKIBASE_ONTOLOGY: &str = "http://wikiba.se/ontology#";
const ENTITY_PAGE_BASE: &str = "https://www.wikidata.org/wiki/";

pub const PREDICATES_QUERY: &str = r#"SELECT ?p ?pt ?pLabel ?d ?aliases WHERE {
  {
    SELECT ?p ?pt ?d (GROUP_CONCAT(DISTINCT ?alias; separator="|") AS ?aliases) WHERE {
      ?p wikibase:propertyType ?pt .
      OPTIONAL { ?p skos:altLabel ?alias FILTER (LANG(?alias) = "en") }
      OPTIONAL { ?p schema:description ?d FILTER (LANG(?d) = "en") }
    } GROUP BY ?p ?pt ?d
  }
  SERVICE wikibase:label { bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en". }
}"#;

/// An item carrying `from_curie`, and its identifier in the target namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemMapping {
    pub from_curie: String,
    pub to_curie: String,
    /// Entity IRI of the item mapped through
    pub item: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub id: String,
    pub name: String,
    pub definition: String,
    pub aliases: Vec<String>,
    /// Wikibase property type, e.g. `WikibaseItem`, `ExternalId`
    pub ptype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub id: String,
    pub group: String,
    pub count: u64,
}

/// An item holding `from_id` under one property and `to_id` under another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyMapping {
    pub item: String,
    #[serde(rename = "itemLabel")]
    pub item_label: String,
    pub from_id: String,
    pub to_id: String,
}

/// An external-id property used by a set of items, with its statement count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemProperty {
    pub property: String,
    #[serde(rename = "propertyLabel")]
    pub property_label: String,
    #[serde(rename = "propertyDescription")]
    pub property_description: String,
    pub count: u64,
}

/// Evidence pointer for a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub id: String,
}

pub fn equivalent_class_query(from_property: &str, value: &str, to_property: &str) -> String {
    format!(
        "SELECT ?item ?to_value WHERE {{ ?item wdt:{} \"{}\" . ?item wdt:{} ?to_value }}",
        from_property,
        escape_literal(value),
        to_property
    )
}

pub fn property_mapping_query(from_property: &str, values: &[String], to_property: &str) -> String {
    let values = values.iter().map(|v| format!("\"{}\"", escape_literal(v))).collect::<Vec<_>>().join(" ");
    format!(
        r#"SELECT ?item ?itemLabel ?from_id ?to_id WHERE {{
  VALUES ?from_id {{ {} }}
  ?item wdt:{} ?from_id .
  ?item wdt:{} ?to_id .
  OPTIONAL {{ ?item rdfs:label ?itemLabel FILTER (LANG(?itemLabel) = "en") }}
}}"#,
        values, from_property, to_property
    )
}

pub fn item_external_ids_query(ids: &[NativeId]) -> String {
    let values = ids.iter().map(NativeId::to_curie).collect::<Vec<_>>().join(" ");
    format!(
        r#"SELECT ?property ?propertyLabel ?propertyDescription ?count WHERE {{
  {{
    SELECT ?direct (COUNT(*) AS ?count) WHERE {{
      VALUES ?item {{ {} }}
      ?item ?direct [] .
    }} GROUP BY ?direct
  }}
  ?property wikibase:propertyType wikibase:ExternalId .
  ?property wikibase:directClaim ?direct .
  OPTIONAL {{ ?property rdfs:label ?propertyLabel FILTER (LANG(?propertyLabel) = "en") }}
  OPTIONAL {{ ?property schema:description ?propertyDescription FILTER (LANG(?propertyDescription) = "en") }}
}}"#,
        values
    )
}

/// `P…` id in bare, `wd:` or IRI form
fn property_id(raw: &str) -> Result<NativeId> {
    NativeId::parse(raw)
        .filter(|id| id.bare().starts_with('P'))
        .ok_or_else(|| LookupError::InvalidRequest(format!("not a property id: {}", raw)))
}

fn parse_count(raw: &str, what: &str) -> std::result::Result<u64, GraphError> {
    raw.parse::<u64>()
        .map_err(|e| GraphError::QueryExecution(format!("bad count for {}: {}", what, e)))
}

pub fn type_count_query(type_qid: &str) -> String {
    format!("SELECT (COUNT(DISTINCT ?type) AS ?count) WHERE {{ ?type wdt:P31 wd:{} }}", type_qid)
}

pub fn evidence_url(statement_guid: &str, property: &str) -> String {
    let qid = statement_guid.split('$').next().unwrap_or_default().to_uppercase();
    format!("{}{}#{}", ENTITY_PAGE_BASE, qid, property)
}

fn size_key(id: &str) -> (usize, String) {
    (id.len(), id.to_string())
}

pub struct Catalog {
    registry: Arc<NamespaceRegistry>,
    graph: Arc<dyn GraphQuery>,
    entities: Arc<dyn EntitySource>,
    predicates: TtlCache<&'static str, Vec<Predicate>>,
    type_counts: TtlCache<&'static str, Vec<TypeCount>>,
}

impl Catalog {
    pub fn new(
        registry: Arc<NamespaceRegistry>,
        graph: Arc<dyn GraphQuery>,
        entities: Arc<dyn EntitySource>,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            registry,
            graph,
            entities,
            predicates: TtlCache::new(1, ttl),
            type_counts: TtlCache::new(1, ttl),
        }
    }

    /// Identifiers in `to_namespace` of every item carrying `curie`
    pub async fn equivalent_class(&self, curie: &str, to_namespace: &str) -> Result<Vec<ItemMapping>> {
        let (from_property, value) = parse_curie(&self.registry, curie)?;
        let to = self.registry.get(to_namespace).ok_or_else(|| CurieError::UnknownNamespace {
            namespace: to_namespace.to_string(),
            curie: curie.to_string(),
        })?;

        let rows = self
            .graph
            .query(&equivalent_class_query(from_property, &value, to.property))
            .await?;
        let mut mappings = Vec::with_capacity(rows.len());
        for row in rows {
            let (Some(item), Some(to_value)) = (row.get("item"), row.get("to_value")) else {
                continue;
            };
            mappings.push(ItemMapping {
                from_curie: curie.to_string(),
                to_curie: make_curie(&self.registry, to.prefix, to_value)?,
                item: item.clone(),
            });
        }
        Ok(mappings)
    }

    /// Bulk translation of `from_property` values to the `to_property` values of the same items
    pub async fn map_property_values(
        &self,
        from_property: &str,
        values: &[String],
        to_property: &str,
    ) -> Result<Vec<PropertyMapping>> {
        let from = property_id(from_property)?;
        let to = property_id(to_property)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.graph.query(&property_mapping_query(from.bare(), values, to.bare())).await?;
        let mut mappings: Vec<PropertyMapping> = rows
            .into_iter()
            .filter_map(|mut row| {
                Some(PropertyMapping {
                    item: entity_uri_to_curie(&row.remove("item")?),
                    item_label: row.remove("itemLabel").unwrap_or_default(),
                    from_id: row.remove("from_id")?,
                    to_id: row.remove("to_id")?,
                })
            })
            .collect();
        mappings.sort_by(|a, b| (&a.from_id, &a.item, &a.to_id).cmp(&(&b.from_id, &b.item, &b.to_id)));
        debug!(values = values.len(), mappings = mappings.len(), "mapped property values");
        Ok(mappings)
    }

    /// External-id properties used by `ids`, most used first
    pub async fn item_external_ids(&self, ids: &[NativeId]) -> Result<Vec<ItemProperty>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.graph.query(&item_external_ids_query(ids)).await?;
        let mut properties = Vec::with_capacity(rows.len());
        for mut row in rows {
            let (Some(property), Some(count)) = (row.remove("property"), row.remove("count")) else {
                continue;
            };
            let property = entity_uri_to_curie(&property);
            properties.push(ItemProperty {
                count: parse_count(&count, &property)?,
                property,
                property_label: row.remove("propertyLabel").unwrap_or_default(),
                property_description: row.remove("propertyDescription").unwrap_or_default(),
            });
        }
        properties.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| size_key(&a.property).cmp(&size_key(&b.property)))
        });
        Ok(properties)
    }

    /// Every property of the knowledge source with its type
    pub async fn predicates(&self) -> Result<Vec<Predicate>> {
        self.predicates
            .get_or_try_insert_with("all", || async {
                let rows = self.graph.query(PREDICATES_QUERY).await?;
                let mut predicates: Vec<Predicate> = rows
                    .into_iter()
                    .filter_map(|mut row| {
                        let id = NativeId::parse(&row.remove("p")?)?.to_curie();
                        let aliases = row
                            .remove("aliases")
                            .map(|a| a.split('|').filter(|s| !s.is_empty()).map(str::to_string).collect())
                            .unwrap_or_default();
                        Some(Predicate {
                            id,
                            name: row.remove("pLabel").unwrap_or_default(),
                            definition: row.remove("d").unwrap_or_default(),
                            aliases,
                            ptype: row
                                .remove("pt")
                                .map(|pt| pt.trim_start_matches(WIKIBASE_ONTOLOGY).to_string())
                                .unwrap_or_default(),
                        })
                    })
                    .collect();
                predicates.sort_by_key(|p| size_key(&p.id));
                debug!(count = predicates.len(), "loaded predicates");
                Ok::<_, LookupError>(predicates)
            })
            .await
    }

    /// Instance counts of every type with a semantic group
    pub async fn type_summary(&self) -> Result<Vec<TypeCount>> {
        self.type_counts
            .get_or_try_insert_with("all", || async {
                let mut counts = Vec::new();
                for (qid, group) in SEMANTIC_GROUPS {
                    if UNCOUNTED_TYPES.contains(qid) {
                        continue;
                    }
                    let rows = self.graph.query(&type_count_query(qid)).await?;
                    let raw = rows.first().and_then(|row| row.get("count")).ok_or_else(|| {
                        GraphError::QueryExecution(format!("no count returned for {}", qid))
                    })?;
                    let count = parse_count(raw, qid)?;
                    counts.push(TypeCount { id: format!("wd:{}", qid), group: group.to_string(), count });
                }
                Ok::<_, LookupError>(counts)
            })
            .await
    }

    /// Link to the entity page section holding the statement
    pub async fn evidence(&self, statement_id: &str) -> Result<Vec<Annotation>> {
        let guid = statement_guid(statement_id);
        match self.entities.claim_property(&guid).await? {
            Some(property) => Ok(vec![Annotation { id: evidence_url(&guid, &property) }]),
            None => {
                warn!(statement = statement_id, "no such statement");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_class_query() {
        assert_eq!(
            equivalent_class_query("P698", "18613750", "P356"),
            "SELECT ?item ?to_value WHERE { ?item wdt:P698 \"18613750\" . ?item wdt:P356 ?to_value }"
        );
    }

    #[test]
    fn test_evidence_url_uppercases_qid() {
        assert_eq!(
            evidence_url("q7758678$1187917E-AF3E-4A5C-9CED-6F2277568D29", "P279"),
            "https://www.wikidata.org/wiki/Q7758678#P279"
        );
    }

    #[test]
    fn test_property_mapping_query_quotes_values() {
        let query = property_mapping_query("P353", &["CDK2".to_string(), "a\"b".to_string()], "P354");
        assert!(query.contains(r#"VALUES ?from_id { "CDK2" "a\"b" }"#));
        assert!(query.contains("?item wdt:P353 ?from_id"));
        assert!(query.contains("?item wdt:P354 ?to_id"));
    }

    #[test]
    fn test_item_external_ids_query_lists_items() {
        let ids = vec![NativeId::parse("Q130888").unwrap(), NativeId::parse("Q131065").unwrap()];
        let query = item_external_ids_query(&ids);
        assert!(query.contains("VALUES ?item { wd:Q130888 wd:Q131065 }"));
        assert!(query.contains("wikibase:propertyType wikibase:ExternalId"));
    }

    #[test]
    fn test_property_id_validation() {
        assert_eq!(property_id("wd:P353").unwrap().bare(), "P353");
        assert!(matches!(property_id("Q5"), Err(LookupError::InvalidRequest(_))));
        assert!(matches!(property_id("P353 } ?x"), Err(LookupError::InvalidRequest(_))));
    }

    #[test]
    fn test_type_count_query() {
        assert!(type_count_query("Q12136").contains("?type wdt:P31 wd:Q12136"));
    }
}
