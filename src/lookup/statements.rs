//! Item-valued statements around a set of items, and the filters applied to them.
//!
//! A statement is reported in triple form with English labels. The forward
//! query finds statements made by the items, the reverse query statements
//! pointing at them. Results are sorted by statement id so that pages are
//! stable across calls.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::TtlCache;
use crate::curie::{entity_uri_to_curie, statement_id_from_uri, NativeId};
use crate::error::{LookupError, Result};
use crate::graph::{GraphQuery, Row};
use crate::lookup::concepts::ConceptCatalog;

pub const DEFAULT_PAGE_NUMBER: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub id: String,
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Statement {
    fn labels(&self) -> String {
        format!("{}{}{}", self.subject.name, self.predicate.name, self.object.name).to_lowercase()
    }

    fn from_row(mut row: Row) -> Option<Statement> {
        let mut node = |id_key: &str, label_key: &str| -> Option<Node> {
            let id = entity_uri_to_curie(&row.remove(id_key)?);
            Some(Node { id, name: row.remove(label_key).unwrap_or_default() })
        };
        let subject = node("item", "itemLabel")?;
        let predicate = node("property", "propertyLabel")?;
        let object = node("value", "valueLabel")?;
        let id = statement_id_from_uri(&row.remove("id")?);
        Some(Statement { id, subject, predicate, object })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Statements whose subject is one of the items
    Forward,
    /// Statements whose object is one of the items
    Reverse,
}

pub fn statements_query(ids: &[NativeId], direction: Direction) -> String {
    let values = ids.iter().map(NativeId::to_curie).collect::<Vec<_>>().join(" ");
    let bound = match direction {
        Direction::Forward => "?item",
        Direction::Reverse => "?value",
    };
    format!(
        r#"SELECT ?item ?itemLabel ?property ?propertyLabel ?value ?valueLabel ?id WHERE {{
  VALUES {} {{ {} }}
  ?item ?propertyclaim ?id .
  ?property wikibase:propertyType wikibase:WikibaseItem .
  ?property wikibase:claim ?propertyclaim .
  ?id ?b ?value .
  FILTER(regex(str(?b), "http://www.wikidata.org/prop/statement"))
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "en" }}
}}"#,
        bound, values
    )
}

/// Statements whose combined labels contain any keyword, ignoring case
pub fn filter_by_keywords(statements: Vec<Statement>, keywords: &[String]) -> Vec<Statement> {
    if keywords.is_empty() {
        return statements;
    }
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    statements
        .into_iter()
        .filter(|statement| {
            let labels = statement.labels();
            keywords.iter().any(|k| labels.contains(k.as_str()))
        })
        .collect()
}

/// The `page_number`-th (1-based) slice of `page_size` items
pub fn paginate<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Vec<T> {
    let start = page_number.saturating_sub(1).saturating_mul(page_size);
    items.into_iter().skip(start).take(page_size).collect()
}

/// Normalized `wd:` form for a predicate given bare or prefixed
fn predicate_key(raw: &str) -> String {
    NativeId::parse(raw).map(|id| id.to_curie()).unwrap_or_else(|| raw.trim().to_string())
}

/// Parameters of a paged statement search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementQuery {
    /// Items on either end of the statement; non-native ids are ignored
    pub sources: Vec<String>,
    /// When set, the end opposite the source must be one of these
    pub targets: Vec<String>,
    /// Predicate ids to keep
    pub relations: Vec<String>,
    pub keywords: Vec<String>,
    /// Semantic group codes
    pub types: Vec<String>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

fn native_ids(raw: &[String]) -> BTreeSet<NativeId> {
    raw.iter().filter_map(|s| NativeId::parse_prefixed(s)).collect()
}

pub struct StatementTraversal {
    graph: Arc<dyn GraphQuery>,
    concepts: Arc<ConceptCatalog>,
    cache: TtlCache<Vec<NativeId>, Vec<Statement>>,
}

impl StatementTraversal {
    pub fn new(
        graph: Arc<dyn GraphQuery>,
        concepts: Arc<ConceptCatalog>,
        cache: TtlCache<Vec<NativeId>, Vec<Statement>>,
    ) -> Self {
        Self { graph, concepts, cache }
    }

    async fn items(&self, ids: &[NativeId], direction: Direction) -> Result<Vec<Statement>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.graph.query(&statements_query(ids, direction)).await?;
        let statements: Vec<Statement> = rows.into_iter().filter_map(Statement::from_row).collect();
        debug!(?direction, items = ids.len(), statements = statements.len(), "statement query");
        Ok(statements)
    }

    pub async fn forward_items(&self, ids: &[NativeId]) -> Result<Vec<Statement>> {
        self.items(ids, Direction::Forward).await
    }

    pub async fn reverse_items(&self, ids: &[NativeId]) -> Result<Vec<Statement>> {
        self.items(ids, Direction::Reverse).await
    }

    /// Forward and reverse statements, sorted by statement id
    pub async fn query_statements(&self, ids: &[NativeId]) -> Result<Vec<Statement>> {
        let mut key = ids.to_vec();
        key.sort();
        key.dedup();

        self.cache
            .get_or_try_insert_with(key.clone(), || async {
                let mut statements = self.forward_items(&key).await?;
                statements.extend(self.reverse_items(&key).await?);
                statements.sort_by(|a, b| a.id.cmp(&b.id));
                statements.dedup_by(|a, b| a.id == b.id);
                Ok::<_, LookupError>(statements)
            })
            .await
    }

    /// Keyword filter (any keyword), then semantic-group filter (either end)
    pub async fn filter_statements(
        &self,
        statements: Vec<Statement>,
        keywords: &[String],
        types: &[String],
    ) -> Result<Vec<Statement>> {
        let statements = filter_by_keywords(statements, keywords);
        if types.is_empty() || statements.is_empty() {
            return Ok(statements);
        }

        let ends: Vec<NativeId> = statements
            .iter()
            .flat_map(|s| [&s.subject.id, &s.object.id])
            .filter_map(|id| NativeId::parse(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let concepts = self.concepts.get_concepts(&ends).await?;
        let matches = |id: &str| concepts.get(id).map_or(false, |c| c.in_any_group(types));

        Ok(statements
            .into_iter()
            .filter(|s| matches(&s.subject.id) || matches(&s.object.id))
            .collect())
    }

    pub async fn get_statements(
        &self,
        ids: &[NativeId],
        keywords: &[String],
        types: &[String],
    ) -> Result<Vec<Statement>> {
        let statements = self.query_statements(ids).await?;
        self.filter_statements(statements, keywords, types).await
    }

    /// Every statement matching `query`, before paging
    pub async fn query_and_filter(&self, query: &StatementQuery) -> Result<Vec<Statement>> {
        let sources = native_ids(&query.sources);
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<NativeId> = sources.iter().cloned().collect();
        let mut statements = self.query_statements(&ids).await?;

        let targets = native_ids(&query.targets);
        if !targets.is_empty() {
            let source_ids: BTreeSet<String> = sources.iter().map(NativeId::to_curie).collect();
            let target_ids: BTreeSet<String> = targets.iter().map(NativeId::to_curie).collect();
            statements.retain(|s| {
                (source_ids.contains(&s.subject.id) && target_ids.contains(&s.object.id))
                    || (source_ids.contains(&s.object.id) && target_ids.contains(&s.subject.id))
            });
        }

        if !query.relations.is_empty() {
            let relations: BTreeSet<String> = query.relations.iter().map(|r| predicate_key(r)).collect();
            statements.retain(|s| relations.contains(&s.predicate.id));
        }

        self.filter_statements(statements, &query.keywords, &query.types).await
    }

    /// One page of [`StatementTraversal::query_and_filter`]
    pub async fn query_statements_page(&self, query: &StatementQuery) -> Result<Vec<Statement>> {
        let page_number = query.page_number.unwrap_or(DEFAULT_PAGE_NUMBER);
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_number == 0 || page_size == 0 {
            return Err(LookupError::InvalidRequest("pageNumber and pageSize start at 1".to_string()));
        }
        let statements = self.query_and_filter(query).await?;
        Ok(paginate(statements, page_number, page_size))
    }
}
