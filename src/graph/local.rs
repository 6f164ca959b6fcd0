//! In-memory SPARQL backend built on Oxigraph.
//!
//! Holds a small Wikidata-shaped graph (items, direct-claim literals and
//! item links) and answers the same pattern bodies the live endpoint gets,
//! with the standard prefixes prepended. Used for offline fixtures.
//!
//! # Example
//!
//! ```ignore
//! use garbanzo::graph::{GraphQuery, LocalGraph};
//!
//! let graph = LocalGraph::new()?;
//! graph.insert_literal("Q7758678", "P486", "D009755")?;
//! let rows = graph.query("SELECT ?item WHERE { ?item wdt:P486 \"D009755\" }").await?;
//! assert_eq!(rows[0]["item"], "http://www.wikidata.org/entity/Q7758678");
//! ```

use async_trait::async_trait;
use oxigraph::model::{GraphName, Literal, NamedNode, Quad, Term};
use oxigraph::sparql::{QueryResults, SparqlEvaluator};
use oxigraph::store::Store;
use tracing::debug;

use crate::curie::codec::ENTITY_BASE;
use crate::error::GraphError;
use crate::graph::{with_standard_prefixes, GraphQuery, Row};

const DIRECT_PROPERTY_BASE: &str = "http://www.wikidata.org/prop/direct/";
const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
const WIKIBASE_ONTOLOGY: &str = "http://wikiba.se/ontology#";

pub struct LocalGraph {
    store: Store,
}

fn storage_error(err: impl std::fmt::Display) -> GraphError {
    GraphError::QueryExecution(format!("local store: {}", err))
}

fn named_node(iri: String) -> Result<NamedNode, GraphError> {
    NamedNode::new(iri).map_err(storage_error)
}

impl LocalGraph {
    pub fn new() -> Result<Self, GraphError> {
        Ok(Self { store: Store::new().map_err(storage_error)? })
    }

    fn insert(&self, subject: NamedNode, predicate: NamedNode, object: Term) -> Result<(), GraphError> {
        let quad = Quad::new(subject, predicate, object, GraphName::DefaultGraph);
        self.store.insert(&quad).map_err(storage_error)?;
        Ok(())
    }

    /// `wd:<item> wdt:<property> "<value>"`
    pub fn insert_literal(&self, item: &str, property: &str, value: &str) -> Result<(), GraphError> {
        self.insert(
            named_node(format!("{}{}", ENTITY_BASE, item))?,
            named_node(format!("{}{}", DIRECT_PROPERTY_BASE, property))?,
            Literal::new_simple_literal(value).into(),
        )
    }

    /// `wd:<item> wdt:<property> wd:<target>`
    pub fn insert_link(&self, item: &str, property: &str, target: &str) -> Result<(), GraphError> {
        self.insert(
            named_node(format!("{}{}", ENTITY_BASE, item))?,
            named_node(format!("{}{}", DIRECT_PROPERTY_BASE, property))?,
            named_node(format!("{}{}", ENTITY_BASE, target))?.into(),
        )
    }

    /// Property declaration: `wikibase:propertyType` and its `wikibase:directClaim` predicate
    pub fn insert_property(&self, property: &str, property_type: &str) -> Result<(), GraphError> {
        let subject = named_node(format!("{}{}", ENTITY_BASE, property))?;
        self.insert(
            subject.clone(),
            named_node(format!("{}propertyType", WIKIBASE_ONTOLOGY))?,
            named_node(format!("{}{}", WIKIBASE_ONTOLOGY, property_type))?.into(),
        )?;
        self.insert(
            subject,
            named_node(format!("{}directClaim", WIKIBASE_ONTOLOGY))?,
            named_node(format!("{}{}", DIRECT_PROPERTY_BASE, property))?.into(),
        )
    }

    /// English `rdfs:label` for an entity
    pub fn insert_label(&self, item: &str, label: &str) -> Result<(), GraphError> {
        self.insert(
            named_node(format!("{}{}", ENTITY_BASE, item))?,
            named_node(RDFS_LABEL.to_string())?,
            Literal::new_language_tagged_literal(label, "en").map_err(storage_error)?.into(),
        )
    }

    pub fn len(&self) -> Result<usize, GraphError> {
        self.store.len().map_err(storage_error)
    }

    pub fn is_empty(&self) -> Result<bool, GraphError> {
        self.store.is_empty().map_err(storage_error)
    }

    fn execute(&self, pattern_body: &str) -> Result<Vec<Row>, GraphError> {
        let query = with_standard_prefixes(pattern_body);
        let evaluator = SparqlEvaluator::new();
        let parsed_query = evaluator.parse_query(&query).map_err(storage_error)?;
        let results = parsed_query.on_store(&self.store).execute().map_err(storage_error)?;

        let mut rows = Vec::new();
        if let QueryResults::Solutions(solutions) = results {
            for solution in solutions {
                let solution = solution.map_err(storage_error)?;
                let mut row = Row::new();
                for (var, term) in solution.iter() {
                    row.insert(var.as_str().to_string(), term_value(term));
                }
                rows.push(row);
            }
        }
        debug!(rows = rows.len(), "local query evaluated");
        Ok(rows)
    }
}

/// Plain value of a bound term, as the SPARQL JSON results format reports it
fn term_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::BlankNode(node) => node.as_str().to_string(),
        Term::Literal(literal) => literal.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

#[async_trait]
impl GraphQuery for LocalGraph {
    async fn query(&self, pattern_body: &str) -> Result<Vec<Row>, GraphError> {
        self.execute(pattern_body)
    }
}
