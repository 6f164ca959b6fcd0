//! Foreign CURIE -> Wikidata item(s)

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::cache::TtlCache;
use crate::curie::{parse_curie, NamespaceRegistry, NativeId};
use crate::error::{LookupError, Result};
use crate::graph::{escape_literal, GraphQuery};

/// Pattern matching every item that carries `value` under `property`
pub fn equivalent_item_query(property: &str, value: &str) -> String {
    format!("SELECT ?item WHERE {{ ?item wdt:{} \"{}\" }}", property, escape_literal(value))
}

/// Finds the items asserted to carry an external identifier.
///
/// A foreign identifier occasionally maps to more than one item because of
/// duplicated data entry upstream. All matches are returned; that is not an
/// error.
pub struct EquivalenceResolver {
    registry: Arc<NamespaceRegistry>,
    graph: Arc<dyn GraphQuery>,
    cache: TtlCache<String, Vec<NativeId>>,
}

impl EquivalenceResolver {
    pub fn new(
        registry: Arc<NamespaceRegistry>,
        graph: Arc<dyn GraphQuery>,
        cache: TtlCache<String, Vec<NativeId>>,
    ) -> Self {
        Self { registry, graph, cache }
    }

    /// Distinct items holding the CURIE's value, sorted. Empty when none do.
    pub async fn resolve(&self, curie: &str) -> Result<Vec<NativeId>> {
        let (property, value) = parse_curie(&self.registry, curie)?;

        self.cache
            .get_or_try_insert_with(curie.to_string(), || async {
                let rows = self.graph.query(&equivalent_item_query(property, &value)).await?;
                let items: BTreeSet<NativeId> = rows
                    .iter()
                    .flat_map(|row| row.values())
                    .filter_map(|uri| NativeId::parse(uri))
                    .collect();
                debug!(curie, matches = items.len(), "resolved equivalent items");
                Ok::<_, LookupError>(items.into_iter().collect())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_item_query_shape() {
        assert_eq!(
            equivalent_item_query("P699", "DOID:1234"),
            "SELECT ?item WHERE { ?item wdt:P699 \"DOID:1234\" }"
        );
    }

    #[test]
    fn test_equivalent_item_query_escapes_value() {
        let query = equivalent_item_query("P356", "10.1000/\"x\"");
        assert!(query.contains(r#""10.1000/\"x\"""#));
    }
}
