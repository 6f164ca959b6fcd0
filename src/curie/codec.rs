use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::curie::registry::NamespaceRegistry;
use crate::error::CurieError;

/// Base IRI of Wikidata entities
pub const ENTITY_BASE: &str = "http://www.wikidata.org/entity/";
/// Base IRI of Wikidata statement nodes
pub const STATEMENT_BASE: &str = "http://www.wikidata.org/entity/statement/";
/// Prefix native ids carry when crossing the API boundary
pub const NATIVE_PREFIX: &str = "wd:";
/// Prefix statement ids carry when crossing the API boundary
pub const STATEMENT_PREFIX: &str = "wds:";

/// Decompose a CURIE into the Wikidata property and the literal Wikidata stores.
///
/// ```
/// use garbanzo::curie::{parse_curie, NamespaceRegistry};
///
/// let registry = NamespaceRegistry::wikidata_default();
/// let (property, value) = parse_curie(&registry, "DOID:1234").unwrap();
/// assert_eq!(property, "P699");
/// assert_eq!(value, "DOID:1234");
/// ```
pub fn parse_curie(
    registry: &NamespaceRegistry,
    curie: &str,
) -> Result<(&'static str, String), CurieError> {
    let (namespace, value) = split_curie(curie)?;
    let descriptor = registry.get(namespace).ok_or_else(|| CurieError::UnknownNamespace {
        namespace: namespace.to_string(),
        curie: curie.to_string(),
    })?;
    Ok((descriptor.property, descriptor.forward.apply(value)))
}

/// Build a CURIE from a namespace and a literal as returned by Wikidata.
pub fn make_curie(
    registry: &NamespaceRegistry,
    namespace: &str,
    graph_value: &str,
) -> Result<String, CurieError> {
    let descriptor = registry.get(namespace).ok_or_else(|| CurieError::UnknownNamespace {
        namespace: namespace.to_string(),
        curie: format!("{}:{}", namespace, graph_value),
    })?;
    Ok(format!("{}:{}", descriptor.prefix, descriptor.reverse.apply(graph_value)))
}

/// Build a CURIE for a claim value, looked up by the claim's property.
///
/// `None` when the property maps to no registered namespace.
pub fn curie_for_property(registry: &NamespaceRegistry, property: &str, graph_value: &str) -> Option<String> {
    registry
        .namespace_for_property(property)
        .map(|descriptor| format!("{}:{}", descriptor.prefix, descriptor.reverse.apply(graph_value)))
}

/// Expand a CURIE to the IRI of its namespace
pub fn expand_curie(registry: &NamespaceRegistry, curie: &str) -> Result<String, CurieError> {
    let (namespace, value) = split_curie(curie)?;
    let descriptor = registry.get(namespace).ok_or_else(|| CurieError::UnknownNamespace {
        namespace: namespace.to_string(),
        curie: curie.to_string(),
    })?;
    Ok(format!("{}{}", descriptor.uri_prefix, value))
}

fn split_curie(curie: &str) -> Result<(&str, &str), CurieError> {
    let mut parts = curie.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(namespace), Some(value), None) => Ok((namespace, value)),
        _ => Err(CurieError::Malformed(curie.to_string())),
    }
}

fn native_id_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[QPL][0-9]+$").expect("native id pattern is valid"))
}

/// A Wikidata entity identifier, stored bare (`Q7758678`).
///
/// Parsing accepts the bare form, the `wd:` CURIE form and the full entity
/// IRI, so every component can normalize before comparing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(String);

impl NativeId {
    pub fn parse(raw: &str) -> Option<NativeId> {
        let trimmed = raw.trim();
        let bare = trimmed
            .strip_prefix(ENTITY_BASE)
            .or_else(|| trimmed.strip_prefix(NATIVE_PREFIX))
            .unwrap_or(trimmed);
        if native_id_regex().is_match(bare) {
            Some(NativeId(bare.to_string()))
        } else {
            None
        }
    }

    /// Only the `wd:`-prefixed form counts as a native id at the API boundary
    pub fn parse_prefixed(raw: &str) -> Option<NativeId> {
        raw.trim().strip_prefix(NATIVE_PREFIX).and_then(NativeId::parse)
    }

    pub fn bare(&self) -> &str {
        &self.0
    }

    /// `wd:Q…` form
    pub fn to_curie(&self) -> String {
        format!("{}{}", NATIVE_PREFIX, self.0)
    }

    pub fn to_uri(&self) -> String {
        format!("{}{}", ENTITY_BASE, self.0)
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NATIVE_PREFIX, self.0)
    }
}

impl Serialize for NativeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rewrite an entity IRI to the `wd:` form; other values pass through
pub fn entity_uri_to_curie(value: &str) -> String {
    match value.strip_prefix(ENTITY_BASE) {
        Some(bare) => format!("{}{}", NATIVE_PREFIX, bare),
        None => value.to_string(),
    }
}

/// Rewrite a statement node IRI to the local `wds:<qid>$<uuid>` convention.
///
/// Wikidata statement IRIs separate the entity from the uuid with a hyphen;
/// only that first hyphen becomes `$`, the uuid keeps its own.
pub fn statement_id_from_uri(uri: &str) -> String {
    let local = uri.replacen(STATEMENT_BASE, STATEMENT_PREFIX, 1);
    local.replacen('-', "$", 1)
}

/// Statement GUID as the action API expects it (`Q1$uuid`), from any accepted form
pub fn statement_guid(statement_id: &str) -> String {
    let trimmed = statement_id.trim();
    let without_prefix = if trimmed.to_lowercase().starts_with(STATEMENT_PREFIX) {
        &trimmed[STATEMENT_PREFIX.len()..]
    } else {
        trimmed.strip_prefix(STATEMENT_BASE).unwrap_or(trimmed)
    };
    if without_prefix.contains('$') {
        without_prefix.to_string()
    } else {
        without_prefix.replacen('-', "$", 1)
    }
}
