//! Static table of external namespaces and their Wikidata properties.
//!
//! Each namespace is bound to one Wikidata property (the property whose
//! `external-id` values hold identifiers of that namespace) and a pair of
//! value transforms:
//!
//! - `forward`: CURIE value -> literal as stored in Wikidata
//! - `reverse`: literal as stored in Wikidata -> CURIE value
//!
//! Most namespaces store the bare value, so both transforms are identity.
//! A few (DOID, ECO) repeat the namespace token inside the stored literal.

use std::collections::HashMap;

/// String transform applied to a namespace value.
///
/// Closed set: new behaviour means a new variant, not an injected function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    Identity,
    /// Prepend the given token
    AddPrefix(&'static str),
    /// Remove the given token from the start, if present
    StripPrefix(&'static str),
}

impl ValueTransform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            ValueTransform::Identity => value.to_string(),
            ValueTransform::AddPrefix(prefix) => format!("{}{}", prefix, value),
            ValueTransform::StripPrefix(prefix) => {
                value.strip_prefix(prefix).unwrap_or(value).to_string()
            }
        }
    }
}

impl Default for ValueTransform {
    fn default() -> Self {
        ValueTransform::Identity
    }
}

/// One registered external namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDescriptor {
    /// CURIE prefix, e.g. `MESH`
    pub prefix: &'static str,
    /// Wikidata property id, e.g. `P486`
    pub property: &'static str,
    /// IRI base the namespace expands to
    pub uri_prefix: &'static str,
    pub forward: ValueTransform,
    pub reverse: ValueTransform,
}

impl NamespaceDescriptor {
    /// Descriptor with identity transforms in both directions
    pub const fn new(prefix: &'static str, property: &'static str, uri_prefix: &'static str) -> Self {
        Self {
            prefix,
            property,
            uri_prefix,
            forward: ValueTransform::Identity,
            reverse: ValueTransform::Identity,
        }
    }

    /// Descriptor whose Wikidata literal repeats `token` in front of the value
    pub const fn embedded_prefix(
        prefix: &'static str,
        property: &'static str,
        uri_prefix: &'static str,
        token: &'static str,
    ) -> Self {
        Self {
            prefix,
            property,
            uri_prefix,
            forward: ValueTransform::AddPrefix(token),
            reverse: ValueTransform::StripPrefix(token),
        }
    }
}

const WIKIDATA_NAMESPACES: &[NamespaceDescriptor] = &[
    NamespaceDescriptor::new("NCBITaxon", "P685", "http://purl.obolibrary.org/obo/NCBITaxon_"),
    NamespaceDescriptor::new("NCBIGene", "P351", "http://www.ncbi.nlm.nih.gov/gene/"),
    NamespaceDescriptor::new("UniProtKB", "P352", "http://identifiers.org/uniprot/"),
    NamespaceDescriptor::embedded_prefix(
        "DOID",
        "P699",
        "http://purl.obolibrary.org/obo/DOID_",
        "DOID:",
    ),
    NamespaceDescriptor::new("OMIM", "P492", "http://purl.obolibrary.org/obo/OMIM_"),
    NamespaceDescriptor::new("MESH", "P486", "http://purl.obolibrary.org/obo/MESH_"),
    NamespaceDescriptor::new("UMLS", "P2892", "http://purl.obolibrary.org/obo/UMLS_"),
    NamespaceDescriptor::embedded_prefix(
        "ECO",
        "P3811",
        "http://purl.obolibrary.org/obo/ECO_",
        "ECO:",
    ),
    NamespaceDescriptor::new("PMID", "P698", "http://www.ncbi.nlm.nih.gov/pubmed/"),
    NamespaceDescriptor::new("DOI", "P356", "http://dx.doi.org/"),
    NamespaceDescriptor::new("CHEBI", "P683", "http://purl.obolibrary.org/obo/CHEBI_"),
    NamespaceDescriptor::new("DrugBank", "P715", "http://www.drugbank.ca/drugs/"),
    NamespaceDescriptor::new("RXCUI", "P3345", "http://purl.bioontology.org/ontology/RXNORM/"),
    NamespaceDescriptor::new("UNII", "P652", "http://fdasis.nlm.nih.gov/srs/unii/"),
    NamespaceDescriptor::new("CAS", "P231", "http://identifiers.org/cas/"),
    NamespaceDescriptor::new("ChEMBL", "P592", "http://identifiers.org/chembl.compound/"),
];

/// Immutable namespace table, built once at startup and shared read-only
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    by_prefix: HashMap<&'static str, NamespaceDescriptor>,
    by_property: HashMap<&'static str, &'static str>,
}

impl NamespaceRegistry {
    pub fn builder() -> NamespaceRegistryBuilder {
        NamespaceRegistryBuilder::default()
    }

    /// The namespaces Wikidata carries as external-id properties
    pub fn wikidata_default() -> Self {
        WIKIDATA_NAMESPACES
            .iter()
            .cloned()
            .fold(Self::builder(), NamespaceRegistryBuilder::register)
            .build()
    }

    pub fn get(&self, prefix: &str) -> Option<&NamespaceDescriptor> {
        self.by_prefix.get(prefix)
    }

    /// Namespace whose identifiers live in the given Wikidata property
    pub fn namespace_for_property(&self, property: &str) -> Option<&NamespaceDescriptor> {
        self.by_property.get(property).and_then(|prefix| self.by_prefix.get(prefix))
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.by_prefix.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespaceDescriptor> {
        self.by_prefix.values()
    }
}

#[derive(Debug, Default)]
pub struct NamespaceRegistryBuilder {
    descriptors: Vec<NamespaceDescriptor>,
}

impl NamespaceRegistryBuilder {
    /// Add a namespace; a later registration with the same prefix replaces the earlier one
    pub fn register(mut self, descriptor: NamespaceDescriptor) -> Self {
        self.descriptors.retain(|d| d.prefix != descriptor.prefix);
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> NamespaceRegistry {
        let mut registry = NamespaceRegistry::default();
        for descriptor in self.descriptors {
            registry.by_property.insert(descriptor.property, descriptor.prefix);
            registry.by_prefix.insert(descriptor.prefix, descriptor);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        assert_eq!(ValueTransform::Identity.apply("D009755"), "D009755");
        assert_eq!(ValueTransform::default(), ValueTransform::Identity);
    }

    #[test]
    fn test_add_prefix_transform() {
        assert_eq!(ValueTransform::AddPrefix("DOID:").apply("1234"), "DOID:1234");
        assert_eq!(ValueTransform::AddPrefix("ECO:").apply(""), "ECO:");
    }

    #[test]
    fn test_strip_prefix_transform() {
        assert_eq!(ValueTransform::StripPrefix("DOID:").apply("DOID:1234"), "1234");
        assert_eq!(ValueTransform::StripPrefix("DOID:").apply("1234"), "1234");
        assert_eq!(ValueTransform::StripPrefix("DOID:").apply("DOID:DOID:1234"), "DOID:1234");
        assert_eq!(ValueTransform::StripPrefix("DOID:").apply("1234DOID:"), "1234DOID:");
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = NamespaceRegistry::wikidata_default();
        assert_eq!(registry.len(), 16);
        assert_eq!(registry.get("MESH").unwrap().property, "P486");
        assert_eq!(registry.get("PMID").unwrap().property, "P698");
        assert!(registry.get("mesh").is_none());

        let doid = registry.get("DOID").unwrap();
        assert_eq!(doid.forward, ValueTransform::AddPrefix("DOID:"));
        assert_eq!(doid.reverse, ValueTransform::StripPrefix("DOID:"));

        let identity_count = registry
            .iter()
            .filter(|d| d.forward == ValueTransform::Identity && d.reverse == ValueTransform::Identity)
            .count();
        assert_eq!(identity_count, 14);
    }

    #[test]
    fn test_reverse_property_index() {
        let registry = NamespaceRegistry::wikidata_default();
        assert_eq!(registry.namespace_for_property("P699").unwrap().prefix, "DOID");
        assert_eq!(registry.namespace_for_property("P486").unwrap().prefix, "MESH");
        assert!(registry.namespace_for_property("P31").is_none());
    }

    #[test]
    fn test_builder_replaces_duplicate_prefix() {
        let registry = NamespaceRegistry::builder()
            .register(NamespaceDescriptor::new("X", "P1", "http://x/"))
            .register(NamespaceDescriptor::new("X", "P2", "http://x/"))
            .build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("X").unwrap().property, "P2");
        assert_eq!(registry.namespace_for_property("P2").unwrap().prefix, "X");
    }
}
