//! The lookup core: resolution, claims, closure, statements and concepts.

pub mod catalog;
pub mod claims;
pub mod closure;
pub mod concepts;
pub mod resolver;
pub mod semgroup;
pub mod statements;

pub use catalog::{
    Annotation, Catalog, ItemMapping, ItemProperty, Predicate, PropertyMapping, TypeCount,
};
pub use claims::{Claim, ClaimValue, ClaimsRetriever, Snak};
pub use closure::{close_exact_matches, exact_matches, EquivalenceSet};
pub use concepts::{Concept, ConceptCatalog, ConceptDetail, ConceptWithDetails};
pub use resolver::EquivalenceResolver;
pub use statements::{paginate, Node, Statement, StatementQuery, StatementTraversal};
