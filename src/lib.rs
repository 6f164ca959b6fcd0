//! # Garbanzo
//!
//! Garbanzo is a knowledge beacon over Wikidata. It translates compact
//! identifiers (CURIEs such as `DOID:8499` or `MESH:D009755`) to Wikidata
//! items and back, computes the set of identifiers exactly matching a set of
//! inputs, and walks the item-valued statements around a set of items.
//!
//! ## Features
//!
//! - Closed namespace registry with reversible value transforms
//! - Exact-match closure with dead-item pruning
//! - Statement traversal with keyword, semantic-group and paging filters
//! - Swappable graph backends: live Wikidata or an in-memory Oxigraph store
//!
//! ## Example
//!
//! ```rust
//! use garbanzo::curie::{make_curie, parse_curie, NamespaceRegistry};
//!
//! fn example() -> garbanzo::Result<()> {
//!     let registry = NamespaceRegistry::wikidata_default();
//!     let (property, value) = parse_curie(&registry, "MESH:D009755")?;
//!     assert_eq!(property, "P486");
//!     assert_eq!(make_curie(&registry, "MESH", &value)?, "MESH:D009755");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unnecessary_map_or)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::doc_markdown)]

/// Fixed-capacity, time-expiring read-through cache
pub mod cache;

/// Endpoints, limits and cache sizing
pub mod config;

/// CURIE parsing and building over the namespace registry
pub mod curie;

pub mod error;

/// Knowledge-graph backends
pub mod graph;

pub mod http;

pub mod logging;

/// Resolution, claims, closure, statements and concepts
pub mod lookup;

pub mod service;

// Re-export commonly used types
pub use error::{CurieError, GraphError, LookupError, Result};
pub use lookup::{Statement, StatementQuery};
pub use service::Garbanzo;
