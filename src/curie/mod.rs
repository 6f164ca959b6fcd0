//! CURIE handling: the namespace registry and the codec built on it

pub mod codec;
pub mod registry;

pub use codec::{
    curie_for_property, entity_uri_to_curie, expand_curie, make_curie, parse_curie,
    statement_guid, statement_id_from_uri, NativeId,
};
pub use registry::{NamespaceDescriptor, NamespaceRegistry, ValueTransform};
