//! Elasticsearch mapping and settings documents
//!
//! Derived from the persistent metadata of an entity; property fragments,
//! dynamic templates and settings may come from JSON resources instead.

mod builder;
mod parameters;

pub use builder::MappingBuilder;
