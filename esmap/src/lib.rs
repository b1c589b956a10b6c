//! Entity-to-document mapping for Elasticsearch.
//!
//! Entity descriptors are registered with a [`metadata::MappingContext`],
//! which validates them into immutable persistent entities. From those the
//! [`mapping::MappingBuilder`] produces index mappings and settings, and the
//! [`query`] module derives queries from repository method names.

pub mod config;
pub mod error;
pub mod mapping;
pub mod metadata;
pub mod query;
pub mod resource;
pub mod scroll;

pub use config::Config;
pub use error::{Error, Result};
pub use mapping::MappingBuilder;
pub use metadata::{Document, EntityDescriptor, MappingContext, PropertyDescriptor};
pub use resource::ResourceLoader;
