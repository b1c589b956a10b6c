//! Persistent metadata model
//!
//! Turns declarative [`EntityDescriptor`]s into validated, immutable
//! [`PersistentEntity`] values and caches them in a [`MappingContext`].

pub mod context;
pub mod descriptor;
pub mod entity;
pub mod loader;
pub mod property;
pub mod types;

pub use context::{MappingContext, PropertyPath};
pub use descriptor::{
    Document, EntityDescriptor, FieldSpec, InnerField, MultiFieldSpec, PropertyDescriptor,
    SettingsSpec,
};
pub use entity::{EntityInformation, IndexSettings, PersistentEntity};
pub use loader::SchemaLoader;
pub use property::PersistentProperty;
pub use types::{DateFormat, Dynamic, FieldType, IndexOptions, TermVector, ValueType};
