use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use super::descriptor::{Document, EntityDescriptor};
use super::entity::{EntityInformation, PersistentEntity};
use super::property::{split_camel_case, PersistentProperty};
use crate::config::{Config, IndexConfig};
use crate::{Error, Result};

/// Registry of entity descriptors and the entities built from them.
///
/// Entities are built on first lookup and cached for the lifetime of the
/// context. First construction of a type is serialized by a lock owned by that
/// type; lookups of already built entities only take the cache's read lock.
pub struct MappingContext {
    defaults: IndexConfig,
    descriptors: RwLock<HashMap<String, Arc<EntityDescriptor>>>,
    entities: RwLock<HashMap<String, Arc<PersistentEntity>>>,
    construction_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for MappingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingContext {
    pub fn new() -> Self {
        Self::with_defaults(IndexConfig::default())
    }

    pub fn with_defaults(defaults: IndexConfig) -> Self {
        Self {
            defaults,
            descriptors: RwLock::new(HashMap::new()),
            entities: RwLock::new(HashMap::new()),
            construction_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_defaults(config.index.clone())
    }

    /// Make a type known to the context. Replacing the descriptor of a type
    /// whose entity has already been built is rejected.
    pub fn register(&self, descriptor: EntityDescriptor) -> Result<()> {
        if descriptor.name.trim().is_empty() {
            return Err(Error::Schema("entity name must not be empty".to_string()));
        }
        if self.entities.read().contains_key(&descriptor.name) {
            return Err(Error::Schema(format!(
                "entity {} is already initialized",
                descriptor.name
            )));
        }
        tracing::trace!(entity = %descriptor.name, "registering entity descriptor");
        self.descriptors
            .write()
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(())
    }

    pub fn register_document<T: Document>(&self) -> Result<()> {
        self.register(T::descriptor())
    }

    pub fn register_all(&self, descriptors: impl IntoIterator<Item = EntityDescriptor>) -> Result<()> {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.descriptors.read().contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.descriptors.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// An already built entity, without triggering construction.
    pub fn get_entity(&self, name: &str) -> Option<Arc<PersistentEntity>> {
        self.entities.read().get(name).cloned()
    }

    pub fn get_or_create_entity(&self, name: &str) -> Result<Arc<PersistentEntity>> {
        if let Some(entity) = self.get_entity(name) {
            return Ok(entity);
        }

        if !self.is_registered(name) {
            return Err(Error::EntityNotFound(name.to_string()));
        }

        let slot = {
            let mut locks = self.construction_locks.lock();
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        let _guard = slot.lock();

        // Another thread may have finished while we waited for the slot.
        if let Some(entity) = self.get_entity(name) {
            return Ok(entity);
        }

        let descriptor = self
            .descriptors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EntityNotFound(name.to_string()))?;

        let entity = Arc::new(PersistentEntity::from_descriptor(
            (*descriptor).clone(),
            &self.defaults,
        )?);

        tracing::debug!(
            entity = %entity.name(),
            index = %entity.index_name(),
            properties = entity.len(),
            "built persistent entity"
        );

        self.entities
            .write()
            .insert(name.to_string(), Arc::clone(&entity));
        // Later lookups hit the cache; threads still waiting hold their own Arc.
        self.construction_locks.lock().remove(name);
        Ok(entity)
    }

    pub fn get_or_create_document<T: Document>(&self) -> Result<Arc<PersistentEntity>> {
        let descriptor = T::descriptor();
        let name = descriptor.name.clone();
        if !self.is_registered(&name) {
            self.register(descriptor)?;
        }
        self.get_or_create_entity(&name)
    }

    pub fn entity_information(&self, name: &str) -> Result<EntityInformation> {
        Ok(self.get_or_create_entity(name)?.entity_information())
    }

    /// Resolve a dot separated path of declared or field names, descending
    /// into nested entities.
    pub fn resolve_property(&self, entity: &PersistentEntity, path: &str) -> Result<PropertyPath> {
        let not_found = || Error::PropertyNotFound {
            entity: entity.name().to_string(),
            path: path.to_string(),
        };

        let mut segments = Vec::new();
        let mut current: Option<Arc<PersistentEntity>> = None;
        let parts: Vec<&str> = path.split('.').collect();

        for (i, part) in parts.iter().enumerate() {
            let owner: &PersistentEntity = current.as_deref().unwrap_or(entity);
            let property = owner
                .property(part)
                .or_else(|| owner.property_by_field_name(part))
                .ok_or_else(not_found)?
                .clone();

            if i + 1 < parts.len() {
                let nested = property.entity_type().ok_or_else(not_found)?;
                current = Some(self.get_or_create_entity(nested)?);
            }
            segments.push(property);
        }

        Ok(PropertyPath { segments })
    }

    /// Resolve a property path written the way it appears in a method name,
    /// e.g. `AuthorName` or `Author_Name` for `author.name`.
    pub fn resolve_method_path(&self, entity: &PersistentEntity, source: &str) -> Result<PropertyPath> {
        let mut segments = Vec::new();

        let found = if source.contains('_') {
            self.resolve_explicit_path(entity, source, &mut segments)?
        } else {
            self.resolve_camel_path(entity, source, &mut segments)?
        };

        if found {
            Ok(PropertyPath { segments })
        } else {
            Err(Error::PropertyNotFound {
                entity: entity.name().to_string(),
                path: source.to_string(),
            })
        }
    }

    fn resolve_explicit_path(
        &self,
        entity: &PersistentEntity,
        source: &str,
        segments: &mut Vec<PersistentProperty>,
    ) -> Result<bool> {
        if let Some(property) = entity.find_property(source) {
            segments.push(property.clone());
            return Ok(true);
        }
        let Some((head, tail)) = source.split_once('_') else {
            return Ok(false);
        };
        let Some(property) = entity.find_property(head) else {
            return Ok(false);
        };
        let Some(nested) = property.entity_type() else {
            return Ok(false);
        };
        let nested = self.get_or_create_entity(nested)?;
        segments.push(property.clone());
        if self.resolve_explicit_path(&nested, tail, segments)? {
            return Ok(true);
        }
        segments.pop();
        Ok(false)
    }

    fn resolve_camel_path(
        &self,
        entity: &PersistentEntity,
        source: &str,
        segments: &mut Vec<PersistentProperty>,
    ) -> Result<bool> {
        if let Some(property) = entity.find_property(source) {
            segments.push(property.clone());
            return Ok(true);
        }

        // Try the longest head that names a nested entity first.
        let words = split_camel_case(source);
        for split in (1..words.len()).rev() {
            let head = words[..split].concat();
            let Some(property) = entity.find_property(&head) else {
                continue;
            };
            let Some(nested) = property.entity_type() else {
                continue;
            };
            let nested = self.get_or_create_entity(nested)?;
            segments.push(property.clone());
            if self.resolve_camel_path(&nested, &words[split..].concat(), segments)? {
                return Ok(true);
            }
            segments.pop();
        }
        Ok(false)
    }
}

/// A resolved chain of properties from a root entity to a leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPath {
    segments: Vec<PersistentProperty>,
}

impl PropertyPath {
    pub fn segments(&self) -> &[PersistentProperty] {
        &self.segments
    }

    pub fn leaf(&self) -> &PersistentProperty {
        // Paths are only built with at least one segment.
        &self.segments[self.segments.len() - 1]
    }

    /// Dot separated path of field names, as used in queries.
    pub fn field_path(&self) -> String {
        self.segments
            .iter()
            .map(|p| p.field_name())
            .collect::<Vec<_>>()
            .join(".")
    }
}
