use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::descriptor::EntityDescriptor;
use super::property::{normalize, PersistentProperty};
use super::types::Dynamic;
use crate::config::IndexConfig;
use crate::{Error, Result};

/// Index settings of an entity with configuration defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexSettings {
    pub shards: u32,
    pub replicas: u32,
    pub refresh_interval: String,
    pub store_type: String,
    pub create_index: bool,
    pub settings_path: Option<String>,
}

/// Validated metadata of one mapped domain type.
///
/// Entities are assembled by the [`MappingContext`](super::MappingContext) and
/// never change after they have been published there.
#[derive(Debug, Clone)]
pub struct PersistentEntity {
    name: String,
    index_name: String,
    settings: IndexSettings,
    dynamic: Option<Dynamic>,
    dynamic_templates: Option<String>,
    mapping_path: Option<String>,
    properties: IndexMap<String, PersistentProperty>,
    id_property: Option<String>,
    version_property: Option<String>,
    seq_no_primary_term_property: Option<String>,
}

impl PersistentEntity {
    /// An entity without properties.
    pub fn new(name: impl Into<String>, index_name: impl Into<String>, settings: IndexSettings) -> Self {
        Self {
            name: name.into(),
            index_name: index_name.into(),
            settings,
            dynamic: None,
            dynamic_templates: None,
            mapping_path: None,
            properties: IndexMap::new(),
            id_property: None,
            version_property: None,
            seq_no_primary_term_property: None,
        }
    }

    pub fn from_descriptor(descriptor: EntityDescriptor, defaults: &IndexConfig) -> Result<Self> {
        let EntityDescriptor {
            name,
            index,
            settings,
            dynamic,
            dynamic_templates,
            mapping_path,
            properties,
        } = descriptor;

        if name.trim().is_empty() {
            return Err(Error::Schema("entity name must not be empty".to_string()));
        }

        let index_name = index.unwrap_or_else(|| name.to_lowercase());
        if index_name.trim().is_empty() {
            return Err(Error::mapping(&name, "<entity>", "index name must not be empty"));
        }

        let settings = IndexSettings {
            shards: settings.shards.unwrap_or(defaults.default_shards),
            replicas: settings.replicas.unwrap_or(defaults.default_replicas),
            refresh_interval: settings
                .refresh_interval
                .unwrap_or_else(|| defaults.default_refresh_interval.clone()),
            store_type: settings
                .store_type
                .unwrap_or_else(|| defaults.default_store_type.clone()),
            create_index: settings.create_index,
            settings_path: settings.settings_path,
        };

        let mut entity = PersistentEntity::new(name, index_name, settings);
        entity.dynamic = dynamic;
        entity.dynamic_templates = dynamic_templates;
        entity.mapping_path = mapping_path;

        for descriptor in properties {
            let property = PersistentProperty::new(&entity.name, descriptor)?;
            entity.add_property(property)?;
        }

        Ok(entity)
    }

    /// Add a property, enforcing the single identifier, version and
    /// seq_no/primary_term invariants.
    pub fn add_property(&mut self, property: PersistentProperty) -> Result<()> {
        if self.properties.contains_key(property.name()) {
            return Err(Error::mapping(
                &self.name,
                property.name(),
                "property declared twice",
            ));
        }
        if let Some(existing) = self.property_by_field_name(property.field_name()) {
            return Err(Error::mapping(
                &self.name,
                property.name(),
                format!(
                    "field name '{}' is already used by property '{}'",
                    property.field_name(),
                    existing.name()
                ),
            ));
        }

        if property.is_version() {
            if let Some(existing) = &self.version_property {
                return Err(Error::mapping(
                    &self.name,
                    property.name(),
                    format!("entity already has a version property '{}'", existing),
                ));
            }
        }

        if property.is_seq_no_primary_term() {
            if let Some(existing) = &self.seq_no_primary_term_property {
                return Err(Error::mapping(
                    &self.name,
                    property.name(),
                    format!(
                        "entity already has a seq_no/primary_term property '{}'",
                        existing
                    ),
                ));
            }
        }

        let take_id = if property.is_id_candidate() {
            match self.id_property() {
                None => true,
                Some(current) => match (current.is_explicit_id(), property.is_explicit_id()) {
                    (true, false) => false,
                    (false, true) => true,
                    _ => {
                        return Err(Error::mapping(
                            &self.name,
                            property.name(),
                            format!(
                                "entity already has an identifier property '{}'",
                                current.name()
                            ),
                        ));
                    }
                },
            }
        } else {
            false
        };

        let name = property.name().to_string();
        if take_id {
            self.id_property = Some(name.clone());
        }
        if property.is_version() {
            self.version_property = Some(name.clone());
        }
        if property.is_seq_no_primary_term() {
            self.seq_no_primary_term_property = Some(name.clone());
        }
        self.properties.insert(name, property);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn dynamic(&self) -> Option<Dynamic> {
        self.dynamic
    }

    pub fn dynamic_templates(&self) -> Option<&str> {
        self.dynamic_templates.as_deref()
    }

    pub fn mapping_path(&self) -> Option<&str> {
        self.mapping_path.as_deref()
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PersistentProperty> {
        self.properties.values()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Look up a property by its declared name.
    pub fn property(&self, name: &str) -> Option<&PersistentProperty> {
        self.properties.get(name)
    }

    /// Look up a property by the name it has in stored documents.
    pub fn property_by_field_name(&self, field_name: &str) -> Option<&PersistentProperty> {
        self.properties
            .values()
            .find(|p| p.field_name() == field_name)
    }

    /// Look up a property by declared name, field name, or their
    /// case and underscore insensitive form.
    pub fn find_property(&self, name: &str) -> Option<&PersistentProperty> {
        self.property(name)
            .or_else(|| self.property_by_field_name(name))
            .or_else(|| {
                let wanted = normalize(name);
                self.properties
                    .values()
                    .find(|p| p.normalized_name() == wanted || normalize(p.field_name()) == wanted)
            })
    }

    pub fn id_property(&self) -> Option<&PersistentProperty> {
        self.id_property.as_deref().and_then(|n| self.property(n))
    }

    pub fn version_property(&self) -> Option<&PersistentProperty> {
        self.version_property.as_deref().and_then(|n| self.property(n))
    }

    pub fn seq_no_primary_term_property(&self) -> Option<&PersistentProperty> {
        self.seq_no_primary_term_property
            .as_deref()
            .and_then(|n| self.property(n))
    }

    pub fn has_id_property(&self) -> bool {
        self.id_property.is_some()
    }

    pub fn has_version_property(&self) -> bool {
        self.version_property.is_some()
    }

    pub fn has_seq_no_primary_term_property(&self) -> bool {
        self.seq_no_primary_term_property.is_some()
    }

    pub fn is_id_property(&self, property: &PersistentProperty) -> bool {
        self.id_property.as_deref() == Some(property.name())
    }

    pub fn entity_information(&self) -> EntityInformation {
        EntityInformation {
            type_name: self.name.clone(),
            index_name: self.index_name.clone(),
            id_field: self.id_property().map(|p| p.field_name().to_string()),
            version_field: self.version_property().map(|p| p.field_name().to_string()),
        }
    }
}

/// What repository code needs to know about an entity's storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityInformation {
    pub type_name: String,
    pub index_name: String,
    pub id_field: Option<String>,
    pub version_field: Option<String>,
}

impl EntityInformation {
    /// Read the identifier out of a stored document.
    pub fn id_of(&self, document: &Value) -> Option<String> {
        let field = self.id_field.as_deref()?;
        match document.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn version_of(&self, document: &Value) -> Option<i64> {
        let field = self.version_field.as_deref()?;
        document.get(field)?.as_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::descriptor::PropertyDescriptor;
    use crate::metadata::types::ValueType;
    use serde_json::json;

    fn build(descriptor: EntityDescriptor) -> Result<PersistentEntity> {
        PersistentEntity::from_descriptor(descriptor, &IndexConfig::default())
    }

    #[test]
    fn test_defaults_applied() {
        let entity = build(EntityDescriptor::new("Product")).unwrap();
        assert_eq!(entity.index_name(), "product");
        assert_eq!(entity.settings().shards, 1);
        assert_eq!(entity.settings().replicas, 1);
        assert_eq!(entity.settings().refresh_interval, "1s");
        assert!(entity.settings().create_index);
    }

    #[test]
    fn test_single_version_property() {
        let entity = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::new("version", ValueType::Long).version()),
        )
        .unwrap();
        assert_eq!(entity.version_property().unwrap().name(), "version");
    }

    #[test]
    fn test_second_version_property_fails() {
        let err = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::new("version", ValueType::Long).version())
                .property(PropertyDescriptor::new("revision", ValueType::Integer).version()),
        )
        .unwrap_err();
        match err {
            Error::Mapping {
                entity, property, ..
            } => {
                assert_eq!(entity, "Product");
                assert_eq!(property, "revision");
            }
            other => panic!("Expected Mapping error, got {other:?}"),
        }
    }

    #[test]
    fn test_second_seq_no_primary_term_fails() {
        let result = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::new("seq", ValueType::SeqNoPrimaryTerm))
                .property(PropertyDescriptor::new("seq2", ValueType::SeqNoPrimaryTerm)),
        );
        assert!(matches!(result, Err(Error::Mapping { .. })));
    }

    #[test]
    fn test_explicit_id_wins_over_implicit() {
        let entity = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::new("id", ValueType::String))
                .property(PropertyDescriptor::id_property("sku")),
        )
        .unwrap();
        assert_eq!(entity.id_property().unwrap().name(), "sku");
        assert!(entity.property("id").is_some());
    }

    #[test]
    fn test_two_explicit_ids_fail() {
        let result = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::id_property("sku"))
                .property(PropertyDescriptor::id_property("ean")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_field_name_fails() {
        let result = build(
            EntityDescriptor::new("Product")
                .property(PropertyDescriptor::new("title", ValueType::String))
                .property(PropertyDescriptor::new("heading", ValueType::String).field_name("title")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_by_field_name_and_normalized_name() {
        let entity = build(
            EntityDescriptor::new("Product").property(
                PropertyDescriptor::new("published_date", ValueType::Date)
                    .field_name("published"),
            ),
        )
        .unwrap();
        assert!(entity.property("published_date").is_some());
        assert!(entity.property_by_field_name("published").is_some());
        assert!(entity.property_by_field_name("published_date").is_none());
        assert_eq!(
            entity.find_property("PublishedDate").unwrap().name(),
            "published_date"
        );
    }

    #[test]
    fn test_entity_information_reads_id() {
        let entity = build(
            EntityDescriptor::new("Product")
                .index("products")
                .property(PropertyDescriptor::new("id", ValueType::Long).id())
                .property(PropertyDescriptor::new("version", ValueType::Long).version()),
        )
        .unwrap();
        let info = entity.entity_information();
        assert_eq!(info.index_name, "products");
        assert_eq!(info.id_of(&json!({"id": 42})), Some("42".to_string()));
        assert_eq!(info.version_of(&json!({"version": 3})), Some(3));
        assert_eq!(info.id_of(&json!({"name": "x"})), None);
    }
}
