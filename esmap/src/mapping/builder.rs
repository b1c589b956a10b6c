use serde_json::{json, Map, Value};

use super::parameters::write_field_parameters;
use crate::metadata::{FieldSpec, FieldType, MappingContext, PersistentEntity, PersistentProperty};
use crate::resource::ResourceLoader;
use crate::{Error, Result};

/// Builds Elasticsearch mapping and settings documents from entity metadata.
///
/// Builders hold no state of their own besides the context they read from and
/// can be shared between threads.
pub struct MappingBuilder<'a> {
    context: &'a MappingContext,
    resources: ResourceLoader,
}

impl<'a> MappingBuilder<'a> {
    pub fn new(context: &'a MappingContext, resources: ResourceLoader) -> Self {
        Self { context, resources }
    }

    /// Mapping document for a registered entity type.
    pub fn build_mapping(&self, type_name: &str) -> Result<Value> {
        let entity = self.context.get_or_create_entity(type_name)?;
        self.build_entity_mapping(&entity)
    }

    pub fn build_mapping_json(&self, type_name: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.build_mapping(type_name)?)?)
    }

    pub fn build_entity_mapping(&self, entity: &PersistentEntity) -> Result<Value> {
        if let Some(path) = entity.mapping_path() {
            tracing::debug!(entity = %entity.name(), path, "using mapping resource");
            return self.resources.read_json(path);
        }

        let mut root = Map::new();
        if let Some(templates) = self.dynamic_templates(entity) {
            root.insert("dynamic_templates".into(), templates);
        }
        if let Some(dynamic) = entity.dynamic().and_then(|d| d.mapped_value()) {
            root.insert("dynamic".into(), dynamic.into());
        }

        let properties = self.map_properties(entity, true, None)?;
        root.insert("properties".into(), Value::Object(properties));
        Ok(Value::Object(root))
    }

    /// Settings document: the entity's settings resource verbatim, or one
    /// built from its index settings.
    pub fn build_settings(&self, type_name: &str) -> Result<Value> {
        let entity = self.context.get_or_create_entity(type_name)?;
        let settings = entity.settings();

        if let Some(path) = &settings.settings_path {
            return self.resources.read_json(path);
        }

        Ok(json!({
            "index": {
                "number_of_shards": settings.shards,
                "number_of_replicas": settings.replicas,
                "refresh_interval": settings.refresh_interval,
                "store": { "type": settings.store_type }
            }
        }))
    }

    /// Body of a create-index request: settings and mappings together.
    pub fn build_create_index_body(&self, type_name: &str) -> Result<Value> {
        Ok(json!({
            "settings": self.build_settings(type_name)?,
            "mappings": self.build_mapping(type_name)?,
        }))
    }

    /// Missing or malformed templates leave the mapping without any.
    fn dynamic_templates(&self, entity: &PersistentEntity) -> Option<Value> {
        let path = entity.dynamic_templates()?;

        let document = match self.resources.read_json(path) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(entity = %entity.name(), path, error = %e, "ignoring dynamic templates");
                return None;
            }
        };

        match document {
            Value::Array(templates) => Some(Value::Array(templates)),
            Value::Object(mut object) => match object.remove("dynamic_templates") {
                Some(templates @ Value::Array(_)) => Some(templates),
                _ => {
                    tracing::warn!(
                        entity = %entity.name(),
                        path,
                        "dynamic templates resource has no dynamic_templates array"
                    );
                    None
                }
            },
            _ => {
                tracing::warn!(entity = %entity.name(), path, "dynamic templates resource is not an object");
                None
            }
        }
    }

    /// `parent` is the nested field directive the entity is mapped under, if any.
    fn map_properties(
        &self,
        entity: &PersistentEntity,
        is_root: bool,
        parent: Option<&FieldSpec>,
    ) -> Result<Map<String, Value>> {
        let mut properties = Map::new();

        for property in entity.properties() {
            if property.is_transient() {
                continue;
            }
            if parent.is_some_and(|p| p.ignore_fields.iter().any(|f| f == property.field_name())) {
                continue;
            }
            if property.is_seq_no_primary_term() {
                if property.field().is_some() {
                    tracing::warn!(
                        entity = %entity.name(),
                        property = %property.name(),
                        "seq_no/primary_term property is not stored; its field directive is ignored"
                    );
                }
                continue;
            }

            self.map_property(entity, property, is_root, &mut properties)?;
        }

        Ok(properties)
    }

    fn map_property(
        &self,
        entity: &PersistentEntity,
        property: &PersistentProperty,
        is_root: bool,
        properties: &mut Map<String, Value>,
    ) -> Result<()> {
        let field_name = property.field_name().to_string();

        if let Some(path) = property.mapping_path() {
            properties.insert(field_name, self.resources.read_json(path)?);
            return Ok(());
        }

        if property.is_geo_point() {
            return Err(Error::UnsupportedFeature(format!(
                "geo_point mapping of {}.{}",
                entity.name(),
                property.name()
            )));
        }

        if let (Some(nested), Some(spec)) = (property.entity_type(), property.field()) {
            if spec.field_type.is_nested_or_object() {
                let nested = self.context.get_or_create_entity(nested)?;
                properties.insert(field_name, self.map_nested(&nested, spec)?);
                return Ok(());
            }
        }

        if property.multi_field().is_some() {
            return Err(Error::UnsupportedFeature(format!(
                "multi-field mapping of {}.{}",
                entity.name(),
                property.name()
            )));
        }
        if property.is_completion() {
            return Err(Error::UnsupportedFeature(format!(
                "completion mapping of {}.{}",
                entity.name(),
                property.name()
            )));
        }

        // Left to the cluster's dynamic mapping.
        let Some(spec) = property.field() else {
            return Ok(());
        };

        if is_root && entity.is_id_property(property) {
            properties.insert(field_name, json!({ "type": "keyword", "index": true }));
            return Ok(());
        }

        let mut node = Map::new();
        write_field_parameters(spec, &mut node);
        properties.insert(field_name, Value::Object(node));
        Ok(())
    }

    /// No depth limit: self references terminate only through `ignore_fields`.
    fn map_nested(&self, nested: &PersistentEntity, spec: &FieldSpec) -> Result<Value> {
        let mut node = Map::new();
        if let Some(name) = spec.field_type.mapped_name() {
            node.insert("type".into(), name.into());
        }
        if spec.field_type == FieldType::Nested && spec.include_in_parent {
            node.insert("include_in_parent".into(), true.into());
        }
        if let Some(dynamic) = spec.dynamic.and_then(|d| d.mapped_value()) {
            node.insert("dynamic".into(), dynamic.into());
        }

        let properties = self.map_properties(nested, false, Some(spec))?;
        node.insert("properties".into(), Value::Object(properties));
        Ok(Value::Object(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        DateFormat, Dynamic, EntityDescriptor, InnerField, MultiFieldSpec, PropertyDescriptor,
        ValueType,
    };
    use std::fs;
    use tempfile::TempDir;

    fn context_with(descriptors: Vec<EntityDescriptor>) -> MappingContext {
        let context = MappingContext::new();
        context.register_all(descriptors).unwrap();
        context
    }

    fn mapping_of(context: &MappingContext, name: &str) -> Result<Value> {
        MappingBuilder::new(context, ResourceLoader::default()).build_mapping(name)
    }

    #[test]
    fn test_single_text_field() {
        let context = context_with(vec![EntityDescriptor::new("Doc").property(
            PropertyDescriptor::new("f", ValueType::String)
                .field(FieldSpec::text().store(true).index(false).analyzer("standard")),
        )]);

        let builder = MappingBuilder::new(&context, ResourceLoader::default());
        let mapping = builder.build_mapping_json("Doc").unwrap();
        let parsed: Value = serde_json::from_str(&mapping).unwrap();
        assert_eq!(
            parsed,
            json!({"properties": {"f": {"store": true, "type": "text", "index": false, "analyzer": "standard"}}})
        );
    }

    #[test]
    fn test_root_id_is_keyword() {
        let context = context_with(vec![EntityDescriptor::new("Doc").property(
            PropertyDescriptor::id_property("id").field(FieldSpec::text().analyzer("standard")),
        )]);

        assert_eq!(
            mapping_of(&context, "Doc").unwrap(),
            json!({"properties": {"id": {"type": "keyword", "index": true}}})
        );
    }

    #[test]
    fn test_skipped_properties() {
        let context = context_with(vec![EntityDescriptor::new("Doc")
            .property(PropertyDescriptor::new("cache", ValueType::String).transient())
            .property(
                PropertyDescriptor::new("seq", ValueType::SeqNoPrimaryTerm).field(FieldSpec::keyword()),
            )
            .property(PropertyDescriptor::new("auto", ValueType::Long))
            .property(PropertyDescriptor::new("author", ValueType::entity("Author")))
            .property(PropertyDescriptor::new("title", ValueType::String).field(FieldSpec::keyword()))]);

        assert_eq!(
            mapping_of(&context, "Doc").unwrap(),
            json!({"properties": {"title": {"type": "keyword"}}})
        );
    }

    #[test]
    fn test_nested_entity() {
        let context = context_with(vec![
            EntityDescriptor::new("Author")
                .property(PropertyDescriptor::new("name", ValueType::String).field(FieldSpec::text()))
                .property(
                    PropertyDescriptor::new("id", ValueType::String).field(FieldSpec::keyword()),
                ),
            EntityDescriptor::new("Book").property(
                PropertyDescriptor::new("authors", ValueType::list_of(ValueType::entity("Author")))
                    .field(
                        FieldSpec::nested()
                            .include_in_parent(true)
                            .dynamic(Dynamic::Strict),
                    ),
            ),
        ]);

        // The nested id is not the root identifier and keeps its own directive.
        assert_eq!(
            mapping_of(&context, "Book").unwrap(),
            json!({"properties": {"authors": {
                "type": "nested",
                "include_in_parent": true,
                "dynamic": "strict",
                "properties": {
                    "name": {"type": "text"},
                    "id": {"type": "keyword"}
                }
            }}})
        );
    }

    #[test]
    fn test_self_reference_terminates_with_ignore_fields() {
        let context = context_with(vec![EntityDescriptor::new("Person")
            .property(PropertyDescriptor::new("name", ValueType::String).field(FieldSpec::text()))
            .property(
                PropertyDescriptor::new("friends", ValueType::list_of(ValueType::entity("Person")))
                    .field(FieldSpec::nested().ignore_fields(["friends"])),
            )]);

        assert_eq!(
            mapping_of(&context, "Person").unwrap(),
            json!({"properties": {
                "name": {"type": "text"},
                "friends": {"type": "nested", "properties": {"name": {"type": "text"}}}
            }})
        );
    }

    #[test]
    fn test_mutual_reference_terminates_with_ignore_fields() {
        let context = context_with(vec![
            EntityDescriptor::new("A")
                .property(PropertyDescriptor::new("name", ValueType::String).field(FieldSpec::text()))
                .property(
                    PropertyDescriptor::new("b", ValueType::entity("B"))
                        .field(FieldSpec::object().ignore_fields(["a"])),
                ),
            EntityDescriptor::new("B")
                .property(PropertyDescriptor::new("title", ValueType::String).field(FieldSpec::keyword()))
                .property(
                    PropertyDescriptor::new("a", ValueType::entity("A"))
                        .field(FieldSpec::nested().ignore_fields(["b"])),
                ),
        ]);

        assert_eq!(
            mapping_of(&context, "A").unwrap(),
            json!({"properties": {
                "name": {"type": "text"},
                "b": {"type": "object", "properties": {"title": {"type": "keyword"}}}
            }})
        );
        assert_eq!(
            mapping_of(&context, "B").unwrap(),
            json!({"properties": {
                "title": {"type": "keyword"},
                "a": {"type": "nested", "properties": {"name": {"type": "text"}}}
            }})
        );
    }

    #[test]
    fn test_unsupported_features() {
        let context = context_with(vec![
            EntityDescriptor::new("Geo")
                .property(PropertyDescriptor::new("location", ValueType::GeoPoint)),
            EntityDescriptor::new("Multi").property(
                PropertyDescriptor::new("title", ValueType::String).multi_field(MultiFieldSpec {
                    main: FieldSpec::text(),
                    other_fields: vec![InnerField {
                        suffix: "raw".to_string(),
                        field: FieldSpec::keyword(),
                    }],
                }),
            ),
            EntityDescriptor::new("Suggest")
                .property(PropertyDescriptor::new("suggest", ValueType::Completion)),
        ]);

        for name in ["Geo", "Multi", "Suggest"] {
            assert!(
                matches!(mapping_of(&context, name), Err(Error::UnsupportedFeature(_))),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn test_date_field() {
        let context = context_with(vec![EntityDescriptor::new("Event")
            .property(
                PropertyDescriptor::new("day", ValueType::Date)
                    .field(FieldSpec::date(DateFormat::Custom).pattern("uuuu-MM-dd")),
            )
            .property(
                PropertyDescriptor::new("at", ValueType::DateTime)
                    .field(FieldSpec::date(DateFormat::DateTime)),
            )]);

        assert_eq!(
            mapping_of(&context, "Event").unwrap(),
            json!({"properties": {
                "day": {"type": "date", "format": "uuuu-MM-dd"},
                "at": {"type": "date", "format": "date_time"}
            }})
        );
    }

    #[test]
    fn test_resources() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("title.json"),
            r#"{"type": "text", "analyzer": "german"}"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("templates.json"),
            r#"{"dynamic_templates": [{"strings": {"match_mapping_type": "string", "mapping": {"type": "keyword"}}}]}"#,
        )
        .unwrap();

        let context = context_with(vec![EntityDescriptor::new("Doc")
            .dynamic(Dynamic::False)
            .dynamic_templates("templates.json")
            .property(
                PropertyDescriptor::new("title", ValueType::String)
                    .mapping_path("title.json")
                    .field(FieldSpec::keyword()),
            )]);

        let builder = MappingBuilder::new(&context, ResourceLoader::new(temp.path()));
        assert_eq!(
            builder.build_mapping("Doc").unwrap(),
            json!({
                "dynamic_templates": [{"strings": {"match_mapping_type": "string", "mapping": {"type": "keyword"}}}],
                "dynamic": "false",
                "properties": {"title": {"type": "text", "analyzer": "german"}}
            })
        );
    }

    #[test]
    fn test_missing_dynamic_templates_degrade() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.json"), r#"{"templates": []}"#).unwrap();

        let context = context_with(vec![
            EntityDescriptor::new("Missing").dynamic_templates("nope.json"),
            EntityDescriptor::new("Malformed").dynamic_templates("bad.json"),
        ]);
        let builder = MappingBuilder::new(&context, ResourceLoader::new(temp.path()));

        assert_eq!(builder.build_mapping("Missing").unwrap(), json!({"properties": {}}));
        assert_eq!(builder.build_mapping("Malformed").unwrap(), json!({"properties": {}}));
    }

    #[test]
    fn test_missing_fragment_is_an_error() {
        let context = context_with(vec![EntityDescriptor::new("Doc").property(
            PropertyDescriptor::new("title", ValueType::String).mapping_path("missing.json"),
        )]);

        assert!(matches!(
            mapping_of(&context, "Doc"),
            Err(Error::ResourceRead { .. })
        ));
    }

    #[test]
    fn test_entity_mapping_resource_is_verbatim() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("doc.json"), r#"{"properties": {"x": {"type": "long"}}}"#).unwrap();

        let context = context_with(vec![EntityDescriptor::new("Doc")
            .mapping_path("doc.json")
            .property(PropertyDescriptor::new("y", ValueType::String).field(FieldSpec::text()))]);

        let builder = MappingBuilder::new(&context, ResourceLoader::new(temp.path()));
        assert_eq!(
            builder.build_mapping("Doc").unwrap(),
            json!({"properties": {"x": {"type": "long"}}})
        );
    }

    #[test]
    fn test_settings() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("settings.json"), r#"{"index": {"number_of_shards": 7}}"#).unwrap();

        let context = context_with(vec![
            EntityDescriptor::new("Plain").shards(3).replicas(0),
            EntityDescriptor::new("Custom").settings_path("settings.json"),
        ]);
        let builder = MappingBuilder::new(&context, ResourceLoader::new(temp.path()));

        assert_eq!(
            builder.build_settings("Plain").unwrap(),
            json!({"index": {
                "number_of_shards": 3,
                "number_of_replicas": 0,
                "refresh_interval": "1s",
                "store": {"type": "fs"}
            }})
        );
        assert_eq!(
            builder.build_settings("Custom").unwrap(),
            json!({"index": {"number_of_shards": 7}})
        );

        let body = builder.build_create_index_body("Plain").unwrap();
        assert_eq!(body["mappings"], json!({"properties": {}}));
        assert_eq!(body["settings"]["index"]["number_of_shards"], 3);
    }

    #[test]
    fn test_unknown_entity() {
        let context = MappingContext::new();
        assert!(matches!(
            mapping_of(&context, "Nope"),
            Err(Error::EntityNotFound(_))
        ));
    }
}
