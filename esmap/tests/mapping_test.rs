//! End-to-end mapping tests: schemas loaded from YAML directories and
//! `Document` impls, rendered to mapping and settings documents.

use esmap::metadata::{DateFormat, FieldSpec, SchemaLoader, ValueType};
use esmap::{
    Document, EntityDescriptor, Error, MappingBuilder, MappingContext, PropertyDescriptor,
    ResourceLoader,
};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_schemas(dir: &TempDir, schemas: &[(&str, &str)]) {
    for (file, content) in schemas {
        fs::write(dir.path().join(file), content).unwrap();
    }
}

fn context_from(dir: &TempDir) -> MappingContext {
    let context = MappingContext::new();
    SchemaLoader::new(dir.path()).load_into(&context).unwrap();
    context
}

fn build(descriptor: EntityDescriptor) -> esmap::Result<Value> {
    let context = MappingContext::new();
    let name = descriptor.name.clone();
    context.register(descriptor)?;
    MappingBuilder::new(&context, ResourceLoader::default()).build_mapping(&name)
}

// ---------------------------------------------------------------------------
// Mapping documents
// ---------------------------------------------------------------------------

#[test]
fn test_single_text_field_mapping_is_exact() {
    let mapping = build(EntityDescriptor::new("Doc").property(
        PropertyDescriptor::new("f", ValueType::String)
            .field(FieldSpec::text().store(true).index(false).analyzer("standard")),
    ))
    .unwrap();

    assert_eq!(
        mapping,
        json!({"properties":{"f":{"store":true,"type":"text","index":false,"analyzer":"standard"}}})
    );
}

#[test]
fn test_root_identifier_is_keyword() {
    let mapping = build(
        EntityDescriptor::new("Doc")
            .property(PropertyDescriptor::id_property("id").field(FieldSpec::text()))
            .property(PropertyDescriptor::new("title", ValueType::String).field(FieldSpec::text())),
    )
    .unwrap();

    assert_eq!(mapping["properties"]["id"], json!({"type":"keyword","index":true}));
    assert_eq!(mapping["properties"]["title"], json!({"type":"text"}));
}

#[test]
fn test_yaml_schemas_with_nested_self_reference() {
    let dir = TempDir::new().unwrap();
    write_schemas(
        &dir,
        &[(
            "person.yaml",
            r#"
name: Person
index: people
properties:
  - name: id
    type: string
    field:
      type: keyword
  - name: name
    type: string
    field:
      type: text
      analyzer: standard
  - name: born
    type: date
    field:
      type: date
      format: custom
      pattern: "dd.MM.uuuu"
  - name: friends
    type:
      list:
        entity: Person
    field:
      type: nested
      ignore_fields: [friends]
"#,
        )],
    );

    let context = context_from(&dir);
    let builder = MappingBuilder::new(&context, ResourceLoader::default());
    let mapping = builder.build_mapping("Person").unwrap();

    assert_eq!(
        mapping,
        json!({"properties": {
            "id": {"type": "keyword", "index": true},
            "name": {"type": "text", "analyzer": "standard"},
            "born": {"type": "date", "format": "dd.MM.uuuu"},
            "friends": {
                "type": "nested",
                "properties": {
                    "id": {"type": "keyword"},
                    "name": {"type": "text", "analyzer": "standard"},
                    "born": {"type": "date", "format": "dd.MM.uuuu"}
                }
            }
        }})
    );

    let info = context.entity_information("Person").unwrap();
    assert_eq!(info.index_name, "people");
    assert_eq!(info.id_field.as_deref(), Some("id"));
    assert_eq!(info.id_of(&json!({"id": "p-1"})), Some("p-1".to_string()));
}

#[test]
fn test_property_order_is_declaration_order() {
    let mapping = build(
        EntityDescriptor::new("Doc")
            .property(PropertyDescriptor::new("zeta", ValueType::String).field(FieldSpec::keyword()))
            .property(PropertyDescriptor::new("alpha", ValueType::String).field(FieldSpec::keyword())),
    )
    .unwrap();

    let json = serde_json::to_string(&mapping).unwrap();
    assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());
}

#[test]
fn test_resources_from_root() {
    let resources = TempDir::new().unwrap();
    fs::create_dir(resources.path().join("mappings")).unwrap();
    fs::write(
        resources.path().join("mappings/title.json"),
        r#"{"type": "text", "fields": {"raw": {"type": "keyword"}}}"#,
    )
    .unwrap();
    fs::write(
        resources.path().join("settings.json"),
        r#"{"index": {"number_of_shards": 2, "analysis": {}}}"#,
    )
    .unwrap();

    let context = MappingContext::new();
    context
        .register(
            EntityDescriptor::new("Article")
                .settings_path("settings.json")
                .property(PropertyDescriptor::new("title", ValueType::String).mapping_path("mappings/title.json")),
        )
        .unwrap();

    let builder = MappingBuilder::new(&context, ResourceLoader::new(resources.path()));
    assert_eq!(
        builder.build_mapping("Article").unwrap(),
        json!({"properties": {"title": {"type": "text", "fields": {"raw": {"type": "keyword"}}}}})
    );
    assert_eq!(
        builder.build_settings("Article").unwrap(),
        json!({"index": {"number_of_shards": 2, "analysis": {}}})
    );
}

// ---------------------------------------------------------------------------
// Metadata invariants
// ---------------------------------------------------------------------------

#[test]
fn test_one_version_property_succeeds_two_fail() {
    let context = MappingContext::new();
    context
        .register(
            EntityDescriptor::new("One")
                .property(PropertyDescriptor::new("version", ValueType::Long).version()),
        )
        .unwrap();
    let one = context.get_or_create_entity("One").unwrap();
    assert_eq!(one.version_property().unwrap().name(), "version");

    context
        .register(
            EntityDescriptor::new("Two")
                .property(PropertyDescriptor::new("v1", ValueType::Long).version())
                .property(PropertyDescriptor::new("v2", ValueType::Long).version()),
        )
        .unwrap();
    assert!(matches!(
        context.get_or_create_entity("Two"),
        Err(Error::Mapping { .. })
    ));
    // A failed construction is not cached.
    assert!(context.get_entity("Two").is_none());
}

#[test]
fn test_date_directives_need_format_and_pattern() {
    let without_pattern = build(EntityDescriptor::new("A").property(
        PropertyDescriptor::new("d", ValueType::Date).field(FieldSpec::date(DateFormat::Custom)),
    ));
    assert!(matches!(without_pattern, Err(Error::Mapping { .. })));

    let mut no_format = FieldSpec::date(DateFormat::Date);
    no_format.format = None;
    let without_format = build(
        EntityDescriptor::new("B")
            .property(PropertyDescriptor::new("d", ValueType::Date).field(no_format)),
    );
    assert!(matches!(without_format, Err(Error::Mapping { .. })));
}

// ---------------------------------------------------------------------------
// Document impls and concurrent first use
// ---------------------------------------------------------------------------

struct Book;

impl Document for Book {
    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new("Book")
            .index("books")
            .shards(2)
            .property(PropertyDescriptor::id_property("id"))
            .property(
                PropertyDescriptor::new("title", ValueType::String)
                    .field(FieldSpec::text().analyzer("english")),
            )
    }
}

#[test]
fn test_document_impl() {
    let context = MappingContext::new();
    let entity = context.get_or_create_document::<Book>().unwrap();
    assert_eq!(entity.index_name(), "books");

    let builder = MappingBuilder::new(&context, ResourceLoader::default());
    assert_eq!(
        builder.build_settings("Book").unwrap()["index"]["number_of_shards"],
        2
    );
    assert_eq!(
        builder.build_mapping("Book").unwrap(),
        json!({"properties": {"title": {"type": "text", "analyzer": "english"}}})
    );
}

#[test]
fn test_concurrent_mapping_builds_share_one_entity() {
    let context = Arc::new(MappingContext::new());
    context.register_document::<Book>().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let context = Arc::clone(&context);
            thread::spawn(move || {
                let builder = MappingBuilder::new(&context, ResourceLoader::default());
                let mapping = builder.build_mapping("Book").unwrap();
                (context.get_entity("Book").unwrap(), mapping)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &results[0].0;
    for (entity, mapping) in &results {
        assert!(Arc::ptr_eq(first, entity));
        assert_eq!(mapping, &results[0].1);
    }
}
