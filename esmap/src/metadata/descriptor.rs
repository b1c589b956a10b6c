//! Declarative entity descriptions.
//!
//! Descriptors are what callers hand to a [`MappingContext`](super::MappingContext):
//! plain data, either built with the chained constructors below (usually inside a
//! [`Document`] impl) or deserialized from a YAML schema file. They are not
//! validated until the context turns them into a
//! [`PersistentEntity`](super::PersistentEntity).

use serde::{Deserialize, Serialize};

use super::types::{DateFormat, Dynamic, FieldType, IndexOptions, TermVector, ValueType};

/// Mapping directive of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub index: bool,
    #[serde(default)]
    pub store: bool,
    #[serde(default)]
    pub fielddata: bool,
    #[serde(default)]
    pub format: Option<DateFormat>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub analyzer: Option<String>,
    #[serde(default)]
    pub search_analyzer: Option<String>,
    #[serde(default)]
    pub normalizer: Option<String>,
    /// Field names of the referenced entity that are left out of the nested mapping.
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    #[serde(default)]
    pub copy_to: Vec<String>,
    #[serde(default)]
    pub include_in_parent: bool,
    #[serde(default)]
    pub ignore_above: Option<u32>,
    #[serde(default = "default_true")]
    pub doc_values: bool,
    #[serde(default = "default_true")]
    pub norms: bool,
    #[serde(default)]
    pub null_value: Option<String>,
    #[serde(default)]
    pub similarity: Option<String>,
    #[serde(default)]
    pub term_vector: Option<TermVector>,
    #[serde(default)]
    pub index_options: Option<IndexOptions>,
    #[serde(default = "default_true")]
    pub positive_score_impact: bool,
    #[serde(default)]
    pub scaling_factor: Option<f64>,
    #[serde(default)]
    pub dynamic: Option<Dynamic>,
}

fn default_true() -> bool {
    true
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self {
            field_type: FieldType::Auto,
            index: true,
            store: false,
            fielddata: false,
            format: None,
            pattern: None,
            analyzer: None,
            search_analyzer: None,
            normalizer: None,
            ignore_fields: Vec::new(),
            copy_to: Vec::new(),
            include_in_parent: false,
            ignore_above: None,
            doc_values: true,
            norms: true,
            null_value: None,
            similarity: None,
            term_vector: None,
            index_options: None,
            positive_score_impact: true,
            scaling_factor: None,
            dynamic: None,
        }
    }
}

impl FieldSpec {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Self::default()
        }
    }

    pub fn text() -> Self {
        Self::new(FieldType::Text)
    }

    pub fn keyword() -> Self {
        Self::new(FieldType::Keyword)
    }

    pub fn nested() -> Self {
        Self::new(FieldType::Nested)
    }

    pub fn object() -> Self {
        Self::new(FieldType::Object)
    }

    pub fn date(format: DateFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::new(FieldType::Date)
        }
    }

    pub fn store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn fielddata(mut self, fielddata: bool) -> Self {
        self.fielddata = fielddata;
        self
    }

    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn search_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.search_analyzer = Some(analyzer.into());
        self
    }

    pub fn normalizer(mut self, normalizer: impl Into<String>) -> Self {
        self.normalizer = Some(normalizer.into());
        self
    }

    pub fn format(mut self, format: DateFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn copy_to<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.copy_to = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_in_parent(mut self, include: bool) -> Self {
        self.include_in_parent = include;
        self
    }

    pub fn ignore_above(mut self, limit: u32) -> Self {
        self.ignore_above = Some(limit);
        self
    }

    pub fn doc_values(mut self, doc_values: bool) -> Self {
        self.doc_values = doc_values;
        self
    }

    pub fn norms(mut self, norms: bool) -> Self {
        self.norms = norms;
        self
    }

    pub fn null_value(mut self, value: impl Into<String>) -> Self {
        self.null_value = Some(value.into());
        self
    }

    pub fn similarity(mut self, similarity: impl Into<String>) -> Self {
        self.similarity = Some(similarity.into());
        self
    }

    pub fn term_vector(mut self, term_vector: TermVector) -> Self {
        self.term_vector = Some(term_vector);
        self
    }

    pub fn index_options(mut self, options: IndexOptions) -> Self {
        self.index_options = Some(options);
        self
    }

    pub fn positive_score_impact(mut self, positive: bool) -> Self {
        self.positive_score_impact = positive;
        self
    }

    pub fn scaling_factor(mut self, factor: f64) -> Self {
        self.scaling_factor = Some(factor);
        self
    }

    pub fn dynamic(mut self, dynamic: Dynamic) -> Self {
        self.dynamic = Some(dynamic);
        self
    }
}

/// One additional way of indexing a multi-field, e.g. `title.raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerField {
    pub suffix: String,
    #[serde(flatten)]
    pub field: FieldSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiFieldSpec {
    pub main: FieldSpec,
    #[serde(default)]
    pub other_fields: Vec<InnerField>,
}

/// Description of one property of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Name in the stored document when it differs from `name`.
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub field: Option<FieldSpec>,
    #[serde(default)]
    pub multi_field: Option<MultiFieldSpec>,
    /// Resource holding a prebuilt mapping for this property.
    #[serde(default)]
    pub mapping_path: Option<String>,
    #[serde(default)]
    pub id: bool,
    #[serde(default)]
    pub version: bool,
    #[serde(default)]
    pub transient: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            field_name: None,
            field: None,
            multi_field: None,
            mapping_path: None,
            id: false,
            version: false,
            transient: false,
        }
    }

    /// A string identifier property.
    pub fn id_property(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String).id()
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.field = Some(field);
        self
    }

    pub fn multi_field(mut self, multi_field: MultiFieldSpec) -> Self {
        self.multi_field = Some(multi_field);
        self
    }

    pub fn mapping_path(mut self, path: impl Into<String>) -> Self {
        self.mapping_path = Some(path.into());
        self
    }

    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    pub fn version(mut self) -> Self {
        self.version = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// Index level settings of an entity. Unset values fall back to the
/// configured [`IndexConfig`](crate::config::IndexConfig) defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSpec {
    #[serde(default)]
    pub shards: Option<u32>,
    #[serde(default)]
    pub replicas: Option<u32>,
    #[serde(default)]
    pub refresh_interval: Option<String>,
    #[serde(default)]
    pub store_type: Option<String>,
    #[serde(default = "default_true")]
    pub create_index: bool,
    /// Resource holding the complete settings document.
    #[serde(default)]
    pub settings_path: Option<String>,
}

impl Default for SettingsSpec {
    fn default() -> Self {
        Self {
            shards: None,
            replicas: None,
            refresh_interval: None,
            store_type: None,
            create_index: true,
            settings_path: None,
        }
    }
}

/// Description of a mapped domain type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// Index name, defaults to the lowercased type name.
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub settings: SettingsSpec,
    #[serde(default)]
    pub dynamic: Option<Dynamic>,
    /// Resource holding a `{"dynamic_templates": [...]}` document.
    #[serde(default)]
    pub dynamic_templates: Option<String>,
    /// Resource holding the complete mapping for this entity.
    #[serde(default)]
    pub mapping_path: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
            settings: SettingsSpec::default(),
            dynamic: None,
            dynamic_templates: None,
            mapping_path: None,
            properties: Vec::new(),
        }
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn shards(mut self, shards: u32) -> Self {
        self.settings.shards = Some(shards);
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.settings.replicas = Some(replicas);
        self
    }

    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.settings.refresh_interval = Some(interval.into());
        self
    }

    pub fn store_type(mut self, store_type: impl Into<String>) -> Self {
        self.settings.store_type = Some(store_type.into());
        self
    }

    pub fn create_index(mut self, create: bool) -> Self {
        self.settings.create_index = create;
        self
    }

    pub fn settings_path(mut self, path: impl Into<String>) -> Self {
        self.settings.settings_path = Some(path.into());
        self
    }

    pub fn dynamic(mut self, dynamic: Dynamic) -> Self {
        self.dynamic = Some(dynamic);
        self
    }

    pub fn dynamic_templates(mut self, path: impl Into<String>) -> Self {
        self.dynamic_templates = Some(path.into());
        self
    }

    pub fn mapping_path(mut self, path: impl Into<String>) -> Self {
        self.mapping_path = Some(path.into());
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}

/// Implemented by Rust types that are stored as documents.
///
/// ```
/// use esmap::metadata::{Document, EntityDescriptor, FieldSpec, PropertyDescriptor, ValueType};
///
/// struct Book;
///
/// impl Document for Book {
///     fn descriptor() -> EntityDescriptor {
///         EntityDescriptor::new("Book")
///             .index("books")
///             .property(PropertyDescriptor::id_property("id"))
///             .property(
///                 PropertyDescriptor::new("title", ValueType::String)
///                     .field(FieldSpec::text().analyzer("standard")),
///             )
///     }
/// }
/// ```
pub trait Document {
    fn descriptor() -> EntityDescriptor;
}
