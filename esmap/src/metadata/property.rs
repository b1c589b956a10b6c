use super::descriptor::{FieldSpec, MultiFieldSpec, PropertyDescriptor};
use super::types::{DateFormat, ValueType};
use crate::{Error, Result};

/// Property names treated as the identifier when no property is marked explicitly.
const IMPLICIT_ID_NAMES: [&str; 2] = ["id", "documentId"];

/// Validated metadata of one entity property.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentProperty {
    name: String,
    field_name: String,
    owner: String,
    value_type: ValueType,
    field: Option<FieldSpec>,
    multi_field: Option<MultiFieldSpec>,
    mapping_path: Option<String>,
    explicit_id: bool,
    version: bool,
    transient: bool,
}

impl PersistentProperty {
    /// Validate a descriptor belonging to the entity `owner`.
    pub fn new(owner: &str, descriptor: PropertyDescriptor) -> Result<Self> {
        let PropertyDescriptor {
            name,
            value_type,
            field_name,
            field,
            multi_field,
            mapping_path,
            id,
            version,
            transient,
        } = descriptor;

        if name.trim().is_empty() {
            return Err(Error::mapping(owner, "<unnamed>", "property name must not be empty"));
        }

        let field_name = match field_name {
            Some(f) if f.trim().is_empty() => {
                return Err(Error::mapping(owner, &name, "field name must not be empty"));
            }
            Some(f) => f,
            None => name.clone(),
        };

        if let Some(spec) = &field {
            validate_date_format(owner, &name, spec)?;
        }
        if let Some(multi) = &multi_field {
            validate_date_format(owner, &name, &multi.main)?;
        }

        if id && version {
            return Err(Error::mapping(
                owner,
                &name,
                "a property cannot be both identifier and version",
            ));
        }
        if id && !value_type.is_valid_id_type() {
            return Err(Error::mapping(
                owner,
                &name,
                format!(
                    "identifier must be a string, integer, long or uuid, found {:?}",
                    value_type
                ),
            ));
        }
        if version && !value_type.is_valid_version_type() {
            return Err(Error::mapping(
                owner,
                &name,
                format!("version must be an integer or long, found {:?}", value_type),
            ));
        }

        Ok(Self {
            name,
            field_name,
            owner: owner.to_string(),
            value_type,
            field,
            multi_field,
            mapping_path,
            explicit_id: id,
            version,
            transient,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the field in the stored document.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Type name of the entity declaring this property.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn field(&self) -> Option<&FieldSpec> {
        self.field.as_ref()
    }

    pub fn multi_field(&self) -> Option<&MultiFieldSpec> {
        self.multi_field.as_ref()
    }

    pub fn mapping_path(&self) -> Option<&str> {
        self.mapping_path.as_deref()
    }

    pub fn is_explicit_id(&self) -> bool {
        self.explicit_id
    }

    /// Marked as identifier, or named like one.
    pub fn is_id_candidate(&self) -> bool {
        self.explicit_id
            || (IMPLICIT_ID_NAMES.contains(&self.field_name.as_str())
                && self.value_type.is_valid_id_type())
    }

    pub fn is_version(&self) -> bool {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_seq_no_primary_term(&self) -> bool {
        self.value_type == ValueType::SeqNoPrimaryTerm
    }

    pub fn is_geo_point(&self) -> bool {
        *self.value_type.actual_type() == ValueType::GeoPoint
    }

    pub fn is_completion(&self) -> bool {
        *self.value_type.actual_type() == ValueType::Completion
    }

    /// The value refers to another mapped entity.
    pub fn is_entity(&self) -> bool {
        self.value_type.entity_name().is_some()
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.value_type.entity_name()
    }

    pub fn is_collection(&self) -> bool {
        self.value_type.is_collection()
    }

    /// Whether the property is read from stored documents. The seq_no/primary_term
    /// pair is filled from hit metadata instead.
    pub fn is_readable(&self) -> bool {
        !self.transient && !self.is_seq_no_primary_term()
    }

    pub fn is_writable(&self) -> bool {
        !self.transient && !self.is_seq_no_primary_term()
    }

    /// Field directive of type nested or object.
    pub fn is_nested_or_object(&self) -> bool {
        self.field
            .as_ref()
            .is_some_and(|f| f.field_type.is_nested_or_object())
    }

    /// Lowercased name without underscores, used to match camel-case method names.
    pub(crate) fn normalized_name(&self) -> String {
        normalize(&self.name)
    }
}

pub(crate) fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split `AuthorFirstName` into `["Author", "First", "Name"]`.
pub(crate) fn split_camel_case(source: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in source.char_indices() {
        if let Some(p) = prev {
            if c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()) {
                words.push(&source[start..i]);
                start = i;
            }
        }
        prev = Some(c);
    }
    if start < source.len() {
        words.push(&source[start..]);
    }
    words
}

fn validate_date_format(owner: &str, name: &str, spec: &FieldSpec) -> Result<()> {
    if !spec.field_type.is_date() {
        return Ok(());
    }
    match spec.format {
        None => Err(Error::mapping(
            owner,
            name,
            "date field type requires a format",
        )),
        Some(DateFormat::Custom) => {
            let has_pattern = spec.pattern.as_deref().is_some_and(|p| !p.trim().is_empty());
            if has_pattern {
                Ok(())
            } else {
                Err(Error::mapping(
                    owner,
                    name,
                    "custom date format requires a non-empty pattern",
                ))
            }
        }
        Some(_) => Ok(()),
    }
}
