use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::context::MappingContext;
use super::descriptor::EntityDescriptor;
use super::types::DateFormat;
use crate::{Error, Result};

/// Loads entity descriptors from a directory of YAML files, one entity per file.
pub struct SchemaLoader {
    schemas_dir: PathBuf,
}

impl SchemaLoader {
    pub fn new(schemas_dir: impl AsRef<Path>) -> Self {
        Self {
            schemas_dir: schemas_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load_all(&self) -> Result<HashMap<String, EntityDescriptor>> {
        let mut schemas = HashMap::new();

        if !self.schemas_dir.exists() {
            return Err(Error::Schema(format!(
                "Schemas directory does not exist: {}",
                self.schemas_dir.display()
            )));
        }

        for entry in fs::read_dir(&self.schemas_dir)? {
            let entry = entry?;
            let path = entry.path();

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yaml") | Some("yml")) {
                continue;
            }

            let schema = Self::load_schema(&path)?;
            if schemas.contains_key(&schema.name) {
                return Err(Error::Schema(format!(
                    "Entity {} is declared more than once (again in {})",
                    schema.name,
                    path.display()
                )));
            }
            schemas.insert(schema.name.clone(), schema);
        }

        Ok(schemas)
    }

    /// Load every schema and register it with `context`. Returns the number
    /// of registered entities.
    pub fn load_into(&self, context: &MappingContext) -> Result<usize> {
        let schemas = self.load_all()?;
        let count = schemas.len();
        context.register_all(schemas.into_values())?;
        tracing::debug!(dir = %self.schemas_dir.display(), count, "registered entity schemas");
        Ok(count)
    }

    pub fn load_schema(path: &Path) -> Result<EntityDescriptor> {
        let content = fs::read_to_string(path)?;
        let schema: EntityDescriptor = serde_yaml::from_str(&content)?;
        Ok(schema)
    }

    /// Lint a single schema against the others it references and return a
    /// list of human-readable issues (empty = ok).
    pub fn lint_schema(
        schema: &EntityDescriptor,
        all: &HashMap<String, EntityDescriptor>,
    ) -> Vec<String> {
        let mut issues = Vec::new();

        for property in &schema.properties {
            if let Some(target) = property.value_type.entity_name() {
                if !all.contains_key(target) {
                    issues.push(format!(
                        "{}: references unknown entity {}",
                        property.name, target
                    ));
                }
            }

            let Some(field) = &property.field else {
                continue;
            };

            if field.field_type.is_date() {
                match (&field.format, &field.pattern) {
                    (None, _) => issues.push(format!("{}: date field needs a format", property.name)),
                    (Some(DateFormat::Custom), pattern)
                        if !pattern.as_deref().is_some_and(|p| !p.trim().is_empty()) =>
                    {
                        issues.push(format!(
                            "{}: custom date format needs a pattern",
                            property.name
                        ))
                    }
                    _ => {}
                }
            }

            // Nested mappings recurse until an ignore-list cuts the cycle.
            if field.field_type.is_nested_or_object() && field.ignore_fields.is_empty() {
                if let Some(target) = property.value_type.entity_name() {
                    if target == schema.name || reaches(all, target, &schema.name) {
                        issues.push(format!(
                            "{}: nested reference to {} forms a cycle without ignore_fields; \
                             building the mapping will not terminate",
                            property.name, target
                        ));
                    }
                }
            }
        }

        issues
    }

    /// Lint all loaded schemas and return map entity -> issues
    pub fn lint_all(schemas: &HashMap<String, EntityDescriptor>) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        for (name, schema) in schemas {
            let issues = SchemaLoader::lint_schema(schema, schemas);
            if !issues.is_empty() {
                map.insert(name.clone(), issues);
            }
        }
        map
    }
}

/// Whether `to` is reachable from `from` through nested/object properties.
fn reaches(all: &HashMap<String, EntityDescriptor>, from: &str, to: &str) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from.to_string()];

    while let Some(current) = stack.pop() {
        if !seen.insert(current.clone()) {
            continue;
        }
        let Some(descriptor) = all.get(&current) else {
            continue;
        };
        for property in &descriptor.properties {
            let nested = property
                .field
                .as_ref()
                .is_some_and(|f| f.field_type.is_nested_or_object());
            if let (true, Some(target)) = (nested, property.value_type.entity_name()) {
                if target == to {
                    return true;
                }
                stack.push(target.to_string());
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_schemas_from_directory() -> Result<()> {
        let temp = TempDir::new()?;
        let schema_dir = temp.path();

        fs::write(
            schema_dir.join("book.yaml"),
            r#"
name: Book
index: books
properties:
  - name: id
    type: string
    id: true
  - name: title
    type: string
    field:
      type: text
      analyzer: standard
"#,
        )?;
        fs::write(schema_dir.join("notes.txt"), "not a schema")?;

        let loader = SchemaLoader::new(schema_dir);
        let schemas = loader.load_all()?;

        assert_eq!(schemas.len(), 1);
        assert!(schemas.contains_key("Book"));
        assert_eq!(schemas["Book"].properties.len(), 2);

        Ok(())
    }

    #[test]
    fn test_missing_directory() {
        let loader = SchemaLoader::new("/definitely/not/here");
        assert!(matches!(loader.load_all(), Err(Error::Schema(_))));
    }

    #[test]
    fn test_lint_flags_cycle_without_ignore_fields() {
        let person: EntityDescriptor = serde_yaml::from_str(
            r#"
name: Person
properties:
  - name: friends
    type:
      list:
        entity: Person
    field:
      type: nested
"#,
        )
        .unwrap();
        let mut all = HashMap::new();
        all.insert(person.name.clone(), person);

        let issues = SchemaLoader::lint_all(&all);
        assert_eq!(issues["Person"].len(), 1);
        assert!(issues["Person"][0].contains("cycle"));
    }

    #[test]
    fn test_lint_accepts_cycle_with_ignore_fields() {
        let person: EntityDescriptor = serde_yaml::from_str(
            r#"
name: Person
properties:
  - name: friends
    type:
      list:
        entity: Person
    field:
      type: nested
      ignore_fields: [friends]
"#,
        )
        .unwrap();
        let mut all = HashMap::new();
        all.insert(person.name.clone(), person);

        assert!(SchemaLoader::lint_all(&all).is_empty());
    }

    #[test]
    fn test_lint_flags_mutual_cycle_and_unknown_reference() {
        let a: EntityDescriptor = serde_yaml::from_str(
            r#"
name: A
properties:
  - name: b
    type: { entity: B }
    field: { type: object }
  - name: c
    type: { entity: C }
"#,
        )
        .unwrap();
        let b: EntityDescriptor = serde_yaml::from_str(
            r#"
name: B
properties:
  - name: a
    type: { entity: A }
    field: { type: object }
"#,
        )
        .unwrap();
        let mut all = HashMap::new();
        all.insert("A".to_string(), a);
        all.insert("B".to_string(), b);

        let issues = SchemaLoader::lint_all(&all);
        assert!(issues["A"].iter().any(|i| i.contains("unknown entity C")));
        assert!(issues["A"].iter().any(|i| i.contains("cycle")));
        assert!(issues["B"].iter().any(|i| i.contains("cycle")));
    }

    #[test]
    fn test_lint_matches_date_validation() {
        let event: EntityDescriptor = serde_yaml::from_str(
            r#"
name: Event
properties:
  - name: blank
    type: date
    field: { type: date, format: custom, pattern: "  " }
  - name: missing
    type: date
    field: { type: date, format: custom }
  - name: ok
    type: date
    field: { type: date, format: custom, pattern: "dd.MM.uuuu" }
"#,
        )
        .unwrap();
        let mut all = HashMap::new();
        all.insert("Event".to_string(), event);

        let issues = SchemaLoader::lint_all(&all);
        assert_eq!(
            issues["Event"],
            vec![
                "blank: custom date format needs a pattern".to_string(),
                "missing: custom date format needs a pattern".to_string(),
            ]
        );

        let context = MappingContext::new();
        context.register_all(all.into_values()).unwrap();
        assert!(matches!(
            context.get_or_create_entity("Event"),
            Err(Error::Mapping { .. })
        ));
    }
}
