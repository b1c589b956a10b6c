//! Blocking reads of mapping fragments, dynamic templates and settings files.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Resolves resource paths against a root directory and reads them.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    root: PathBuf,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ResourceLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths are used as is, relative ones are joined to the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    pub fn read_to_string(&self, path: &str) -> Result<String> {
        let resolved = self.resolve(path);
        fs::read_to_string(&resolved).map_err(|e| Error::resource_read(resolved, e))
    }

    pub fn read_json(&self, path: &str) -> Result<Value> {
        let content = self.read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::resource_read(self.resolve(path), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_relative_paths_resolve_against_root() {
        let loader = ResourceLoader::new("/srv/resources");
        assert_eq!(
            loader.resolve("mappings/title.json"),
            PathBuf::from("/srv/resources/mappings/title.json")
        );
        assert_eq!(loader.resolve("/etc/x.json"), PathBuf::from("/etc/x.json"));
    }

    #[test]
    fn test_read_json() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f.json"), r#"{"type": "keyword"}"#).unwrap();

        let loader = ResourceLoader::new(temp.path());
        assert_eq!(loader.read_json("f.json").unwrap(), json!({"type": "keyword"}));
    }

    #[test]
    fn test_missing_and_invalid_resources() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bad.json"), "{ not json").unwrap();
        let loader = ResourceLoader::new(temp.path());

        assert!(matches!(
            loader.read_json("missing.json"),
            Err(Error::ResourceRead { .. })
        ));
        assert!(matches!(
            loader.read_json("bad.json"),
            Err(Error::ResourceRead { .. })
        ));
    }
}
