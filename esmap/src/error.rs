use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A structural invariant of the metadata model was violated.
    #[error("Mapping error on {entity}.{property}: {message}")]
    Mapping {
        entity: String,
        property: String,
        message: String,
    },

    /// A recognized capability that is not implemented (geo, multi-field, completion).
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Failed to read resource {}: {source}", path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to derive query from {method}: {message}")]
    QueryParse { method: String, message: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("No property {path} found on {entity}")]
    PropertyNotFound { entity: String, path: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn mapping(
        entity: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Mapping {
            entity: entity.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    pub(crate) fn query_parse(method: impl Into<String>, message: impl Into<String>) -> Self {
        Error::QueryParse {
            method: method.into(),
            message: message.into(),
        }
    }

    pub(crate) fn resource_read(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::ResourceRead {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
