//! Error types for relorm

use thiserror::Error;

/// Result type alias for relorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for query construction, metadata lookup and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A model type has no relationship field with the given name
    #[error("missing relationship: {model} has no relationship named '{relation}'")]
    MissingRelationship { model: String, relation: String },

    /// A model type has no column backing a resolved key or requested field
    #[error("missing field: {model} has no column '{field}'")]
    MissingField { model: String, field: String },

    /// Malformed predicate or clause
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// Relationship declared over a composite primary key without explicit key names
    #[error("relationship '{relation}' needs an explicit key: {model} has a composite primary key")]
    CompositeKey { model: String, relation: String },

    /// Relationship key cannot be resolved (no primary key, unusable key value)
    #[error("unsupported relationship key: {0}")]
    UnsupportedKey(String),

    /// Abstract column type not supported by a dialect
    #[error("dialect {dialect} does not support column type {ty}")]
    UnsupportedType { dialect: &'static str, ty: String },

    /// Identifier failed validation
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Postgres execution error
    #[error("Query error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// SQLite execution error
    #[cfg(feature = "sqlite")]
    #[error("Query error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Failure while batch loading a relationship
    #[error("loading relationship '{relation}': {source}")]
    Load {
        relation: String,
        #[source]
        source: Box<OrmError>,
    },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a missing relationship error
    pub fn missing_relationship(model: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::MissingRelationship {
            model: model.into(),
            relation: relation.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Create a construction error for a malformed condition
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition(message.into())
    }

    /// Wrap an error raised while loading `relation`.
    pub fn loading(relation: impl Into<String>, source: OrmError) -> Self {
        Self::Load {
            relation: relation.into(),
            source: Box::new(source),
        }
    }

    /// Unwrap `Load` context down to the underlying error.
    pub fn root(&self) -> &OrmError {
        match self {
            Self::Load { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is (or wraps) a missing relationship error
    pub fn is_missing_relationship(&self) -> bool {
        matches!(self.root(), Self::MissingRelationship { .. })
    }

    /// Check if this is (or wraps) a missing field error
    pub fn is_missing_field(&self) -> bool {
        matches!(self.root(), Self::MissingField { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout(_))
    }

    /// Check if this is a construction error
    pub fn is_invalid_condition(&self) -> bool {
        matches!(self.root(), Self::InvalidCondition(_))
    }
}
