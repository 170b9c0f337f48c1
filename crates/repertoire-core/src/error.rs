use thiserror::Error;

/// Errors raised by the domain model and the discovery database.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stored or supplied identifier is not a valid UUID.
    #[error("invalid {kind} id: {value}")]
    InvalidId { kind: &'static str, value: String },

    /// A stored enum or timestamp column holds an unrecognised value.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
