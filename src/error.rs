use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the database, repository, and mapping layers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation failed: {0}")]
    Validation(String),

    /// A filter or ordering named a column the entity does not have.
    #[error("unknown column '{column}' on {table}")]
    UnknownColumn { table: &'static str, column: String },

    /// Update or delete was staged for an entity that was never saved.
    #[error("{0} has no id; insert it before updating or deleting")]
    MissingKey(&'static str),

    #[error("no database at {}; run `pubtrack init` first", .0.display())]
    NotInitialized(std::path::PathBuf),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid stored value: {0}")]
    InvalidData(String),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }
}
