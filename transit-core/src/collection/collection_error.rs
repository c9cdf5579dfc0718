use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CollectionError {
    #[error("failure loading {entity} collection: {message}")]
    Load {
        entity: &'static str,
        message: String,
    },
    #[error("failure saving {entity} '{id}': {message}")]
    Save {
        entity: &'static str,
        id: String,
        message: String,
    },
    #[error("failure deleting {entity} '{id}': {message}")]
    Delete {
        entity: &'static str,
        id: String,
        message: String,
    },
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("Error reading from '{path}': {message}")]
    Read { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    Write { path: PathBuf, message: String },
    #[error("Internal Error: {0}")]
    Internal(String),
}
