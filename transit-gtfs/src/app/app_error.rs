use transit_core::collection::CollectionError;

use crate::feed::FeedError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("invalid configuration '{source_name}': {message}")]
    Configuration {
        source_name: String,
        message: String,
    },
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("{0}")]
    Runtime(String),
    #[error("import failed: {0}")]
    ImportFailed(String),
    #[error("failure writing output: {0}")]
    Output(String),
}
