use super::FeedFile;

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("required feed file '{0}' is missing")]
    MissingFile(FeedFile),
    #[error("failure reading '{file}': {message}")]
    Read { file: FeedFile, message: String },
    #[error("failure reading '{file}' row {row}: {message}")]
    MalformedRow {
        file: FeedFile,
        row: usize,
        message: String,
    },
}
