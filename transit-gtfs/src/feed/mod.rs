mod feed_error;
mod feed_file;
mod row_source;

pub use feed_error::FeedError;
pub use feed_file::FeedFile;
pub use row_source::{CsvDirectorySource, FeedRow, InMemoryRowSource, RowSource};
