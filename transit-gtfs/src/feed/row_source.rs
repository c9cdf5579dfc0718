use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use indexmap::IndexMap;

use super::{FeedError, FeedFile};

/// one line of a feed file, keyed by the header columns in file order.
pub type FeedRow = IndexMap<String, String>;

/// reads a feed file row by row. rows are handed to the callback with their
/// 1-based row number (header excluded).
pub trait RowSource {
    /// # Returns
    ///
    /// false if the file does not exist in the feed. preparators decide if that
    /// is an error.
    fn read_rows(
        &self,
        file: FeedFile,
        on_row: &mut dyn FnMut(FeedRow, usize),
    ) -> Result<bool, FeedError>;
}

/// a feed unzipped in a directory.
pub struct CsvDirectorySource {
    directory: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl RowSource for CsvDirectorySource {
    fn read_rows(
        &self,
        file: FeedFile,
        on_row: &mut dyn FnMut(FeedRow, usize),
    ) -> Result<bool, FeedError> {
        let path = self.directory.join(file.file_name());
        if !path.exists() {
            return Ok(false);
        }
        let reader = File::open(&path).map_err(|e| FeedError::Read {
            file,
            message: format!("{}: {e}", path.to_str().unwrap_or_default()),
        })?;
        read_csv(reader, file, on_row)?;
        Ok(true)
    }
}

/// feed files held as strings, keyed by file. used to build fixtures.
#[derive(Default)]
pub struct InMemoryRowSource {
    files: HashMap<FeedFile, String>,
}

impl InMemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file: FeedFile, content: &str) -> Self {
        self.files.insert(file, content.to_string());
        self
    }
}

impl RowSource for InMemoryRowSource {
    fn read_rows(
        &self,
        file: FeedFile,
        on_row: &mut dyn FnMut(FeedRow, usize),
    ) -> Result<bool, FeedError> {
        match self.files.get(&file) {
            None => Ok(false),
            Some(content) => {
                read_csv(content.as_bytes(), file, on_row)?;
                Ok(true)
            }
        }
    }
}

fn read_csv<R: Read>(
    reader: R,
    file: FeedFile,
    on_row: &mut dyn FnMut(FeedRow, usize),
) -> Result<(), FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| FeedError::Read {
            file,
            message: format!("invalid header: {e}"),
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();
    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = record.map_err(|e| FeedError::MalformedRow {
            file,
            row: row_number,
            message: e.to_string(),
        })?;
        let row: FeedRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        on_row(row, row_number);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{InMemoryRowSource, RowSource};
    use crate::feed::FeedFile;

    #[test]
    fn test_rows_keep_header_order_and_strip_bom() {
        let source = InMemoryRowSource::new().with_file(
            FeedFile::Agency,
            "\u{feff}agency_id,agency_name\nSTM, Société de transport\n",
        );
        let mut rows = vec![];
        let found = source
            .read_rows(FeedFile::Agency, &mut |row, n| rows.push((row, n)))
            .unwrap();
        assert!(found);
        assert_eq!(rows.len(), 1);
        let (row, n) = &rows[0];
        assert_eq!(*n, 1);
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["agency_id", "agency_name"]);
        assert_eq!(row["agency_name"], "Société de transport");
    }

    #[test]
    fn test_missing_file() {
        let source = InMemoryRowSource::new();
        let found = source.read_rows(FeedFile::Shapes, &mut |_, _| {}).unwrap();
        assert!(!found);
    }
}
