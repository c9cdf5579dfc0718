use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use super::CollectionError;
use crate::model::{Agency, Line, Node, Path, Schedule, Service};

/// the full network content, serialized as a single JSON document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub agencies: Vec<Agency>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub paths: Vec<Path>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl NetworkSnapshot {
    pub fn read_json(path: &FsPath) -> Result<NetworkSnapshot, CollectionError> {
        let file = File::open(path).map_err(|e| CollectionError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| CollectionError::Read {
            path: path.to_path_buf(),
            message: format!("invalid network snapshot: {e}"),
        })
    }

    pub fn write_json(&self, path: &FsPath) -> Result<(), CollectionError> {
        let file = File::create(path).map_err(|e| CollectionError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| {
            CollectionError::Write {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }
}
