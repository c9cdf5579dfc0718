use transit_core::collection::CollectionError;

use super::ImportPhase;
use crate::feed::FeedError;

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),
    #[error("invalid import parameters: {0}")]
    InvalidParameters(String),
    #[error("{phase} import failed: {source}")]
    Phase {
        phase: ImportPhase,
        source: Box<ImportError>,
    },
    #[error("{0}")]
    Internal(String),
}

impl ImportError {
    pub fn in_phase(self, phase: ImportPhase) -> ImportError {
        ImportError::Phase {
            phase,
            source: Box::new(self),
        }
    }

    /// phase of this error, if it was raised by a phase.
    pub fn phase(&self) -> Option<ImportPhase> {
        match self {
            ImportError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
