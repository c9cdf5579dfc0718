use serde_json::json;

use super::{ImportError, ImportWarning};

/// terminal value of an import run. `nodes_dirty` tells the caller to refresh
/// whatever it derives from nodes, even when the run failed.
#[derive(Debug)]
pub enum ImportResult {
    /// errors are only those of the schedules phase
    Success {
        warnings: Vec<ImportWarning>,
        errors: Vec<ImportError>,
        nodes_dirty: bool,
    },
    Failed {
        errors: Vec<ImportError>,
        nodes_dirty: bool,
    },
}

impl ImportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportResult::Success { .. })
    }

    pub fn nodes_dirty(&self) -> bool {
        match self {
            ImportResult::Success { nodes_dirty, .. } => *nodes_dirty,
            ImportResult::Failed { nodes_dirty, .. } => *nodes_dirty,
        }
    }

    pub fn warnings(&self) -> &[ImportWarning] {
        match self {
            ImportResult::Success { warnings, .. } => warnings,
            ImportResult::Failed { .. } => &[],
        }
    }

    pub fn errors(&self) -> &[ImportError] {
        match self {
            ImportResult::Success { errors, .. } => errors,
            ImportResult::Failed { errors, .. } => errors,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let errors = self
            .errors()
            .iter()
            .map(|e| {
                json!({
                    "phase": e.phase(),
                    "message": e.to_string(),
                })
            })
            .collect::<Vec<_>>();
        let warnings = self
            .warnings()
            .iter()
            .map(|w| {
                json!({
                    "message": w.to_string(),
                    "detail": w,
                })
            })
            .collect::<Vec<_>>();
        json!({
            "status": if self.is_success() { "success" } else { "failed" },
            "nodes_dirty": self.nodes_dirty(),
            "warnings": warnings,
            "errors": errors,
        })
    }
}
