use serde::{Deserialize, Serialize};

/// what a reconciler does with a candidate. only the variants acting on an
/// existing entity carry its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Disposition {
    /// new network entity
    Create,
    /// delete the target and create the candidate in its place
    Replace { target_id: String },
    /// keep the target untouched, and never update it downstream
    MergeAndIgnore { target_id: String },
    /// copy the candidate onto the target
    MergeAndReplace { target_id: String },
}

impl Disposition {
    /// create when nothing or several entities match, replace on a single match.
    pub fn default_for(existing_ids: &[String]) -> Disposition {
        match existing_ids {
            [only] => Disposition::Replace {
                target_id: only.clone(),
            },
            _ => Disposition::Create,
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            Disposition::Create => None,
            Disposition::Replace { target_id }
            | Disposition::MergeAndIgnore { target_id }
            | Disposition::MergeAndReplace { target_id } => Some(target_id),
        }
    }
}

/// user choice for one candidate, keyed by feed id in the import parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSelection {
    #[serde(default = "default_selected")]
    pub selected: bool,
    #[serde(default)]
    pub disposition: Option<Disposition>,
}

fn default_selected() -> bool {
    true
}

/// a feed entity prepared for import, with the existing network entities it
/// may stand for.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImportCandidate<T> {
    pub data: T,
    pub existing_ids: Vec<String>,
    pub selected: bool,
    pub disposition: Disposition,
}

impl<T> ImportCandidate<T> {
    pub fn new(data: T, existing_ids: Vec<String>) -> Self {
        let disposition = Disposition::default_for(&existing_ids);
        Self {
            data,
            existing_ids,
            selected: true,
            disposition,
        }
    }

    /// applies the user choice, if any. without one the candidate keeps its
    /// default selection and disposition.
    pub fn apply_selection(&mut self, selection: Option<&CandidateSelection>) {
        if let Some(selection) = selection {
            self.selected = selection.selected;
            if let Some(disposition) = &selection.disposition {
                self.disposition = disposition.clone();
            }
        }
    }
}

/// candidates produced by a preparator, with the rows it rejected.
#[derive(Clone, Debug)]
pub struct Preparation<T> {
    pub candidates: Vec<T>,
    pub warnings: Vec<crate::import::ImportWarning>,
}

impl<T> Default for Preparation<T> {
    fn default() -> Self {
        Self {
            candidates: vec![],
            warnings: vec![],
        }
    }
}
