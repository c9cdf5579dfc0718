use std::fmt::Display;

use serde::Serialize;

/// the import runs its phases in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Stops,
    Agencies,
    Lines,
    Services,
    Paths,
    Schedules,
}

impl ImportPhase {
    pub fn name(&self) -> &'static str {
        match self {
            ImportPhase::Stops => "stops",
            ImportPhase::Agencies => "agencies",
            ImportPhase::Lines => "lines",
            ImportPhase::Services => "services",
            ImportPhase::Paths => "paths",
            ImportPhase::Schedules => "schedules",
        }
    }
}

impl Display for ImportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
