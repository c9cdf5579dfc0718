use serde::Serialize;

use crate::feed::FeedFile;

/// row-level and entity-level problems. they never stop an import; they are
/// returned with its result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportWarning {
    #[error("{file} row {row}: missing required field '{field}', row ignored")]
    MissingField {
        file: FeedFile,
        row: usize,
        field: String,
    },
    #[error("{file} row {row}: invalid value '{value}' for field '{field}', row ignored")]
    InvalidFieldValue {
        file: FeedFile,
        row: usize,
        field: String,
        value: String,
    },
    #[error("stop '{stop_id}' has no coordinates and no parent station with coordinates")]
    StopWithoutLocation { stop_id: String },
    #[error("service '{service_id}' has no operating day")]
    ServiceWithoutDates { service_id: String },
    #[error("route '{route_id}' references unknown agency '{agency_id}'")]
    UnknownAgency { route_id: String, agency_id: String },
    #[error("failure saving {entity} '{id}': {message}")]
    EntitySaveFailed {
        entity: String,
        id: String,
        message: String,
    },
    #[error("trip '{trip_id}' has no time on its first or last stop, trip ignored")]
    TripWithoutTerminalTimes { trip_id: String },
    #[error("trip '{trip_id}' has no stop times, trip ignored")]
    TripWithoutStopTimes { trip_id: String },
    #[error("trip '{trip_id}' references stop '{stop_id}' which was not imported, trip ignored")]
    UnknownTripStop { trip_id: String, stop_id: String },
    #[error("trip '{trip_id}' serves fewer than two nodes, trip ignored")]
    TripTooShort { trip_id: String },
    #[error("trip '{trip_id}' references unknown shape '{shape_id}'")]
    UnknownShape { trip_id: String, shape_id: String },
    #[error("trip '{trip_id}' has no shape, path geography follows its stops")]
    TripWithoutShape { trip_id: String },
    #[error("path '{path_id}' of line '{line_id}': {message}")]
    PathGeographyFailed {
        path_id: String,
        line_id: String,
        message: String,
    },
    #[error("paths of line '{line_id}' not generated: {message}")]
    LinePathsFailed { line_id: String, message: String },
    #[error("trip '{trip_id}' has no path, trip not scheduled")]
    TripWithoutPath { trip_id: String },
    #[error("trip '{trip_id}' departs at {departure_time_seconds}s, outside every period")]
    DepartureOutsidePeriods {
        trip_id: String,
        departure_time_seconds: u32,
    },
}
