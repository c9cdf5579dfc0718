//! preparators read feed files into typed candidates. rows that cannot be
//! used are dropped with a warning; only a missing required file fails.
mod agency_preparator;
mod field_ops;
mod frequency_preparator;
mod import_candidate;
mod route_preparator;
mod service_preparator;
mod shape_preparator;
mod stop_preparator;
mod stop_time_preparator;
mod trip_preparator;

pub use agency_preparator::{matching_agencies, prepare_agencies, FeedAgency, DEFAULT_AGENCY_ID};
pub use frequency_preparator::{prepare_frequencies, FeedFrequency};
pub use import_candidate::{CandidateSelection, Disposition, ImportCandidate, Preparation};
pub use route_preparator::{prepare_lines, FeedRoute};
pub use service_preparator::{matching_services, prepare_services, FeedService};
pub use shape_preparator::{prepare_shapes, FeedShapePoint};
pub use stop_preparator::{prepare_stops, FeedStop};
pub use stop_time_preparator::{interpolate_stop_times, prepare_stop_times, FeedStopTime};
pub use trip_preparator::{prepare_trips, FeedTrip};
