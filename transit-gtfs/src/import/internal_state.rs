use std::collections::{HashMap, HashSet};

use geo::Point;
use transit_core::model::PeriodGroup;

use crate::prepare::{FeedFrequency, FeedShapePoint, FeedStopTime, FeedTrip};

/// everything an import run learns about the feed and its network
/// counterparts. owned by the orchestrator, lent to one phase at a time.
///
/// # Invariants
///
/// shapes are sorted by sequence, stop times by stop sequence and
/// frequencies by start time.
#[derive(Debug, Default)]
pub struct InternalState {
    pub agency_id_by_feed_id: HashMap<String, String>,
    pub line_id_by_route_id: HashMap<String, String>,
    pub service_id_by_feed_id: HashMap<String, String>,
    pub node_id_by_stop_id: HashMap<String, String>,
    /// feed stop coordinates, by stop id
    pub stop_coordinates: HashMap<String, Point<f64>>,
    pub trips_to_import: Vec<FeedTrip>,
    pub shapes_by_shape_id: HashMap<String, Vec<FeedShapePoint>>,
    pub stop_times_by_trip_id: HashMap<String, Vec<FeedStopTime>>,
    pub frequencies_by_trip_id: HashMap<String, Vec<FeedFrequency>>,
    pub path_id_by_trip_id: HashMap<String, String>,
    pub period_group: Option<PeriodGroup>,
    /// network agencies whose lines, services and schedules are left untouched
    pub do_not_update_agency_ids: HashSet<String>,
    /// network agencies receiving this feed's content
    pub imported_agency_ids: HashSet<String>,
}

impl InternalState {
    pub fn new(period_group: Option<PeriodGroup>) -> Self {
        Self {
            period_group,
            ..Default::default()
        }
    }
}
