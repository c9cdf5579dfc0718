use geo::LineString;
use serde::{Deserialize, Serialize};

use super::NetworkEntity;

/// one physical variant of a line: an ordered node sequence with its geometry
/// and per-segment timing.
///
/// # Invariants
///
/// `segments.len() == nodes.len() - 1 == dwell_times_seconds.len() - 1`, and the
/// last dwell time is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: String,
    pub line_id: String,
    pub name: Option<String>,
    pub direction: PathDirection,
    pub nodes: Vec<String>,
    /// missing when the stops could not be placed on the feed shape
    pub geography: Option<LineString<f64>>,
    pub segments: Vec<PathSegment>,
    pub dwell_times_seconds: Vec<u32>,
    pub data: PathData,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathDirection {
    Outbound,
    Inbound,
    Other,
}

impl PathDirection {
    /// GTFS `direction_id`: 0 travels in one direction, 1 in the opposite one.
    pub fn from_direction_id(direction_id: Option<u8>) -> PathDirection {
        match direction_id {
            Some(0) => PathDirection::Outbound,
            Some(1) => PathDirection::Inbound,
            _ => PathDirection::Other,
        }
    }
}

/// the stretch between two consecutive path nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    /// index in the path geography of the first coordinate of this segment
    pub start_coordinate_index: Option<usize>,
    pub travel_time_seconds: Option<u32>,
    pub distance_meters: Option<f64>,
}

/// aggregate metrics and provenance of a path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub from_gtfs: bool,
    pub gtfs_shape_id: Option<String>,
    pub gtfs_trip_ids: Vec<String>,
    pub geography_error: Option<String>,
    pub total_distance_meters: Option<f64>,
    /// straight-line distance between the two terminals
    pub birds_eye_distance_meters: Option<f64>,
    pub travel_time_without_dwell_seconds: u32,
    pub total_dwell_time_seconds: u32,
    pub layover_time_seconds: u32,
    pub operating_time_without_layover_seconds: u32,
    pub operating_time_with_layover_seconds: u32,
    pub average_speed_without_dwell_mps: Option<f64>,
    pub operating_speed_mps: Option<f64>,
    pub operating_speed_with_layover_mps: Option<f64>,
}

impl Path {
    pub fn new(id: String, line_id: String, direction: PathDirection, nodes: Vec<String>) -> Self {
        Self {
            id,
            line_id,
            name: None,
            direction,
            nodes,
            geography: None,
            segments: vec![],
            dwell_times_seconds: vec![],
            data: PathData::default(),
        }
    }

    /// true if segment and dwell time counts agree with the node count.
    pub fn has_consistent_segments(&self) -> bool {
        !self.nodes.is_empty()
            && self.segments.len() == self.nodes.len() - 1
            && self.dwell_times_seconds.len() == self.nodes.len()
            && self.dwell_times_seconds.last() == Some(&0)
    }
}

impl NetworkEntity for Path {
    const ENTITY_NAME: &'static str = "path";

    fn id(&self) -> &str {
        &self.id
    }
}
