use geo::Point;

use crate::import::{ImportWarning, InternalState};
use crate::prepare::FeedStopTime;

/// the node sequence served by a trip. consecutive stops aggregated into the
/// same node are one node: it keeps the first arrival and the last departure.
#[derive(Clone, Debug, PartialEq)]
pub struct TripNodes {
    pub node_ids: Vec<String>,
    /// one per node
    pub stop_times: Vec<FeedStopTime>,
    /// feed stop location, one per node
    pub coordinates: Vec<Point<f64>>,
}

impl TripNodes {
    pub fn from_state(trip_id: &str, state: &InternalState) -> Result<TripNodes, ImportWarning> {
        let stop_times = state.stop_times_by_trip_id.get(trip_id).ok_or_else(|| {
            ImportWarning::TripWithoutStopTimes {
                trip_id: trip_id.to_string(),
            }
        })?;
        let mut result = TripNodes {
            node_ids: vec![],
            stop_times: vec![],
            coordinates: vec![],
        };
        for stop_time in stop_times.iter() {
            let unknown_stop = || ImportWarning::UnknownTripStop {
                trip_id: trip_id.to_string(),
                stop_id: stop_time.stop_id.clone(),
            };
            let node_id = state
                .node_id_by_stop_id
                .get(&stop_time.stop_id)
                .ok_or_else(unknown_stop)?;
            let coordinate = state
                .stop_coordinates
                .get(&stop_time.stop_id)
                .ok_or_else(unknown_stop)?;
            if result.node_ids.last() == Some(node_id) {
                if let Some(previous) = result.stop_times.last_mut() {
                    previous.departure_time = stop_time.departure_time.or(stop_time.arrival_time);
                }
                continue;
            }
            result.node_ids.push(node_id.clone());
            result.stop_times.push(stop_time.clone());
            result.coordinates.push(*coordinate);
        }
        if result.node_ids.len() < 2 {
            return Err(ImportWarning::TripTooShort {
                trip_id: trip_id.to_string(),
            });
        }
        Ok(result)
    }

    /// arrival and departure at each node.
    pub fn times(&self) -> Vec<(u32, u32)> {
        self.stop_times.iter().map(|st| st.times()).collect()
    }
}
