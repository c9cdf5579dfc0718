use geo::Point;
use serde::{Deserialize, Serialize};

use super::NetworkEntity;
use crate::util::geo_utils;

/// a spatial cluster of physically co-located stops. paths are sequences of nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub geography: Point<f64>,
    pub color: String,
    pub routing_radius_meters: f64,
    pub default_dwell_time_seconds: u32,
    pub stops: Vec<NodeStop>,
}

/// a raw stop record aggregated into a [`Node`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStop {
    /// feed stop_id
    pub id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub geography: Point<f64>,
}

impl Node {
    /// attaches a stop to this node. when the node already holds stops, its
    /// geography moves to the centroid of all its stops. the routing radius
    /// only ever grows, until it covers every stop.
    ///
    /// # Returns
    ///
    /// true if the node geography or radius changed.
    pub fn attach_stop(&mut self, stop: NodeStop) -> bool {
        let previous_geography = self.geography;
        let previous_radius = self.routing_radius_meters;
        if self.stops.iter().any(|s| s.id == stop.id) {
            return false;
        }
        let had_stops = !self.stops.is_empty();
        self.stops.push(stop);
        if had_stops {
            let points = self.stops.iter().map(|s| s.geography).collect::<Vec<_>>();
            if let Some(centroid) = geo_utils::centroid(&points) {
                self.geography = centroid;
            }
        }
        let farthest = self
            .stops
            .iter()
            .map(|s| geo_utils::haversine_meters(&self.geography, &s.geography))
            .fold(0.0, f64::max);
        self.routing_radius_meters = self.routing_radius_meters.max(farthest.ceil());
        previous_geography != self.geography || previous_radius != self.routing_radius_meters
    }
}

impl NetworkEntity for Node {
    const ENTITY_NAME: &'static str = "node";

    fn id(&self) -> &str {
        &self.id
    }
}
