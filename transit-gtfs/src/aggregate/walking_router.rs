use geo::Point;
use transit_core::util::geo_utils;

/// computes walking durations over the street network.
#[allow(async_fn_in_trait)]
pub trait WalkingRouter {
    /// walking time in seconds from `origin` to each destination, in order.
    /// None when a destination cannot be reached.
    async fn walking_durations(
        &self,
        origin: &Point<f64>,
        destinations: &[Point<f64>],
    ) -> Result<Vec<Option<f64>>, String>;
}

/// walks in a straight line at a constant speed. used when no street network
/// is available, and as the fallback of other routers.
#[derive(Clone, Debug)]
pub struct BirdDistanceRouter {
    walking_speed_kph: f64,
}

impl BirdDistanceRouter {
    pub fn new(walking_speed_kph: f64) -> Self {
        Self { walking_speed_kph }
    }

    pub fn duration(&self, origin: &Point<f64>, destination: &Point<f64>) -> f64 {
        let meters = geo_utils::haversine_meters(origin, destination);
        geo_utils::walking_time_seconds(meters, self.walking_speed_kph)
    }
}

impl WalkingRouter for BirdDistanceRouter {
    async fn walking_durations(
        &self,
        origin: &Point<f64>,
        destinations: &[Point<f64>],
    ) -> Result<Vec<Option<f64>>, String> {
        Ok(destinations
            .iter()
            .map(|d| Some(self.duration(origin, d)))
            .collect())
    }
}
