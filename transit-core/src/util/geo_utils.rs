use geo::{Centroid, Coord, Distance, Haversine, MultiPoint, Point};
use uom::si::f64::{Length, Time, Velocity};

/// great-circle distance in meters between two lon,lat points.
pub fn haversine_meters(a: &Point<f64>, b: &Point<f64>) -> f64 {
    Haversine.distance(*a, *b)
}

/// great-circle distance in meters between two lon,lat coordinates.
pub fn coord_distance_meters(a: &Coord<f64>, b: &Coord<f64>) -> f64 {
    Haversine.distance(Point::from(*a), Point::from(*b))
}

/// centroid of a set of points, None when the set is empty.
pub fn centroid(points: &[Point<f64>]) -> Option<Point<f64>> {
    MultiPoint::from(points.to_vec()).centroid()
}

/// distance covered walking for `radius_seconds` at `walking_speed_kph`.
pub fn walking_radius_meters(radius_seconds: u32, walking_speed_kph: f64) -> f64 {
    let speed = Velocity::new::<uom::si::velocity::kilometer_per_hour>(walking_speed_kph);
    let time = Time::new::<uom::si::time::second>(radius_seconds as f64);
    let distance: Length = speed * time;
    distance.get::<uom::si::length::meter>()
}

/// walking time in seconds to cover `distance_meters` at `walking_speed_kph`.
pub fn walking_time_seconds(distance_meters: f64, walking_speed_kph: f64) -> f64 {
    let speed = Velocity::new::<uom::si::velocity::kilometer_per_hour>(walking_speed_kph);
    let distance = Length::new::<uom::si::length::meter>(distance_meters);
    let time: Time = distance / speed;
    time.get::<uom::si::time::second>()
}
