use transit_core::model::{Path, PathSegment};
use transit_core::util::geo_utils;

use super::TripNodes;
use crate::import::LayoverParameters;

/// sets segment travel times, dwell times and the aggregate metrics of a
/// path from the trip times. segment distances must already be set, or None.
pub fn apply_timing(path: &mut Path, trip: &TripNodes, layover: &LayoverParameters) {
    let times = trip.times();
    let node_count = times.len();
    path.segments
        .resize(node_count.saturating_sub(1), PathSegment::default());

    for (segment, pair) in path.segments.iter_mut().zip(times.windows(2)) {
        let (_, departure) = pair[0];
        let (arrival, _) = pair[1];
        segment.travel_time_seconds = Some(arrival.saturating_sub(departure));
    }
    path.dwell_times_seconds = times
        .iter()
        .enumerate()
        .map(|(idx, (arrival, departure))| {
            if idx + 1 == node_count {
                0
            } else {
                departure.saturating_sub(*arrival)
            }
        })
        .collect();

    let travel_time: u32 = path
        .segments
        .iter()
        .filter_map(|s| s.travel_time_seconds)
        .sum();
    // waiting at the origin happens before the trip departs
    let dwell_time: u32 = path.dwell_times_seconds.iter().skip(1).sum();
    let operating_time = travel_time + dwell_time;
    let layover_time = layover_seconds(operating_time, layover);
    let operating_time_with_layover = operating_time + layover_time;
    let total_distance: Option<f64> = path.segments.iter().map(|s| s.distance_meters).sum();

    let data = &mut path.data;
    data.travel_time_without_dwell_seconds = travel_time;
    data.total_dwell_time_seconds = dwell_time;
    data.operating_time_without_layover_seconds = operating_time;
    data.layover_time_seconds = layover_time;
    data.operating_time_with_layover_seconds = operating_time_with_layover;
    data.total_distance_meters = total_distance;
    data.average_speed_without_dwell_mps = speed(total_distance, travel_time);
    data.operating_speed_mps = speed(total_distance, operating_time);
    data.operating_speed_with_layover_mps = speed(total_distance, operating_time_with_layover);
    data.birds_eye_distance_meters = match (trip.coordinates.first(), trip.coordinates.last()) {
        (Some(first), Some(last)) => Some(geo_utils::haversine_meters(first, last)),
        _ => None,
    };
}

/// the override when set, else a ratio of the operating time, never below the minimum.
pub fn layover_seconds(operating_time_seconds: u32, layover: &LayoverParameters) -> u32 {
    match layover.override_minutes {
        Some(minutes) => (minutes * 60.0).max(0.0).ceil() as u32,
        None => (layover.ratio * operating_time_seconds as f64)
            .max(layover.minimum_seconds as f64)
            .ceil() as u32,
    }
}

fn speed(distance_meters: Option<f64>, time_seconds: u32) -> Option<f64> {
    match distance_meters {
        Some(distance) if time_seconds > 0 => Some(distance / time_seconds as f64),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use geo::Point;
    use transit_core::model::{Path, PathDirection, PathSegment};

    use super::{apply_timing, layover_seconds};
    use crate::import::LayoverParameters;
    use crate::path::TripNodes;
    use crate::prepare::FeedStopTime;

    fn trip(times: &[(u32, u32)]) -> TripNodes {
        TripNodes {
            node_ids: (0..times.len()).map(|i| format!("n{i}")).collect(),
            stop_times: times
                .iter()
                .enumerate()
                .map(|(i, (arrival, departure))| FeedStopTime {
                    trip_id: String::from("T1"),
                    stop_id: format!("S{i}"),
                    stop_sequence: i as u32,
                    arrival_time: Some(*arrival),
                    departure_time: Some(*departure),
                    shape_dist_traveled: None,
                    pickup_type: None,
                    drop_off_type: None,
                })
                .collect(),
            coordinates: (0..times.len())
                .map(|i| Point::new(-73.6, 45.5 + 0.01 * i as f64))
                .collect(),
        }
    }

    #[test]
    fn test_layover() {
        let defaults = LayoverParameters::default();
        assert_eq!(layover_seconds(600, &defaults), 180);
        assert_eq!(layover_seconds(3605, &defaults), 361);
        let overridden = LayoverParameters {
            override_minutes: Some(2.5),
            ..Default::default()
        };
        assert_eq!(layover_seconds(3600, &overridden), 150);
    }

    #[test]
    fn test_two_stop_trip() {
        let trip = trip(&[(1000, 1000), (1300, 1320)]);
        let mut path = Path::new(
            String::from("p1"),
            String::from("l1"),
            PathDirection::Outbound,
            trip.node_ids.clone(),
        );
        path.segments = vec![PathSegment {
            start_coordinate_index: Some(0),
            travel_time_seconds: None,
            distance_meters: Some(1500.0),
        }];
        apply_timing(&mut path, &trip, &LayoverParameters::default());
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].travel_time_seconds, Some(300));
        assert_eq!(path.dwell_times_seconds, vec![0, 0]);
        assert!(path.has_consistent_segments());
        assert_eq!(path.data.operating_time_without_layover_seconds, 300);
        assert_eq!(path.data.layover_time_seconds, 180);
        assert_eq!(path.data.operating_speed_mps, Some(5.0));
        assert!((path.data.birds_eye_distance_meters.unwrap() - 1111.95).abs() < 1.0);
    }

    #[test]
    fn test_dwell_and_unknown_distance() {
        let trip = trip(&[(1000, 1000), (1100, 1130), (1200, 1200)]);
        let mut path = Path::new(
            String::from("p1"),
            String::from("l1"),
            PathDirection::Outbound,
            trip.node_ids.clone(),
        );
        apply_timing(&mut path, &trip, &LayoverParameters::default());
        assert_eq!(path.dwell_times_seconds, vec![0, 30, 0]);
        assert_eq!(path.data.travel_time_without_dwell_seconds, 170);
        assert_eq!(path.data.operating_time_without_layover_seconds, 200);
        assert_eq!(path.data.operating_time_with_layover_seconds, 380);
        assert!(path.data.total_distance_meters.is_none());
        assert!(path.data.average_speed_without_dwell_mps.is_none());
        assert!(path.segments.iter().all(|s| s.travel_time_seconds.is_some()));
    }
}
