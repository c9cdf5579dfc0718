use transit_core::model::ScheduleTrip;

use crate::path::TripNodes;
use crate::prepare::FeedFrequency;

/// departure times of a trip at its first stop. a trip with frequencies
/// departs every headway in `[start_time, end_time)` of each frequency, or
/// once at `start_time` when the headway is zero.
pub fn departure_times(first_departure: u32, frequencies: Option<&[FeedFrequency]>) -> Vec<u32> {
    let frequencies = match frequencies {
        Some(f) if !f.is_empty() => f,
        _ => return vec![first_departure],
    };
    let mut departures = vec![];
    for frequency in frequencies.iter() {
        if frequency.headway_seconds == 0 {
            departures.push(frequency.start_time);
            continue;
        }
        departures.extend(
            (frequency.start_time..frequency.end_time).step_by(frequency.headway_seconds as usize),
        );
    }
    departures.sort_unstable();
    departures.dedup();
    departures
}

/// the scheduled runs of one feed trip over its path, one per departure.
pub fn schedule_trips(
    trip_id: &str,
    path_id: &str,
    nodes: &TripNodes,
    frequencies: Option<&[FeedFrequency]>,
) -> Vec<ScheduleTrip> {
    let times = nodes.times();
    let first_departure = times.first().map(|(_, d)| *d).unwrap_or_default();
    departure_times(first_departure, frequencies)
        .into_iter()
        .map(|departure| {
            let shift = i64::from(departure) - i64::from(first_departure);
            let shifted = |t: u32| (i64::from(t) + shift).max(0) as u32;
            let arrivals = times.iter().map(|(a, _)| shifted(*a)).collect::<Vec<_>>();
            let departures = times.iter().map(|(_, d)| shifted(*d)).collect::<Vec<_>>();
            ScheduleTrip {
                id: uuid::Uuid::new_v4().to_string(),
                path_id: path_id.to_string(),
                gtfs_trip_id: trip_id.to_string(),
                departure_time_seconds: departures.first().copied().unwrap_or(departure),
                arrival_time_seconds: arrivals.last().copied().unwrap_or(departure),
                node_arrival_times_seconds: arrivals,
                node_departure_times_seconds: departures,
            }
        })
        .collect()
}
