use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::field_ops::{parse_field, parse_required, parse_time_field, required_field, RowRef};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedStopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    /// seconds since the start of the service day
    pub arrival_time: Option<u32>,
    pub departure_time: Option<u32>,
    pub shape_dist_traveled: Option<f64>,
    pub pickup_type: Option<u8>,
    pub drop_off_type: Option<u8>,
}

impl FeedStopTime {
    /// arrival and departure, once times are interpolated.
    pub fn times(&self) -> (u32, u32) {
        let arrival = self.arrival_time.or(self.departure_time).unwrap_or_default();
        let departure = self.departure_time.unwrap_or(arrival);
        (arrival, departure)
    }
}

/// prepares the stop times of the given trips, grouped by trip id and sorted by
/// stop sequence, with every missing time interpolated. trips without a time
/// on their first or last stop are dropped.
pub fn prepare_stop_times(
    source: &dyn RowSource,
    trip_ids: &HashSet<String>,
) -> Result<(HashMap<String, Vec<FeedStopTime>>, Vec<ImportWarning>), FeedError> {
    let mut warnings = vec![];
    let mut by_trip: HashMap<String, Vec<FeedStopTime>> = HashMap::new();
    let found = source.read_rows(FeedFile::StopTimes, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::StopTimes, row_number);
        match parse_stop_time_row(&row, &at) {
            Ok(stop_time) if trip_ids.contains(&stop_time.trip_id) => by_trip
                .entry(stop_time.trip_id.clone())
                .or_default()
                .push(stop_time),
            Ok(_) => {}
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;
    if !found {
        return Err(FeedError::MissingFile(FeedFile::StopTimes));
    }

    let mut invalid_trips = vec![];
    for (trip_id, stop_times) in by_trip.iter_mut() {
        stop_times.sort_by_key(|st| st.stop_sequence);
        if !interpolate_stop_times(stop_times) {
            invalid_trips.push(trip_id.clone());
        }
    }
    invalid_trips.sort();
    for trip_id in invalid_trips.into_iter() {
        log::warn!("trip '{trip_id}' has no time on its first or last stop");
        by_trip.remove(&trip_id);
        warnings.push(ImportWarning::TripWithoutTerminalTimes { trip_id });
    }
    log::debug!("prepared stop times of {} trips", by_trip.len());
    Ok((by_trip, warnings))
}

fn parse_stop_time_row(row: &FeedRow, at: &RowRef) -> Result<FeedStopTime, ImportWarning> {
    let trip_id = required_field(row, at, "trip_id")?.to_string();
    let stop_id = required_field(row, at, "stop_id")?.to_string();
    let sequence = parse_required::<i64>(row, at, "stop_sequence")?;
    let stop_sequence =
        u32::try_from(sequence).map_err(|_| at.invalid("stop_sequence", &sequence.to_string()))?;
    let shape_dist_traveled = parse_field::<f64>(row, at, "shape_dist_traveled")?;
    if let Some(dist) = shape_dist_traveled.filter(|d| *d < 0.0) {
        return Err(at.invalid("shape_dist_traveled", &dist.to_string()));
    }
    Ok(FeedStopTime {
        trip_id,
        stop_id,
        stop_sequence,
        arrival_time: parse_time_field(row, at, "arrival_time")?,
        departure_time: parse_time_field(row, at, "departure_time")?,
        shape_dist_traveled,
        pickup_type: parse_field::<u8>(row, at, "pickup_type")?,
        drop_off_type: parse_field::<u8>(row, at, "drop_off_type")?,
    })
}

/// fills missing times of a trip sorted by stop sequence. arrival and
/// departure stand in for each other, then every gap between two timed stops
/// advances by `ceil(delta / hops)` per stop, never past the next timed stop.
///
/// # Returns
///
/// false if the first or last stop has no time. the trip is left as is.
pub fn interpolate_stop_times(stop_times: &mut [FeedStopTime]) -> bool {
    for st in stop_times.iter_mut() {
        if st.arrival_time.is_none() {
            st.arrival_time = st.departure_time;
        }
        if st.departure_time.is_none() {
            st.departure_time = st.arrival_time;
        }
    }
    let timed = stop_times
        .iter()
        .enumerate()
        .filter(|(_, st)| st.arrival_time.is_some())
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();
    match (timed.first(), timed.last()) {
        (Some(0), Some(last)) if *last == stop_times.len() - 1 => {}
        _ => return false,
    }
    for pair in timed.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let hops = (to - from) as u32;
        if hops < 2 {
            continue;
        }
        let (_, start) = stop_times[from].times();
        let (end, _) = stop_times[to].times();
        let delta = end.saturating_sub(start);
        let step = delta.div_ceil(hops);
        for (offset, st) in stop_times[from + 1..to].iter_mut().enumerate() {
            let time = (start + step * (offset as u32 + 1)).min(end);
            st.arrival_time = Some(time);
            st.departure_time = Some(time);
        }
    }
    true
}
