use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::field_ops::{field, parse_gtfs_time, parse_required, required_field, RowRef};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

/// a trip repeated every `headway_seconds` in `[start_time, end_time)`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedFrequency {
    pub trip_id: String,
    pub start_time: u32,
    pub end_time: u32,
    pub headway_seconds: u32,
    /// 0 frequency-based, 1 schedule-based
    pub exact_times: u8,
}

/// prepares the frequencies of the given trips, grouped by trip id and sorted
/// by start time. frequencies.txt is optional.
pub fn prepare_frequencies(
    source: &dyn RowSource,
    trip_ids: &HashSet<String>,
) -> Result<(HashMap<String, Vec<FeedFrequency>>, Vec<ImportWarning>), FeedError> {
    let mut warnings = vec![];
    let mut by_trip: HashMap<String, Vec<FeedFrequency>> = HashMap::new();
    source.read_rows(FeedFile::Frequencies, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Frequencies, row_number);
        match parse_frequency_row(&row, &at) {
            Ok(frequency) if trip_ids.contains(&frequency.trip_id) => by_trip
                .entry(frequency.trip_id.clone())
                .or_default()
                .push(frequency),
            Ok(_) => {}
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;
    for frequencies in by_trip.values_mut() {
        frequencies.sort_by_key(|f| f.start_time);
    }
    log::debug!("prepared frequencies of {} trips", by_trip.len());
    Ok((by_trip, warnings))
}

fn parse_frequency_row(row: &FeedRow, at: &RowRef) -> Result<FeedFrequency, ImportWarning> {
    let trip_id = required_field(row, at, "trip_id")?.to_string();
    let start_time = parse_required_time(row, at, "start_time")?;
    let end_time = parse_required_time(row, at, "end_time")?;
    if end_time < start_time {
        return Err(at.invalid("end_time", required_field(row, at, "end_time")?));
    }
    let headway = parse_required::<i64>(row, at, "headway_secs")?;
    let headway_seconds =
        u32::try_from(headway).map_err(|_| at.invalid("headway_secs", &headway.to_string()))?;
    let exact_times = match field(row, "exact_times") {
        None | Some("0") => 0,
        Some("1") => 1,
        Some(other) => {
            log::debug!(
                "{} row {}: exact_times '{other}' read as 0",
                at.file,
                at.row
            );
            0
        }
    };
    Ok(FeedFrequency {
        trip_id,
        start_time,
        end_time,
        headway_seconds,
        exact_times,
    })
}

fn parse_required_time(row: &FeedRow, at: &RowRef, name: &str) -> Result<u32, ImportWarning> {
    let value = required_field(row, at, name)?;
    parse_gtfs_time(value).ok_or_else(|| at.invalid(name, value))
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::prepare_frequencies;
    use crate::feed::{FeedFile, InMemoryRowSource};

    fn trip_ids() -> HashSet<String> {
        (1..=10).map(|i| format!("T{i}")).collect()
    }

    #[test]
    fn test_malformed_rows_dropped_one_for_one() {
        let frequencies = "trip_id,start_time,end_time,headway_secs,exact_times\n\
            T1,06:00:00,09:00:00,-5,0\n\
            ,06:00:00,09:00:00,600,0\n\
            T3,,09:00:00,600,0\n\
            T4,06:75:00,09:00:00,600,0\n\
            T5,06:00:00,,600,0\n\
            T6,06:00:00,09:00:00,often,0\n\
            T7,06:00:00,09:00:00,,0\n\
            T8,09:00:00,06:00:00,600,0\n\
            T9,06:00:00,09:00:00,600,10\n\
            T10,06:00:00,09:00:00,900,-1\n";
        let source = InMemoryRowSource::new().with_file(FeedFile::Frequencies, frequencies);
        let (by_trip, warnings) = prepare_frequencies(&source, &trip_ids()).unwrap();
        assert_eq!(by_trip.values().map(|f| f.len()).sum::<usize>(), 2);
        assert_eq!(warnings.len(), 8);
        assert_eq!(by_trip["T9"][0].exact_times, 0);
        assert_eq!(by_trip["T10"][0].exact_times, 0);
    }

    #[test]
    fn test_negative_headway_and_invalid_exact_times() {
        let frequencies = "trip_id,start_time,end_time,headway_secs,exact_times\n\
            T1,06:00:00,09:00:00,-5,0\n\
            T2,06:00:00,09:00:00,300,10\n";
        let source = InMemoryRowSource::new().with_file(FeedFile::Frequencies, frequencies);
        let (by_trip, warnings) = prepare_frequencies(&source, &trip_ids()).unwrap();
        assert_eq!(by_trip.len(), 1);
        assert_eq!(warnings.len(), 1);
        let accepted = &by_trip["T2"];
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].exact_times, 0);
        assert_eq!(accepted[0].headway_seconds, 300);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let source = InMemoryRowSource::new();
        let (by_trip, warnings) = prepare_frequencies(&source, &trip_ids()).unwrap();
        assert!(by_trip.is_empty());
        assert!(warnings.is_empty());
    }
}
