use std::collections::HashMap;

use serde::Serialize;

use super::field_ops::{owned_field, parse_field, required_field, RowRef};
use super::Preparation;
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedTrip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub direction_id: Option<u8>,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub block_id: Option<String>,
}

/// prepares the trips to import: those whose route and service were imported.
///
/// # Arguments
///
/// * `line_ids` - network line id by feed route id
/// * `service_ids` - network service id by feed service id
pub fn prepare_trips(
    source: &dyn RowSource,
    line_ids: &HashMap<String, String>,
    service_ids: &HashMap<String, String>,
) -> Result<Preparation<FeedTrip>, FeedError> {
    let mut result = Preparation::default();
    let mut skipped = 0;
    let found = source.read_rows(FeedFile::Trips, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Trips, row_number);
        match parse_trip_row(&row, &at) {
            Ok(trip)
                if line_ids.contains_key(&trip.route_id)
                    && service_ids.contains_key(&trip.service_id) =>
            {
                result.candidates.push(trip)
            }
            Ok(_) => skipped += 1,
            Err(warning) => {
                log::warn!("{warning}");
                result.warnings.push(warning);
            }
        }
    })?;
    if !found {
        return Err(FeedError::MissingFile(FeedFile::Trips));
    }
    log::debug!(
        "prepared {} trips, {skipped} trips of routes or services not imported",
        result.candidates.len()
    );
    Ok(result)
}

fn parse_trip_row(row: &FeedRow, at: &RowRef) -> Result<FeedTrip, ImportWarning> {
    Ok(FeedTrip {
        trip_id: required_field(row, at, "trip_id")?.to_string(),
        route_id: required_field(row, at, "route_id")?.to_string(),
        service_id: required_field(row, at, "service_id")?.to_string(),
        shape_id: owned_field(row, "shape_id"),
        direction_id: parse_field::<u8>(row, at, "direction_id")?,
        headsign: owned_field(row, "trip_headsign"),
        short_name: owned_field(row, "trip_short_name"),
        block_id: owned_field(row, "block_id"),
    })
}
