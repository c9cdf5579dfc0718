use std::collections::HashMap;

use geo::Point;
use serde::Serialize;

use super::field_ops::{owned_field, parse_field, required_field, RowRef};
use super::Preparation;
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

/// a boarding location of the feed. stations and entrances are not stops.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedStop {
    pub stop_id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub point: Point<f64>,
    pub parent_station: Option<String>,
}

struct StopRow {
    stop: FeedStop,
    location_type: u8,
    located: bool,
}

pub fn prepare_stops(source: &dyn RowSource) -> Result<Preparation<FeedStop>, FeedError> {
    let mut warnings: Vec<ImportWarning> = vec![];
    let mut rows: Vec<StopRow> = vec![];
    let found = source.read_rows(FeedFile::Stops, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Stops, row_number);
        match parse_stop_row(&row, &at) {
            Ok(stop) => rows.push(stop),
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;
    if !found {
        return Err(FeedError::MissingFile(FeedFile::Stops));
    }

    let located: HashMap<String, Point<f64>> = rows
        .iter()
        .filter(|r| r.located)
        .map(|r| (r.stop.stop_id.clone(), r.stop.point))
        .collect();
    let mut candidates = vec![];
    for StopRow {
        mut stop,
        location_type,
        located: has_location,
    } in rows.into_iter()
    {
        if location_type != 0 {
            continue;
        }
        if !has_location {
            let parent_point = stop
                .parent_station
                .as_ref()
                .and_then(|parent| located.get(parent));
            match parent_point {
                Some(point) => stop.point = *point,
                None => {
                    log::warn!("stop '{}' has no location", stop.stop_id);
                    warnings.push(ImportWarning::StopWithoutLocation {
                        stop_id: stop.stop_id,
                    });
                    continue;
                }
            }
        }
        candidates.push(stop);
    }
    log::debug!("prepared {} stops", candidates.len());
    Ok(Preparation {
        candidates,
        warnings,
    })
}

fn parse_stop_row(row: &FeedRow, at: &RowRef) -> Result<StopRow, ImportWarning> {
    let stop_id = required_field(row, at, "stop_id")?.to_string();
    let location_type = parse_field::<u8>(row, at, "location_type")?.unwrap_or(0);
    let lat = parse_field::<f64>(row, at, "stop_lat")?;
    let lon = parse_field::<f64>(row, at, "stop_lon")?;
    let point = match (lon, lat) {
        (Some(lon), Some(lat)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(at.invalid("stop_lat", &lat.to_string()));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(at.invalid("stop_lon", &lon.to_string()));
            }
            Some(Point::new(lon, lat))
        }
        _ => None,
    };
    Ok(StopRow {
        stop: FeedStop {
            stop_id,
            code: owned_field(row, "stop_code"),
            name: owned_field(row, "stop_name"),
            description: owned_field(row, "stop_desc"),
            point: point.unwrap_or_else(|| Point::new(0.0, 0.0)),
            parent_station: owned_field(row, "parent_station"),
        },
        location_type,
        located: point.is_some(),
    })
}
