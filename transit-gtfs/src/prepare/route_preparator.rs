use std::collections::HashMap;

use serde::Serialize;
use transit_core::collection::NetworkCollection;
use transit_core::model::Line;

use super::agency_preparator::DEFAULT_AGENCY_ID;
use super::field_ops::{
    field, normalize_color, owned_field, parse_field, parse_required, required_field, RowRef,
};
use super::{ImportCandidate, Preparation};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedRoute {
    pub route_id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    /// route_desc, else the long or short name
    pub description: Option<String>,
    pub route_type: u16,
    /// `#RRGGBB`
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub url: Option<String>,
    pub sort_order: Option<i64>,
}

impl FeedRoute {
    /// name shown for the line: the short name, else the long name, else the id.
    pub fn display_name(&self) -> String {
        self.short_name
            .as_ref()
            .or(self.long_name.as_ref())
            .cloned()
            .unwrap_or_else(|| self.route_id.clone())
    }
}

/// prepares routes as line candidates.
///
/// # Arguments
///
/// * `source` - feed rows
/// * `agency_ids` - network agency id by feed agency id, to match existing lines
/// * `existing` - lines of the network
pub fn prepare_lines(
    source: &dyn RowSource,
    agency_ids: &HashMap<String, String>,
    existing: &NetworkCollection<Line>,
) -> Result<Preparation<ImportCandidate<FeedRoute>>, FeedError> {
    // a route without agency_id belongs to the feed's only agency
    let implicit_agency_id = match agency_ids.keys().collect::<Vec<_>>().as_slice() {
        [only] => (*only).clone(),
        _ => String::from(DEFAULT_AGENCY_ID),
    };
    let mut result = Preparation::default();
    let found = source.read_rows(FeedFile::Routes, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Routes, row_number);
        let parsed = parse_route(&row, &at, &implicit_agency_id);
        match parsed {
            Ok(route) => {
                let existing_ids = matching_lines(existing, agency_ids, &route);
                result.candidates.push(ImportCandidate::new(route, existing_ids));
            }
            Err(warning) => {
                log::warn!("{warning}");
                result.warnings.push(warning);
            }
        }
    })?;
    if !found {
        return Err(FeedError::MissingFile(FeedFile::Routes));
    }
    log::debug!("prepared {} lines", result.candidates.len());
    Ok(result)
}

fn parse_route(
    row: &FeedRow,
    at: &RowRef,
    implicit_agency_id: &str,
) -> Result<FeedRoute, ImportWarning> {
    let route_id = required_field(row, at, "route_id")?.to_string();
    let route_type = parse_required::<u16>(row, at, "route_type")?;
    let sort_order = parse_field::<i64>(row, at, "route_sort_order")?;
    Ok(FeedRoute {
        route_id,
        agency_id: owned_field(row, "agency_id").unwrap_or_else(|| implicit_agency_id.to_string()),
        short_name: owned_field(row, "route_short_name"),
        long_name: owned_field(row, "route_long_name"),
        description: owned_field(row, "route_desc")
            .or_else(|| owned_field(row, "route_long_name"))
            .or_else(|| owned_field(row, "route_short_name")),
        route_type,
        color: field(row, "route_color").and_then(normalize_color),
        text_color: field(row, "route_text_color").and_then(normalize_color),
        url: owned_field(row, "route_url"),
        sort_order,
    })
}

/// lines of the route's network agency with the same route id or short name.
fn matching_lines(
    existing: &NetworkCollection<Line>,
    agency_ids: &HashMap<String, String>,
    route: &FeedRoute,
) -> Vec<String> {
    let agency_id = match agency_ids.get(&route.agency_id) {
        Some(id) => id,
        None => return vec![],
    };
    let short_name = route.display_name();
    existing
        .features()
        .filter(|l| &l.agency_id == agency_id)
        .filter(|l| {
            l.gtfs.as_ref().map(|g| g.route_id.as_str()) == Some(route.route_id.as_str())
                || l.short_name == short_name
        })
        .map(|l| l.id.clone())
        .collect()
}
