use std::collections::HashMap;
use std::path::Path;

use serde_json::json;
use transit_core::collection::{NetworkCollection, NetworkSnapshot};

use super::AppError;
use crate::feed::{CsvDirectorySource, FeedError, RowSource};
use crate::prepare::{prepare_agencies, prepare_lines, prepare_services};

/// the agency, line and service candidates of a feed against a network, as
/// JSON. lines are matched as if every agency kept its default disposition.
pub fn prepare_candidates(
    source: &dyn RowSource,
    snapshot: NetworkSnapshot,
) -> Result<serde_json::Value, FeedError> {
    let agencies = NetworkCollection::new(snapshot.agencies);
    let lines = NetworkCollection::new(snapshot.lines);
    let services = NetworkCollection::new(snapshot.services);

    let prepared_agencies = prepare_agencies(source, &agencies)?;
    let agency_ids: HashMap<String, String> = prepared_agencies
        .candidates
        .iter()
        .map(|c| {
            let network_id = c.disposition.target_id().unwrap_or(&c.data.agency_id);
            (c.data.agency_id.clone(), network_id.to_string())
        })
        .collect();
    let prepared_lines = prepare_lines(source, &agency_ids, &lines)?;
    let prepared_services = prepare_services(source, &services, false)?;

    let warnings = prepared_agencies
        .warnings
        .iter()
        .chain(prepared_lines.warnings.iter())
        .chain(prepared_services.warnings.iter())
        .map(|w| w.to_string())
        .collect::<Vec<_>>();
    Ok(json!({
        "agencies": prepared_agencies.candidates,
        "lines": prepared_lines.candidates,
        "services": prepared_services.candidates,
        "warnings": warnings,
    }))
}

pub fn run(feed_directory: &Path, network_file: Option<&Path>) -> Result<(), AppError> {
    let snapshot = match network_file {
        Some(path) => NetworkSnapshot::read_json(path)?,
        None => NetworkSnapshot::default(),
    };
    let source = CsvDirectorySource::new(feed_directory.to_path_buf());
    let candidates = prepare_candidates(&source, snapshot)?;
    let output =
        serde_json::to_string_pretty(&candidates).map_err(|e| AppError::Output(e.to_string()))?;
    println!("{output}");
    Ok(())
}
