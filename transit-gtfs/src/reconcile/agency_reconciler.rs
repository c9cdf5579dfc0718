use std::collections::HashSet;

use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{Agency, GtfsAgencyData};

use super::id_ops::unique_id;
use super::settle::{settle_saves, PlannedSave, Reconciled};
use crate::import::InternalState;
use crate::prepare::{Disposition, FeedAgency, ImportCandidate};

/// imports the selected agency candidates and records their network ids in
/// the state. agencies merged with ignore are added to the do-not-update set.
pub async fn import_agencies<S: EntityStore<Agency>>(
    store: &S,
    candidates: &[ImportCandidate<FeedAgency>],
    existing: &NetworkCollection<Agency>,
    state: &mut InternalState,
    default_color: &str,
) -> Reconciled<Agency> {
    let mut result = Reconciled::default();
    let mut taken: HashSet<String> = existing.features().map(|a| a.id.clone()).collect();
    let mut saved_feed_ids = vec![];
    let mut saves = vec![];
    for candidate in candidates.iter().filter(|c| c.selected) {
        let feed = &candidate.data;
        let target = candidate
            .disposition
            .target_id()
            .and_then(|id| existing.get_by_id(id));
        match (&candidate.disposition, target) {
            (Disposition::MergeAndIgnore { .. }, Some(agency)) => {
                log::debug!("agency '{}' kept as '{}'", feed.agency_id, agency.id);
                state.do_not_update_agency_ids.insert(agency.id.clone());
                result
                    .by_feed_id
                    .insert(feed.agency_id.clone(), agency.clone());
            }
            (Disposition::MergeAndReplace { .. }, Some(agency)) => {
                log::debug!("agency '{}' merged into '{}'", feed.agency_id, agency.id);
                let mut merged = agency.clone();
                merged.name = feed.name.clone();
                merged.gtfs = Some(gtfs_data(feed));
                saved_feed_ids.push(feed.agency_id.clone());
                saves.push(PlannedSave {
                    entity: merged,
                    replaces: None,
                });
            }
            (Disposition::Replace { .. }, Some(agency)) => {
                log::debug!("agency '{}' replaces '{}'", feed.agency_id, agency.id);
                saved_feed_ids.push(feed.agency_id.clone());
                saves.push(PlannedSave {
                    entity: Agency {
                        id: agency.id.clone(),
                        acronym: agency.acronym.clone(),
                        name: feed.name.clone(),
                        description: None,
                        color: default_color.to_string(),
                        gtfs: Some(gtfs_data(feed)),
                    },
                    replaces: Some(agency.id.clone()),
                });
            }
            (disposition, _) => {
                if let Some(target_id) = disposition.target_id() {
                    log::warn!(
                        "agency '{target_id}' not found, agency '{}' is created",
                        feed.agency_id
                    );
                }
                let id = unique_id(&feed.agency_id, &taken);
                taken.insert(id.clone());
                log::debug!("agency '{}' created as '{id}'", feed.agency_id);
                saved_feed_ids.push(feed.agency_id.clone());
                saves.push(PlannedSave {
                    entity: Agency {
                        id,
                        acronym: feed.agency_id.clone(),
                        name: feed.name.clone(),
                        description: None,
                        color: default_color.to_string(),
                        gtfs: Some(gtfs_data(feed)),
                    },
                    replaces: None,
                });
            }
        }
    }

    let settled = settle_saves(store, saves).await;
    for (feed_id, saved) in saved_feed_ids.into_iter().zip(settled) {
        match saved {
            Ok(agency) => {
                result.by_feed_id.insert(feed_id, agency);
            }
            Err(warning) => result.warnings.push(warning),
        }
    }
    for (feed_id, agency) in result.by_feed_id.iter() {
        state
            .agency_id_by_feed_id
            .insert(feed_id.clone(), agency.id.clone());
        state.imported_agency_ids.insert(agency.id.clone());
    }
    log::info!(
        "imported {} agencies, {} failed",
        result.by_feed_id.len(),
        result.warnings.len()
    );
    result
}

fn gtfs_data(feed: &FeedAgency) -> GtfsAgencyData {
    GtfsAgencyData {
        agency_id: feed.agency_id.clone(),
        url: feed.url.clone(),
        timezone: feed.timezone.clone(),
        lang: feed.lang.clone(),
        phone: feed.phone.clone(),
        fare_url: feed.fare_url.clone(),
        email: feed.email.clone(),
    }
}
