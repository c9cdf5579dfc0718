use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{Line, Service};

use super::id_ops::unique_id;
use super::settle::{settle_saves, PlannedSave, Reconciled};
use crate::import::InternalState;
use crate::prepare::{Disposition, FeedService, ImportCandidate};

/// imports the selected service candidates. a candidate only lands on an
/// existing service running on the same days, and only if that service is
/// unused or already serves an agency of this import. otherwise a new service
/// is created.
pub async fn import_services<S: EntityStore<Service>>(
    store: &S,
    candidates: &[ImportCandidate<FeedService>],
    existing: &NetworkCollection<Service>,
    lines: &NetworkCollection<Line>,
    state: &mut InternalState,
) -> Reconciled<Service> {
    let mut result = Reconciled::default();
    let mut taken: HashSet<String> = existing.features().map(|s| s.id.clone()).collect();
    let mut saved_names = vec![];
    let mut saves = vec![];
    let imported = &state.imported_agency_ids;
    let frozen_agencies = &state.do_not_update_agency_ids;
    for candidate in candidates.iter().filter(|c| c.selected) {
        let feed = &candidate.data;
        let target = candidate
            .disposition
            .target_id()
            .and_then(|id| existing.get_by_id(id))
            .filter(|s| s.has_same_days(&feed.weekdays, &feed.start_date, &feed.end_date))
            .filter(|s| can_share(s, lines, imported));
        let frozen = target
            .map(|s| is_frozen(s, lines, frozen_agencies))
            .unwrap_or(false);
        match (&candidate.disposition, target) {
            (Disposition::MergeAndIgnore { .. }, Some(service)) => {
                log::debug!("service '{}' kept as '{}'", feed.name, service.id);
                result.by_feed_id.insert(feed.name.clone(), service.clone());
            }
            (_, Some(service)) if frozen => {
                log::debug!("service '{}' only serves frozen agencies", service.id);
                result.by_feed_id.insert(feed.name.clone(), service.clone());
            }
            (Disposition::MergeAndReplace { .. }, Some(service)) => {
                log::debug!("service '{}' merged into '{}'", feed.name, service.id);
                let mut merged = service.clone();
                if feed.description.is_some() {
                    merged.description = feed.description.clone();
                }
                merged.only_dates = feed.only_dates.clone();
                merged.except_dates = feed.except_dates.clone();
                merged.gtfs_service_ids = merged
                    .gtfs_service_ids
                    .iter()
                    .chain(feed.feed_service_ids.iter())
                    .unique()
                    .cloned()
                    .collect();
                saved_names.push(feed.name.clone());
                saves.push(PlannedSave {
                    entity: merged,
                    replaces: None,
                });
            }
            (Disposition::Replace { .. }, Some(service)) => {
                log::debug!("service '{}' replaces '{}'", feed.name, service.id);
                let mut replacement = service_from_feed(service.id.clone(), feed);
                replacement.name = service.name.clone();
                replacement.scheduled_line_ids = service.scheduled_line_ids.clone();
                saved_names.push(feed.name.clone());
                saves.push(PlannedSave {
                    entity: replacement,
                    replaces: Some(service.id.clone()),
                });
            }
            (disposition, _) => {
                if let Some(target_id) = disposition.target_id() {
                    log::debug!(
                        "service '{target_id}' cannot receive '{}', a new service is created",
                        feed.name
                    );
                }
                let id = unique_id(&feed.name, &taken);
                taken.insert(id.clone());
                saved_names.push(feed.name.clone());
                saves.push(PlannedSave {
                    entity: service_from_feed(id, feed),
                    replaces: None,
                });
            }
        }
    }

    let settled = settle_saves(store, saves).await;
    for (name, saved) in saved_names.into_iter().zip(settled) {
        match saved {
            Ok(service) => {
                result.by_feed_id.insert(name, service);
            }
            Err(warning) => result.warnings.push(warning),
        }
    }
    for candidate in candidates.iter() {
        if let Some(service) = result.by_feed_id.get(&candidate.data.name) {
            for feed_service_id in candidate.data.feed_service_ids.iter() {
                state
                    .service_id_by_feed_id
                    .insert(feed_service_id.clone(), service.id.clone());
            }
        }
    }
    log::info!(
        "imported {} services, {} failed",
        result.by_feed_id.len(),
        result.warnings.len()
    );
    result
}

/// agencies whose lines are scheduled with this service.
fn served_agency_ids(service: &Service, lines: &NetworkCollection<Line>) -> BTreeSet<String> {
    service
        .scheduled_line_ids
        .iter()
        .filter_map(|line_id| lines.get_by_id(line_id))
        .map(|line| line.agency_id.clone())
        .collect()
}

fn can_share(
    service: &Service,
    lines: &NetworkCollection<Line>,
    imported_agency_ids: &HashSet<String>,
) -> bool {
    let served = served_agency_ids(service, lines);
    served.is_empty() || served.iter().any(|a| imported_agency_ids.contains(a))
}

fn is_frozen(
    service: &Service,
    lines: &NetworkCollection<Line>,
    frozen_agency_ids: &HashSet<String>,
) -> bool {
    let served = served_agency_ids(service, lines);
    !served.is_empty() && served.iter().all(|a| frozen_agency_ids.contains(a))
}

fn service_from_feed(id: String, feed: &FeedService) -> Service {
    Service {
        id,
        name: feed.name.clone(),
        description: feed.description.clone(),
        color: None,
        weekdays: feed.weekdays,
        start_date: feed.start_date,
        end_date: feed.end_date,
        only_dates: feed.only_dates.clone(),
        except_dates: feed.except_dates.clone(),
        scheduled_line_ids: BTreeSet::new(),
        gtfs_service_ids: feed.feed_service_ids.clone(),
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use transit_core::collection::{MemoryNetworkStore, NetworkCollection};
    use transit_core::model::{Line, LineMode, Service};

    use super::import_services;
    use crate::import::InternalState;
    use crate::prepare::{Disposition, FeedService, ImportCandidate};

    const WEEKDAYS: [bool; 7] = [true, true, true, true, true, false, false];

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn existing_service(line_ids: &[&str]) -> Service {
        Service {
            id: String::from("s1"),
            name: String::from("Weekdays"),
            description: None,
            color: None,
            weekdays: WEEKDAYS,
            start_date: date(1, 1),
            end_date: date(6, 30),
            only_dates: vec![],
            except_dates: vec![],
            scheduled_line_ids: line_ids.iter().map(|id| id.to_string()).collect::<BTreeSet<_>>(),
            gtfs_service_ids: vec![],
        }
    }

    fn line(id: &str, agency_id: &str) -> Line {
        Line {
            id: id.to_string(),
            agency_id: agency_id.to_string(),
            short_name: id.to_string(),
            long_name: None,
            mode: LineMode::Bus,
            color: String::from("#000000"),
            description: None,
            gtfs: None,
        }
    }

    fn feed_service(end_date: NaiveDate) -> FeedService {
        FeedService {
            name: String::from("WK"),
            feed_service_ids: vec![String::from("WK")],
            description: None,
            weekdays: WEEKDAYS,
            start_date: date(1, 1),
            end_date,
            only_dates: vec![],
            except_dates: vec![date(1, 1)],
        }
    }

    fn candidate(feed: FeedService) -> ImportCandidate<FeedService> {
        let mut candidate = ImportCandidate::new(feed, vec![String::from("s1")]);
        candidate.disposition = Disposition::MergeAndReplace {
            target_id: String::from("s1"),
        };
        candidate
    }

    fn state() -> InternalState {
        let mut state = InternalState::default();
        state.imported_agency_ids.insert(String::from("a1"));
        state
    }

    #[tokio::test]
    async fn test_merges_into_service_of_imported_agency() {
        let store = MemoryNetworkStore::default();
        let existing = NetworkCollection::new(vec![existing_service(&["l1"])]);
        let lines = NetworkCollection::new(vec![line("l1", "a1")]);
        let mut state = state();
        let candidates = vec![candidate(feed_service(date(6, 30)))];
        let result = import_services(&store, &candidates, &existing, &lines, &mut state).await;
        let merged = &result.by_feed_id["WK"];
        assert_eq!(merged.id, "s1");
        assert_eq!(merged.name, "Weekdays");
        assert_eq!(merged.except_dates, vec![date(1, 1)]);
        assert_eq!(state.service_id_by_feed_id["WK"], "s1");
    }

    #[tokio::test]
    async fn test_service_of_other_agency_is_not_shared() {
        let store = MemoryNetworkStore::default();
        let existing = NetworkCollection::new(vec![existing_service(&["l9"])]);
        let lines = NetworkCollection::new(vec![line("l9", "other")]);
        let mut state = state();
        let candidates = vec![candidate(feed_service(date(6, 30)))];
        let result = import_services(&store, &candidates, &existing, &lines, &mut state).await;
        let created = &result.by_feed_id["WK"];
        assert_eq!(created.id, "WK");
        assert!(created.scheduled_line_ids.is_empty());
        assert_eq!(store.services.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_different_days_create_a_new_service() {
        let store = MemoryNetworkStore::default();
        let existing = NetworkCollection::new(vec![existing_service(&[])]);
        let mut state = state();
        let candidates = vec![candidate(feed_service(date(5, 31)))];
        let result = import_services(
            &store,
            &candidates,
            &existing,
            &NetworkCollection::default(),
            &mut state,
        )
        .await;
        assert_eq!(result.by_feed_id["WK"].id, "WK");
        assert_eq!(result.by_feed_id["WK"].end_date, date(5, 31));
    }
}
