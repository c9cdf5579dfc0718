use std::collections::HashSet;

use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{GtfsRouteData, Line, LineMode};

use super::id_ops::unique_id;
use super::settle::{settle_saves, PlannedSave, Reconciled};
use crate::import::{ImportWarning, InternalState};
use crate::prepare::{Disposition, FeedRoute, ImportCandidate};

/// imports the selected line candidates of imported agencies. existing lines
/// of agencies in the do-not-update set are returned unchanged.
pub async fn import_lines<S: EntityStore<Line>>(
    store: &S,
    candidates: &[ImportCandidate<FeedRoute>],
    existing: &NetworkCollection<Line>,
    state: &mut InternalState,
    default_color: &str,
) -> Reconciled<Line> {
    let mut result = Reconciled::default();
    let mut taken: HashSet<String> = existing.features().map(|l| l.id.clone()).collect();
    let mut saved_route_ids = vec![];
    let mut saves = vec![];
    for candidate in candidates.iter().filter(|c| c.selected) {
        let route = &candidate.data;
        let agency_id = match state.agency_id_by_feed_id.get(&route.agency_id) {
            Some(id) => id.clone(),
            None => {
                let warning = ImportWarning::UnknownAgency {
                    route_id: route.route_id.clone(),
                    agency_id: route.agency_id.clone(),
                };
                log::warn!("{warning}");
                result.warnings.push(warning);
                continue;
            }
        };
        let frozen = state.do_not_update_agency_ids.contains(&agency_id);
        let target = candidate
            .disposition
            .target_id()
            .and_then(|id| existing.get_by_id(id));
        match (&candidate.disposition, target) {
            (Disposition::MergeAndIgnore { .. }, Some(line)) => {
                log::debug!("line '{}' kept as '{}'", route.route_id, line.id);
                result.by_feed_id.insert(route.route_id.clone(), line.clone());
            }
            (_, Some(line)) if frozen => {
                log::debug!(
                    "line '{}' of agency '{agency_id}' not updated",
                    line.id
                );
                result.by_feed_id.insert(route.route_id.clone(), line.clone());
            }
            (Disposition::MergeAndReplace { .. }, Some(line)) => {
                log::debug!("line '{}' merged into '{}'", route.route_id, line.id);
                let mut merged = line.clone();
                merged.mode = LineMode::from_route_type(route.route_type);
                if let Some(color) = &route.color {
                    merged.color = color.clone();
                }
                if route.description.is_some() {
                    merged.description = route.description.clone();
                }
                merged.gtfs = Some(gtfs_data(route));
                saved_route_ids.push(route.route_id.clone());
                saves.push(PlannedSave {
                    entity: merged,
                    replaces: None,
                });
            }
            (Disposition::Replace { .. }, Some(line)) => {
                log::debug!("line '{}' replaces '{}'", route.route_id, line.id);
                let mut replacement =
                    line_from_route(line.id.clone(), agency_id, route, default_color);
                replacement.short_name = line.short_name.clone();
                saved_route_ids.push(route.route_id.clone());
                saves.push(PlannedSave {
                    entity: replacement,
                    replaces: Some(line.id.clone()),
                });
            }
            (disposition, _) => {
                if let Some(target_id) = disposition.target_id() {
                    log::warn!(
                        "line '{target_id}' not found, line '{}' is created",
                        route.route_id
                    );
                }
                let id = unique_id(&route.route_id, &taken);
                taken.insert(id.clone());
                log::debug!("line '{}' created as '{id}'", route.route_id);
                saved_route_ids.push(route.route_id.clone());
                saves.push(PlannedSave {
                    entity: line_from_route(id, agency_id, route, default_color),
                    replaces: None,
                });
            }
        }
    }

    let settled = settle_saves(store, saves).await;
    for (route_id, saved) in saved_route_ids.into_iter().zip(settled) {
        match saved {
            Ok(line) => {
                result.by_feed_id.insert(route_id, line);
            }
            Err(warning) => result.warnings.push(warning),
        }
    }
    for (route_id, line) in result.by_feed_id.iter() {
        state
            .line_id_by_route_id
            .insert(route_id.clone(), line.id.clone());
    }
    log::info!(
        "imported {} lines, {} warnings",
        result.by_feed_id.len(),
        result.warnings.len()
    );
    result
}

fn line_from_route(id: String, agency_id: String, route: &FeedRoute, default_color: &str) -> Line {
    Line {
        id,
        agency_id,
        short_name: route.display_name(),
        long_name: route.long_name.clone(),
        mode: LineMode::from_route_type(route.route_type),
        color: route
            .color
            .clone()
            .unwrap_or_else(|| default_color.to_string()),
        description: route.description.clone(),
        gtfs: Some(gtfs_data(route)),
    }
}

fn gtfs_data(route: &FeedRoute) -> GtfsRouteData {
    GtfsRouteData {
        route_id: route.route_id.clone(),
        route_type: route.route_type,
        text_color: route.text_color.clone(),
        url: route.url.clone(),
        sort_order: route.sort_order,
    }
}

#[cfg(test)]
mod test {
    use transit_core::collection::{MemoryNetworkStore, NetworkCollection};
    use transit_core::model::{Line, LineMode};

    use super::import_lines;
    use crate::import::{ImportWarning, InternalState};
    use crate::prepare::{Disposition, FeedRoute, ImportCandidate};

    fn existing_line() -> Line {
        Line {
            id: String::from("l24"),
            agency_id: String::from("a1"),
            short_name: String::from("24 Express"),
            long_name: Some(String::from("Sherbrooke Express")),
            mode: LineMode::Bus,
            color: String::from("#000000"),
            description: None,
            gtfs: None,
        }
    }

    fn route(route_id: &str, agency_id: &str) -> FeedRoute {
        FeedRoute {
            route_id: route_id.to_string(),
            agency_id: agency_id.to_string(),
            short_name: Some(route_id.to_string()),
            long_name: Some(String::from("Sherbrooke")),
            description: Some(String::from("Sherbrooke")),
            route_type: 0,
            color: Some(String::from("#009EE0")),
            text_color: None,
            url: None,
            sort_order: None,
        }
    }

    fn state() -> InternalState {
        let mut state = InternalState::default();
        state
            .agency_id_by_feed_id
            .insert(String::from("STM"), String::from("a1"));
        state
    }

    fn candidate(route: FeedRoute, disposition: Disposition) -> ImportCandidate<FeedRoute> {
        let mut candidate = ImportCandidate::new(route, vec![]);
        candidate.disposition = disposition;
        candidate
    }

    #[tokio::test]
    async fn test_merge_and_replace_keeps_names() {
        let store = MemoryNetworkStore::default();
        let existing = NetworkCollection::new(vec![existing_line()]);
        let mut state = state();
        let candidates = vec![candidate(
            route("24", "STM"),
            Disposition::MergeAndReplace {
                target_id: String::from("l24"),
            },
        )];
        let result = import_lines(&store, &candidates, &existing, &mut state, "#0086FF").await;
        let merged = &result.by_feed_id["24"];
        assert_eq!(merged.short_name, "24 Express");
        assert_eq!(merged.long_name.as_deref(), Some("Sherbrooke Express"));
        assert_eq!(merged.mode, LineMode::Tram);
        assert_eq!(merged.color, "#009EE0");
        assert_eq!(state.line_id_by_route_id["24"], "l24");
    }

    #[tokio::test]
    async fn test_lines_of_frozen_agency_are_not_updated() {
        let store = MemoryNetworkStore::default();
        let existing = NetworkCollection::new(vec![existing_line()]);
        let mut state = state();
        state.do_not_update_agency_ids.insert(String::from("a1"));
        let candidates = vec![
            candidate(
                route("24", "STM"),
                Disposition::Replace {
                    target_id: String::from("l24"),
                },
            ),
            candidate(route("55", "STM"), Disposition::Create),
        ];
        let result = import_lines(&store, &candidates, &existing, &mut state, "#0086FF").await;
        assert_eq!(result.by_feed_id["24"], existing_line());
        assert_eq!(result.by_feed_id["55"].agency_id, "a1");
        assert_eq!(store.lines.save_count(), 1);
        assert_eq!(store.lines.delete_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_agency() {
        let store = MemoryNetworkStore::default();
        let mut state = state();
        let candidates = vec![candidate(route("9", "OTHER"), Disposition::Create)];
        let result = import_lines(
            &store,
            &candidates,
            &NetworkCollection::default(),
            &mut state,
            "#0086FF",
        )
        .await;
        assert!(result.by_feed_id.is_empty());
        assert_eq!(
            result.warnings,
            vec![ImportWarning::UnknownAgency {
                route_id: String::from("9"),
                agency_id: String::from("OTHER")
            }]
        );
    }
}
