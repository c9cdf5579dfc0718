use std::collections::{BTreeMap, HashMap};

use transit_core::collection::{EntityStore, NetworkCollection};
use transit_core::model::{Line, Schedule, SchedulePeriod, ScheduleTrip, Service};

use super::{schedule_trips, ScheduleGenerator};
use crate::import::{ImportError, ImportWarning, InternalState};
use crate::path::TripNodes;
use crate::reconcile::{settle_saves, PlannedSave};

/// builds one schedule per imported (line, service) pair from the imported
/// trips, and records the scheduled lines of each service.
pub struct ScheduleImporter<'a, S> {
    store: &'a S,
}

impl<'a, S> ScheduleImporter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S> ScheduleGenerator for ScheduleImporter<'_, S>
where
    S: EntityStore<Schedule> + EntityStore<Line> + EntityStore<Service>,
{
    async fn generate_schedules(
        &self,
        state: &InternalState,
    ) -> Result<Vec<ImportWarning>, ImportError> {
        let period_group = state.period_group.as_ref().ok_or_else(|| {
            ImportError::MissingPrerequisite(String::from("no period group to split schedules"))
        })?;
        let mut existing: NetworkCollection<Schedule> = NetworkCollection::default();
        existing.load_from_server(self.store).await?;
        let mut lines: NetworkCollection<Line> = NetworkCollection::default();
        lines.load_from_server(self.store).await?;
        let mut services: NetworkCollection<Service> = NetworkCollection::default();
        services.load_from_server(self.store).await?;

        let mut warnings = vec![];
        let mut trips_by_pair: BTreeMap<(String, String), Vec<ScheduleTrip>> = BTreeMap::new();
        for trip in state.trips_to_import.iter() {
            let (line_id, service_id) = match (
                state.line_id_by_route_id.get(&trip.route_id),
                state.service_id_by_feed_id.get(&trip.service_id),
            ) {
                (Some(line_id), Some(service_id)) => (line_id, service_id),
                _ => continue,
            };
            let path_id = match state.path_id_by_trip_id.get(&trip.trip_id) {
                Some(path_id) => path_id,
                None => {
                    warnings.push(ImportWarning::TripWithoutPath {
                        trip_id: trip.trip_id.clone(),
                    });
                    continue;
                }
            };
            let nodes = match TripNodes::from_state(&trip.trip_id, state) {
                Ok(nodes) => nodes,
                Err(warning) => {
                    warnings.push(warning);
                    continue;
                }
            };
            let frequencies = state
                .frequencies_by_trip_id
                .get(&trip.trip_id)
                .map(|f| f.as_slice());
            trips_by_pair
                .entry((line_id.clone(), service_id.clone()))
                .or_default()
                .extend(schedule_trips(&trip.trip_id, path_id, &nodes, frequencies));
        }

        let existing_by_pair: HashMap<(&str, &str), &Schedule> = existing
            .features()
            .map(|s| ((s.line_id.as_str(), s.service_id.as_str()), s))
            .collect();
        let mut saves = vec![];
        for ((line_id, service_id), trips) in trips_by_pair.into_iter() {
            let previous = existing_by_pair.get(&(line_id.as_str(), service_id.as_str()));
            let frozen = lines
                .get_by_id(&line_id)
                .map(|l| state.do_not_update_agency_ids.contains(&l.agency_id))
                .unwrap_or(false);
            if let (Some(previous), true) = (previous, frozen) {
                log::debug!(
                    "schedule '{}' of line '{line_id}' not updated",
                    previous.id
                );
                continue;
            }
            let mut periods: Vec<SchedulePeriod> = period_group
                .periods
                .iter()
                .map(|p| SchedulePeriod {
                    shortname: p.shortname.clone(),
                    start_hour: p.start_hour,
                    end_hour: p.end_hour,
                    trips: vec![],
                })
                .collect();
            for trip in trips.into_iter() {
                let period_index = period_group
                    .period_for(trip.departure_time_seconds)
                    .and_then(|p| periods.iter().position(|sp| sp.shortname == p.shortname));
                match period_index {
                    Some(index) => periods[index].trips.push(trip),
                    None => warnings.push(ImportWarning::DepartureOutsidePeriods {
                        trip_id: trip.gtfs_trip_id.clone(),
                        departure_time_seconds: trip.departure_time_seconds,
                    }),
                }
            }
            for period in periods.iter_mut() {
                period.trips.sort_by_key(|t| t.departure_time_seconds);
            }
            let id = previous
                .map(|s| s.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            saves.push(PlannedSave {
                entity: Schedule {
                    id,
                    line_id,
                    service_id,
                    period_group: period_group.shortname.clone(),
                    periods,
                },
                replaces: None,
            });
        }

        let mut scheduled_services: BTreeMap<String, Service> = BTreeMap::new();
        let mut saved = 0;
        for settled in settle_saves(self.store, saves).await.into_iter() {
            match settled {
                Ok(schedule) => {
                    saved += 1;
                    if !scheduled_services.contains_key(&schedule.service_id) {
                        if let Some(service) = services.get_by_id(&schedule.service_id) {
                            scheduled_services.insert(service.id.clone(), service.clone());
                        }
                    }
                    if let Some(service) = scheduled_services.get_mut(&schedule.service_id) {
                        service.scheduled_line_ids.insert(schedule.line_id.clone());
                    }
                }
                Err(warning) => warnings.push(warning),
            }
        }
        let service_saves = scheduled_services
            .into_values()
            .filter(|s| services.get_by_id(&s.id) != Some(s))
            .map(|entity| PlannedSave {
                entity,
                replaces: None,
            })
            .collect::<Vec<_>>();
        for settled in settle_saves(self.store, service_saves).await.into_iter() {
            if let Err(warning) = settled {
                warnings.push(warning);
            }
        }
        for warning in warnings.iter() {
            log::warn!("{warning}");
        }
        log::info!("{saved} schedules saved");
        Ok(warnings)
    }
}
