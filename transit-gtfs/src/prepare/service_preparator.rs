use std::collections::BTreeSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use transit_core::collection::NetworkCollection;
use transit_core::model::Service;

use super::field_ops::{parse_date_field, required_field, RowRef};
use super::{ImportCandidate, Preparation};
use crate::feed::{FeedError, FeedFile, FeedRow, RowSource};
use crate::import::ImportWarning;

const WEEKDAY_FIELDS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// one or more feed services with the same operating days.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedService {
    /// the feed service id, or the merged ids joined by `+`
    pub name: String,
    pub feed_service_ids: Vec<String>,
    pub description: Option<String>,
    /// monday first
    pub weekdays: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub only_dates: Vec<NaiveDate>,
    pub except_dates: Vec<NaiveDate>,
}

impl FeedService {
    fn new(service_id: String, weekdays: [bool; 7], start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: service_id.clone(),
            feed_service_ids: vec![service_id],
            description: None,
            weekdays,
            start_date: start,
            end_date: end,
            only_dates: vec![],
            except_dates: vec![],
        }
    }
}

/// existing services with this name or feed id, running on exactly the same days.
pub fn matching_services(existing: &NetworkCollection<Service>, service: &FeedService) -> Vec<String> {
    existing
        .features()
        .filter(|s| {
            s.name == service.name
                || s
                    .gtfs_service_ids
                    .iter()
                    .any(|id| service.feed_service_ids.contains(id))
        })
        .filter(|s| s.has_same_days(&service.weekdays, &service.start_date, &service.end_date))
        .map(|s| s.id.clone())
        .collect()
}

/// prepares calendar.txt and calendar_dates.txt services. at least one of the
/// two files is required.
pub fn prepare_services(
    source: &dyn RowSource,
    existing: &NetworkCollection<Service>,
    merge_same_days: bool,
) -> Result<Preparation<ImportCandidate<FeedService>>, FeedError> {
    let mut warnings: Vec<ImportWarning> = vec![];
    let mut services: IndexMap<String, FeedService> = IndexMap::new();

    let has_calendar = source.read_rows(FeedFile::Calendar, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::Calendar, row_number);
        let parsed = parse_calendar_row(&row, &at).and_then(|service| {
            match services.contains_key(&service.name) {
                true => Err(at.invalid("service_id", &service.name)),
                false => Ok(service),
            }
        });
        match parsed {
            Ok(service) => {
                services.insert(service.name.clone(), service);
            }
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;

    // services only defined by their dates, bounds computed once all dates are read
    let mut dates_only: BTreeSet<String> = BTreeSet::new();
    let has_calendar_dates = source.read_rows(FeedFile::CalendarDates, &mut |row, row_number| {
        let at = RowRef::new(FeedFile::CalendarDates, row_number);
        match parse_calendar_date_row(&row, &at) {
            Ok((service_id, date, added)) => {
                let service = services.entry(service_id.clone()).or_insert_with(|| {
                    dates_only.insert(service_id.clone());
                    FeedService::new(service_id, [false; 7], date, date)
                });
                if added {
                    service.only_dates.push(date);
                } else {
                    service.except_dates.push(date);
                }
            }
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
            }
        }
    })?;
    if !has_calendar && !has_calendar_dates {
        return Err(FeedError::MissingFile(FeedFile::Calendar));
    }

    let mut prepared = vec![];
    for (service_id, mut service) in services.into_iter() {
        service.only_dates = service.only_dates.into_iter().sorted().dedup().collect();
        service.except_dates = service.except_dates.into_iter().sorted().dedup().collect();
        if dates_only.contains(&service_id) {
            match (service.only_dates.first(), service.only_dates.last()) {
                (Some(first), Some(last)) => {
                    service.start_date = *first;
                    service.end_date = *last;
                }
                _ => {
                    log::warn!("service '{service_id}' has no operating day");
                    warnings.push(ImportWarning::ServiceWithoutDates { service_id });
                    continue;
                }
            }
        }
        prepared.push(service);
    }
    if merge_same_days {
        prepared = merge_same_days_services(prepared);
    }

    let candidates = prepared
        .into_iter()
        .map(|service| {
            let existing_ids = matching_services(existing, &service);
            ImportCandidate::new(service, existing_ids)
        })
        .collect::<Vec<_>>();
    log::debug!("prepared {} services", candidates.len());
    Ok(Preparation {
        candidates,
        warnings,
    })
}

fn parse_calendar_row(row: &FeedRow, at: &RowRef) -> Result<FeedService, ImportWarning> {
    let service_id = required_field(row, at, "service_id")?.to_string();
    let mut weekdays = [false; 7];
    for (day, name) in weekdays.iter_mut().zip(WEEKDAY_FIELDS) {
        *day = match required_field(row, at, name)? {
            "1" => true,
            "0" => false,
            other => return Err(at.invalid(name, other)),
        };
    }
    let start_date = parse_date_field(row, at, "start_date")?;
    let end_date = parse_date_field(row, at, "end_date")?;
    if end_date < start_date {
        return Err(at.invalid("end_date", &end_date.format("%Y%m%d").to_string()));
    }
    Ok(FeedService::new(service_id, weekdays, start_date, end_date))
}

/// # Returns
///
/// the service id, the date, and true if service is added on that date.
fn parse_calendar_date_row(
    row: &FeedRow,
    at: &RowRef,
) -> Result<(String, NaiveDate, bool), ImportWarning> {
    let service_id = required_field(row, at, "service_id")?.to_string();
    let date = parse_date_field(row, at, "date")?;
    let added = match required_field(row, at, "exception_type")? {
        "1" => true,
        "2" => false,
        other => return Err(at.invalid("exception_type", other)),
    };
    Ok((service_id, date, added))
}

/// merges services running on the same weekdays over the same date range. the
/// merged service runs on any date one of its members runs.
fn merge_same_days_services(services: Vec<FeedService>) -> Vec<FeedService> {
    let mut groups: IndexMap<([bool; 7], NaiveDate, NaiveDate), Vec<FeedService>> = IndexMap::new();
    for service in services.into_iter() {
        groups
            .entry((service.weekdays, service.start_date, service.end_date))
            .or_default()
            .push(service);
    }
    groups
        .into_values()
        .map(|mut group| {
            if group.len() == 1 {
                return group.remove(0);
            }
            let ids = group
                .iter()
                .flat_map(|s| s.feed_service_ids.iter().cloned())
                .collect::<Vec<_>>();
            let only_dates = group
                .iter()
                .flat_map(|s| s.only_dates.iter().copied())
                .sorted()
                .dedup()
                .collect::<Vec<_>>();
            let except_dates = group[0]
                .except_dates
                .iter()
                .filter(|d| group.iter().all(|s| s.except_dates.contains(d)))
                .filter(|d| !only_dates.contains(d))
                .copied()
                .collect::<Vec<_>>();
            log::debug!("merging services {}", ids.join(", "));
            FeedService {
                name: ids.join("+"),
                description: Some(format!("merged GTFS services: {}", ids.join(", "))),
                weekdays: group[0].weekdays,
                start_date: group[0].start_date,
                end_date: group[0].end_date,
                feed_service_ids: ids,
                only_dates,
                except_dates,
            }
        })
        .collect()
}
