use serde::{Deserialize, Serialize};

use super::NetworkEntity;

/// the departures of one line for one service, split by period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub line_id: String,
    pub service_id: String,
    pub period_group: String,
    pub periods: Vec<SchedulePeriod>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub shortname: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub trips: Vec<ScheduleTrip>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTrip {
    pub id: String,
    pub path_id: String,
    pub gtfs_trip_id: String,
    pub departure_time_seconds: u32,
    pub arrival_time_seconds: u32,
    pub node_arrival_times_seconds: Vec<u32>,
    pub node_departure_times_seconds: Vec<u32>,
}

/// named set of day periods used to split schedules, for example
/// `default` with `am_peak`, `midday`, `pm_peak`, `evening`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodGroup {
    pub shortname: String,
    pub periods: Vec<Period>,
}

/// hours are in `[start_hour, end_hour)`, and may go past 24 for service
/// after midnight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub shortname: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PeriodGroup {
    /// finds the period containing the given time of day in seconds. times
    /// past the last period end fall in the last period.
    pub fn period_for(&self, time_seconds: u32) -> Option<&Period> {
        let hour = time_seconds / 3600;
        self.periods
            .iter()
            .find(|p| p.start_hour <= hour && hour < p.end_hour)
            .or_else(|| {
                self.periods
                    .iter()
                    .max_by_key(|p| p.end_hour)
                    .filter(|p| hour >= p.end_hour)
            })
    }
}

impl NetworkEntity for Schedule {
    const ENTITY_NAME: &'static str = "schedule";

    fn id(&self) -> &str {
        &self.id
    }
}
