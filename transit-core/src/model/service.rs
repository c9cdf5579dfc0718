use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::NetworkEntity;

/// a set of operating days, built from calendar.txt and calendar_dates.txt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    /// monday first
    pub weekdays: [bool; 7],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub only_dates: Vec<NaiveDate>,
    pub except_dates: Vec<NaiveDate>,
    /// lines with at least one schedule using this service
    #[serde(default)]
    pub scheduled_line_ids: BTreeSet<String>,
    /// feed service ids merged into this service
    #[serde(default)]
    pub gtfs_service_ids: Vec<String>,
}

impl Service {
    /// true if both services run on the same weekdays over the same date range.
    pub fn has_same_days(
        &self,
        weekdays: &[bool; 7],
        start_date: &NaiveDate,
        end_date: &NaiveDate,
    ) -> bool {
        &self.weekdays == weekdays && &self.start_date == start_date && &self.end_date == end_date
    }
}

impl NetworkEntity for Service {
    const ENTITY_NAME: &'static str = "service";

    fn id(&self) -> &str {
        &self.id
    }
}
