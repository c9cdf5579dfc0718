use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use transit_core::model::PeriodGroup;

use crate::prepare::CandidateSelection;

pub const DEFAULT_AGENCY_COLOR: &str = "#0086FF";
pub const DEFAULT_LINE_COLOR: &str = "#0086FF";
pub const DEFAULT_NODE_COLOR: &str = "#0086FF";

/// Serializable parameters of an import run. every field is optional in the
/// configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportParameters {
    pub agency_color: String,
    pub line_color: String,
    pub node_color: String,
    /// stops within this walking time of a node join it. 0 only joins stops
    /// at the exact node location.
    pub stop_aggregation_walking_radius_seconds: u32,
    pub walking_speed_kph: f64,
    pub node_routing_radius_meters: f64,
    pub node_default_dwell_time_seconds: u32,
    /// merge feed services running on the same days over the same dates
    pub merge_same_days_services: bool,
    /// without a period group, paths and schedules are not imported
    pub period_group: Option<PeriodGroup>,
    pub layover: LayoverParameters,
    /// concurrent node lookups during stop aggregation
    pub lookup_concurrency: usize,
    pub agencies: HashMap<String, CandidateSelection>,
    pub lines: HashMap<String, CandidateSelection>,
    pub services: HashMap<String, CandidateSelection>,
}

impl Default for ImportParameters {
    fn default() -> Self {
        Self {
            agency_color: String::from(DEFAULT_AGENCY_COLOR),
            line_color: String::from(DEFAULT_LINE_COLOR),
            node_color: String::from(DEFAULT_NODE_COLOR),
            stop_aggregation_walking_radius_seconds: 60,
            walking_speed_kph: 5.0,
            node_routing_radius_meters: 50.0,
            node_default_dwell_time_seconds: 20,
            merge_same_days_services: false,
            period_group: None,
            layover: LayoverParameters::default(),
            lookup_concurrency: 10,
            agencies: HashMap::new(),
            lines: HashMap::new(),
            services: HashMap::new(),
        }
    }
}

impl ImportParameters {
    pub fn validate(&self) -> Result<(), String> {
        if self.walking_speed_kph <= 0.0 {
            return Err(format!(
                "walking_speed_kph must be positive, found {}",
                self.walking_speed_kph
            ));
        }
        if self.lookup_concurrency == 0 {
            return Err(String::from("lookup_concurrency must be at least 1"));
        }
        if self.layover.ratio < 0.0 {
            return Err(format!(
                "layover ratio must not be negative, found {}",
                self.layover.ratio
            ));
        }
        if let Some(group) = &self.period_group {
            if group.periods.is_empty() {
                return Err(format!("period group '{}' has no period", group.shortname));
            }
        }
        Ok(())
    }
}

/// time spent at the terminal between two trips.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoverParameters {
    /// fraction of the operating time
    pub ratio: f64,
    pub minimum_seconds: u32,
    /// replaces the computed layover when set
    pub override_minutes: Option<f64>,
}

impl Default for LayoverParameters {
    fn default() -> Self {
        Self {
            ratio: 0.1,
            minimum_seconds: 180,
            override_minutes: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::ImportParameters;

    #[test]
    fn test_defaults_from_partial_config() {
        let params: ImportParameters = serde_json::from_value(serde_json::json!({
            "merge_same_days_services": true,
            "layover": { "override_minutes": 5.0 },
            "lines": { "24": { "selected": false } }
        }))
        .unwrap();
        assert!(params.merge_same_days_services);
        assert_eq!(params.stop_aggregation_walking_radius_seconds, 60);
        assert_eq!(params.layover.minimum_seconds, 180);
        assert_eq!(params.layover.override_minutes, Some(5.0));
        assert!(!params.lines["24"].selected);
        assert!(params.lines["24"].disposition.is_none());
        assert!(params.validate().is_ok());
    }
}
