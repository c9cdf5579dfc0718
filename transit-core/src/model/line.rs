use serde::{Deserialize, Serialize};

use super::NetworkEntity;

/// a commercial line operated by one agency. paths are attached to lines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub agency_id: String,
    pub short_name: String,
    pub long_name: Option<String>,
    pub mode: LineMode,
    pub color: String,
    pub description: Option<String>,
    pub gtfs: Option<GtfsRouteData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GtfsRouteData {
    pub route_id: String,
    pub route_type: u16,
    pub text_color: Option<String>,
    pub url: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    Tram,
    Metro,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Trolleybus,
    Monorail,
    Other,
}

impl LineMode {
    /// maps a GTFS `route_type`, including the extended route types
    /// (100-1700), to a line mode.
    pub fn from_route_type(route_type: u16) -> LineMode {
        match route_type {
            0 => LineMode::Tram,
            1 => LineMode::Metro,
            2 => LineMode::Rail,
            3 => LineMode::Bus,
            4 => LineMode::Ferry,
            5 => LineMode::CableCar,
            6 => LineMode::Gondola,
            7 => LineMode::Funicular,
            11 => LineMode::Trolleybus,
            12 => LineMode::Monorail,
            100..=199 => LineMode::Rail,
            200..=299 => LineMode::Bus,
            400..=404 => LineMode::Metro,
            405 => LineMode::Monorail,
            700..=799 => LineMode::Bus,
            800..=899 => LineMode::Trolleybus,
            900..=999 => LineMode::Tram,
            1000..=1299 => LineMode::Ferry,
            1300..=1399 => LineMode::Gondola,
            1400..=1499 => LineMode::Funicular,
            _ => LineMode::Other,
        }
    }
}

impl NetworkEntity for Line {
    const ENTITY_NAME: &'static str = "line";

    fn id(&self) -> &str {
        &self.id
    }
}
