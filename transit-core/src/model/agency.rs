use serde::{Deserialize, Serialize};

use super::NetworkEntity;

/// a transit operator in the network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    /// short display name, unique across the agency collection
    pub acronym: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    /// attributes copied from agency.txt when the agency came from a feed
    pub gtfs: Option<GtfsAgencyData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GtfsAgencyData {
    pub agency_id: String,
    pub url: Option<String>,
    pub timezone: Option<String>,
    pub lang: Option<String>,
    pub phone: Option<String>,
    pub fare_url: Option<String>,
    pub email: Option<String>,
}

impl NetworkEntity for Agency {
    const ENTITY_NAME: &'static str = "agency";

    fn id(&self) -> &str {
        &self.id
    }
}
