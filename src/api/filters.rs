//! Query-string filters for list endpoints. Unset fields are not sent.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl FactionFilter {
    pub fn active(active: bool) -> Self {
        Self { active: Some(active) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeometryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<String>,
    /// `min_lon,min_lat,max_lon,max_lat`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<String>,
}

impl GeometryFilter {
    pub fn with_bbox(mut self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        self.bbox = Some(format!("{},{},{},{}", min_lon, min_lat, max_lon, max_lat));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}
