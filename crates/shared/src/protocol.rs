use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatTurn, Coords, Place, SessionId},
    error::ApiError,
};

pub const DEFAULT_MAP_ZOOM: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    AwaitingAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub current_place: Place,
    pub transcript: Vec<ChatTurn>,
    pub visited: Vec<Place>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub label: String,
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectCategoryRequest {
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub name: String,
    pub coords: Coords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// Either a `{z}/{y}/{x}` URL template, a WMS endpoint, or a named provider.
    pub source: String,
    pub attribution: String,
    pub overlay: bool,
}

impl TileLayer {
    fn new(name: &str, source: &str, attribution: &str, overlay: bool) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            attribution: attribution.to_string(),
            overlay,
        }
    }
}

pub fn default_tile_layers() -> Vec<TileLayer> {
    vec![
        TileLayer::new(
            "Esri Satellite",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            "Esri",
            true,
        ),
        TileLayer::new(
            "Nasa WMS",
            "https://gibs.earthdata.nasa.gov/wms/epsg4326/best/wms.cgi",
            "NASA",
            true,
        ),
        TileLayer::new("Esri World Imagery", "Esri.WorldImagery", "Esri", true),
        TileLayer::new("Esri Ocean Basemap", "Esri.OceanBasemap", "Esri", true),
        TileLayer::new("USGS Imagery", "USGS.USImagery", "USGS", true),
        TileLayer::new(
            "Stadia Alidade Satellite",
            "Stadia.AlidadeSatellite",
            "Stadia",
            true,
        ),
        TileLayer::new(
            "Stadia Stamen Terrain",
            "Stadia.StamenTerrain",
            "Stadia",
            false,
        ),
        TileLayer::new("Light Map", "CartoDB positron", "CartoDB", false),
    ]
}

/// What a map renderer needs to center the view and drop a marker on the current place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coords,
    pub zoom: u8,
    pub marker: MapMarker,
    pub tile_layers: Vec<TileLayer>,
}

impl MapView {
    pub fn for_place(place: &Place) -> Self {
        Self {
            center: place.coords,
            zoom: DEFAULT_MAP_ZOOM,
            marker: MapMarker {
                name: place.name.clone(),
                coords: place.coords,
            },
            tile_layers: default_tile_layers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged { snapshot: SessionSnapshot },
    Error(ApiError),
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
