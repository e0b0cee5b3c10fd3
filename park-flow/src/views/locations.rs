use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::ParkingApi;
use crate::error::ValidationError;
use crate::geo::{Geolocator, Position};
use crate::models::{Coordinates, NewLocation, ParkingLocation};
use crate::step::ListState;

pub const EMPTY_LIST: &str = "No locations saved yet.";
pub const LOAD_FAILED: &str = "Failed to load locations";
pub const DEFAULT_FEE_CLASSIFICATION: &str = "free";

/// Where the location picker starts when the device has no position.
pub const DEFAULT_POSITION: Coordinates = Coordinates {
    lat: 51.505,
    lng: -0.09,
};

pub async fn load_locations(api: &dyn ParkingApi) -> ListState<ParkingLocation> {
    match api.list_locations().await {
        Ok(locations) => ListState::Loaded(locations),
        Err(e) => {
            error!(error = %e, "failed to load locations");
            ListState::Failed(LOAD_FAILED.to_string())
        }
    }
}

/// `Home · 51.500000, -0.100000 · Max 120 min · Public`
pub fn location_line(location: &ParkingLocation) -> String {
    let mut parts = vec![location.name.clone(), location.coordinates().to_string()];
    if let Some(max_stay) = location.max_stay {
        parts.push(format!("Max {max_stay} min"));
    }
    if location.is_public {
        parts.push("Public".to_string());
    }
    parts.join(" · ")
}

/// Input of the create-location form. Durations are kept as typed.
#[derive(Debug, Clone, Default)]
pub struct LocationForm {
    pub name: String,
    pub coords: Option<Coordinates>,
    pub max_stay: Option<String>,
    pub no_return_time: Option<String>,
    pub is_public: bool,
    /// Accept [`DEFAULT_POSITION`] when neither the caller nor the device has one.
    pub use_default_position: bool,
}

fn parse_minutes(raw: Option<&str>, field: &'static str) -> Result<Option<u32>, ValidationError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => text
            .parse::<u32>()
            .ok()
            .filter(|mins| *mins > 0)
            .map(Some)
            .ok_or(ValidationError::InvalidMinutes { field }),
    }
}

impl LocationForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Fill in missing coordinates from the device, or the map default if accepted.
    pub async fn resolve_position(&mut self, geolocator: &dyn Geolocator) {
        if self.coords.is_some() {
            return;
        }
        match geolocator.current_position().await {
            Position::Available(coords) => self.coords = Some(coords),
            Position::Unavailable(reason) => {
                warn!(%reason, "no device position for the new location");
                if self.use_default_position {
                    self.coords = Some(DEFAULT_POSITION);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<NewLocation, ValidationError> {
        let name = self.name.trim();
        let coords = match self.coords {
            Some(coords) if !name.is_empty() => coords,
            _ => return Err(ValidationError::IncompleteLocation),
        };

        Ok(NewLocation {
            name: name.to_string(),
            lat: coords.lat,
            lng: coords.lng,
            max_stay: parse_minutes(self.max_stay.as_deref(), "Max stay")?,
            no_return_time: parse_minutes(self.no_return_time.as_deref(), "No return time")?,
            is_public: self.is_public,
            fee_classification: DEFAULT_FEE_CLASSIFICATION.to_string(),
        })
    }

    pub async fn submit(&mut self, api: &dyn ParkingApi, geolocator: &dyn Geolocator) -> crate::Result<Value> {
        self.resolve_position(geolocator).await;
        let location = self.validate()?;
        let created = api.create_location(&location).await?;
        info!(name = %location.name, public = location.is_public, "created location");
        Ok(created)
    }
}
