use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::context::StepContext;
use crate::geo::Position;
use crate::models::{Coordinates, ParkingLocation, ProximityResponse};
use crate::step::{ListState, Step};
use crate::wizard::{WizardInput, WizardStep};

pub const LOAD_FAILED: &str = "Failed to load parking locations";
pub const NO_POSITION_NOTICE: &str = "Unable to retrieve your location. Showing all locations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Owned and public locations near the user.
    Proximity,
    All,
}

impl ViewMode {
    pub fn description(self) -> &'static str {
        match self {
            ViewMode::Proximity => "Nearby parking zones.",
            ViewMode::All => "All parking zones.",
        }
    }
}

/// Saved then public results, nearest first. Entries without a distance go last.
pub fn nearest_first(response: ProximityResponse) -> Vec<ParkingLocation> {
    let mut nearby: Vec<ParkingLocation> = response
        .saved
        .into_iter()
        .chain(response.public)
        .collect();
    nearby.sort_by(|a, b| {
        let da = a.distance.unwrap_or(f64::INFINITY);
        let db = b.distance.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
    nearby
}

/// Order by squared degree distance from `origin`; list order is kept without one.
pub fn closest_to(mut locations: Vec<ParkingLocation>, origin: Option<Coordinates>) -> Vec<ParkingLocation> {
    if let Some(origin) = origin {
        locations.sort_by(|a, b| {
            origin
                .squared_distance_to(a.lat, a.lng)
                .total_cmp(&origin.squared_distance_to(b.lat, b.lng))
        });
    }
    locations
}

/// Step 3: choose where the car is parked, or say the spot is not listed.
#[derive(Debug)]
pub struct LocationStep {
    mode: ViewMode,
    coords: Option<Coordinates>,
    state: ListState<ParkingLocation>,
    notice: Option<String>,
    located: bool,
    loaded_for: Option<(ViewMode, Option<Coordinates>)>,
}

impl Default for LocationStep {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationStep {
    pub fn new() -> Self {
        Self {
            mode: ViewMode::Proximity,
            coords: None,
            state: ListState::Loading,
            notice: None,
            located: false,
            loaded_for: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn coords(&self) -> Option<Coordinates> {
        self.coords
    }

    pub fn state(&self) -> &ListState<ParkingLocation> {
        &self.state
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// "Show Nearby" only makes sense with a known position.
    pub fn can_show_nearby(&self) -> bool {
        self.mode == ViewMode::All && self.coords.is_some()
    }

    pub async fn show_all(&mut self, ctx: &StepContext) {
        self.mode = ViewMode::All;
        self.load(ctx).await;
    }

    /// Returns false, and does nothing, without a known position.
    pub async fn show_nearby(&mut self, ctx: &StepContext) -> bool {
        if self.coords.is_none() {
            return false;
        }
        self.mode = ViewMode::Proximity;
        self.load(ctx).await;
        true
    }

    pub async fn retry(&mut self, ctx: &StepContext) {
        self.loaded_for = None;
        self.load(ctx).await;
    }

    pub fn select(&self, location_id: &str) -> Option<WizardInput> {
        let index = self
            .state
            .items()
            .iter()
            .position(|loc| loc.id == location_id)?;
        self.select_index(index)
    }

    /// Pick by position in the shown list. Coordinates-only entries share an
    /// empty id, so this is the only way to tell them apart.
    pub fn select_index(&self, index: usize) -> Option<WizardInput> {
        let location = self.state.items().get(index)?.clone();
        Some(WizardInput::LocationSelected {
            location,
            coords: self.coords,
        })
    }

    /// "I don't see my location".
    pub fn none_of_these(&self) -> WizardInput {
        WizardInput::NoMatchingLocation {
            coords: self.coords,
        }
    }

    /// Fetch for the current (mode, position), unless that was already fetched.
    async fn load(&mut self, ctx: &StepContext) {
        loop {
            let key = (self.mode, self.coords);
            if self.loaded_for == Some(key) {
                return;
            }
            self.loaded_for = Some(key);
            self.state = ListState::Loading;

            match (self.mode, self.coords) {
                (ViewMode::Proximity, Some(at)) => match ctx.api().nearby_locations(at).await {
                    Ok(response) if response.is_empty() => {
                        info!("nothing nearby, switching to all locations");
                        self.mode = ViewMode::All;
                    }
                    Ok(response) => {
                        self.state = ListState::Loaded(nearest_first(response));
                        return;
                    }
                    Err(e) => {
                        error!(error = %e, "proximity search failed");
                        self.state = ListState::Failed(LOAD_FAILED.to_string());
                        return;
                    }
                },
                (ViewMode::Proximity, None) => {
                    self.mode = ViewMode::All;
                }
                (ViewMode::All, origin) => {
                    self.state = match ctx.api().list_locations().await {
                        Ok(locations) => ListState::Loaded(closest_to(locations, origin)),
                        Err(e) => {
                            error!(error = %e, "failed to load locations");
                            ListState::Failed(LOAD_FAILED.to_string())
                        }
                    };
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Step for LocationStep {
    fn id(&self) -> WizardStep {
        WizardStep::Location
    }

    async fn enter(&mut self, ctx: &StepContext) {
        if !self.located {
            self.located = true;
            match ctx.geolocator().current_position().await {
                Position::Available(coords) => self.coords = Some(coords),
                Position::Unavailable(reason) => {
                    warn!(%reason, "no position, falling back to all locations");
                    self.mode = ViewMode::All;
                    self.notice = Some(NO_POSITION_NOTICE.to_string());
                }
            }
        }
        self.load(ctx).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::fixtures::location;

    fn at(id: &str, distance: Option<f64>) -> ParkingLocation {
        ParkingLocation {
            distance,
            ..location(id, id, 0.0, 0.0)
        }
    }

    #[test]
    fn proximity_results_are_sorted_by_distance() {
        let sorted = nearest_first(ProximityResponse {
            saved: vec![at("far", Some(900.0)), at("unknown", None)],
            public: vec![at("near", Some(40.0)), at("zero", Some(0.0))],
        });
        let ids: Vec<&str> = sorted.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["zero", "near", "far", "unknown"]);
    }

    #[test]
    fn full_list_is_sorted_by_squared_distance_when_position_known() {
        let list = vec![
            location("b", "B", 51.60, -0.10),
            location("a", "A", 51.50, -0.10),
            location("c", "C", 52.00, 0.50),
        ];
        let sorted = closest_to(list.clone(), Some(Coordinates::new(51.51, -0.11)));
        let ids: Vec<&str> = sorted.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        assert_eq!(closest_to(list.clone(), None), list);
    }

    #[test]
    fn select_by_index_tells_pins_without_ids_apart() {
        let mut step = LocationStep::new();
        step.state = ListState::Loaded(vec![
            location("", "North pin", 51.6, -0.1),
            location("", "South pin", 51.4, -0.1),
        ]);

        match step.select_index(1) {
            Some(WizardInput::LocationSelected { location, .. }) => {
                assert_eq!(location.name, "South pin")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(step.select_index(2).is_none());
    }
}
