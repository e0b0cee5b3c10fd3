use std::sync::Arc;

use crate::api::ParkingApi;
use crate::geo::Geolocator;

/// Collaborators shared by the wizard steps and views.
#[derive(Clone)]
pub struct StepContext {
    api: Arc<dyn ParkingApi>,
    geolocator: Arc<dyn Geolocator>,
}

impl StepContext {
    pub fn new(api: Arc<dyn ParkingApi>, geolocator: Arc<dyn Geolocator>) -> Self {
        Self { api, geolocator }
    }

    pub fn api(&self) -> &dyn ParkingApi {
        self.api.as_ref()
    }

    pub fn geolocator(&self) -> &dyn Geolocator {
        self.geolocator.as_ref()
    }
}

impl std::fmt::Debug for StepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext").finish_non_exhaustive()
    }
}
