use serde_json::Value;
use tracing::{error, info};

use crate::api::{ApiResult, ParkingApi};
use crate::error::ValidationError;
use crate::models::{Car, NewCar, Photo};
use crate::step::ListState;

pub const EMPTY_LIST: &str = "No cars added yet.";
pub const LOAD_FAILED: &str = "Failed to load cars";

/// One row of the vehicle list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarLine {
    pub license_plate: String,
    pub photo_url: String,
}

impl From<&Car> for CarLine {
    fn from(car: &Car) -> Self {
        Self {
            license_plate: car.license_plate.clone(),
            photo_url: car.photo_url.clone().unwrap_or_default(),
        }
    }
}

pub async fn load_cars(api: &dyn ParkingApi) -> ListState<Car> {
    match api.list_cars().await {
        Ok(list) => ListState::Loaded(list.resolved()),
        Err(e) => {
            error!(error = %e, "failed to load cars");
            ListState::Failed(LOAD_FAILED.to_string())
        }
    }
}

/// Input of the register-vehicle form.
#[derive(Debug, Clone, Default)]
pub struct CarForm {
    pub license_plate: String,
    pub photo: Option<Photo>,
}

impl CarForm {
    pub fn new(license_plate: impl Into<String>, photo: Option<Photo>) -> Self {
        Self {
            license_plate: license_plate.into(),
            photo,
        }
    }

    /// Plates are stored upper-cased.
    pub fn validate(&self) -> Result<NewCar, ValidationError> {
        let plate = self.license_plate.trim().to_uppercase();
        match &self.photo {
            Some(photo) if !plate.is_empty() && !photo.is_empty() => Ok(NewCar {
                license_plate: plate,
                photo: photo.clone(),
            }),
            _ => Err(ValidationError::IncompleteCar),
        }
    }

    pub async fn submit(&self, api: &dyn ParkingApi) -> crate::Result<Value> {
        let car = self.validate()?;
        let plate = car.license_plate.clone();
        let created = api.register_car(car).await?;
        info!(license_plate = %plate, "registered car");
        Ok(created)
    }
}

/// Shorthand for the list screen.
pub async fn car_lines(api: &dyn ParkingApi) -> ApiResult<Vec<CarLine>> {
    let cars = api.list_cars().await?.resolved();
    Ok(cars.iter().map(CarLine::from).collect())
}
