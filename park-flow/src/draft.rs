//! The session draft assembled by the wizard, and the submission it turns into.

use crate::error::ValidationError;
use crate::models::{Car, Coordinates, ParkingLocation, Photo};

/// Everything collected so far in one wizard run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDraft {
    pub photo: Option<Photo>,
    pub car: Option<Car>,
    pub location: Option<ParkingLocation>,
    pub manual_max_stay_mins: Option<u32>,
    pub user_coords: Option<Coordinates>,
}

impl SessionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the session is not tied to a catalog location and needs a typed-in duration.
    pub fn is_manual(&self) -> bool {
        self.location
            .as_ref()
            .and_then(ParkingLocation::catalog_id)
            .is_none()
    }

    /// Keep known coordinates when a step reports none.
    pub(crate) fn merge_coords(&mut self, coords: Option<Coordinates>) {
        if coords.is_some() {
            self.user_coords = coords;
        }
    }

    /// Check the draft and build the request payload.
    ///
    /// Order: car, photo, coordinates, then either a catalog location or a positive manual duration.
    pub fn validate(&self) -> Result<Submission, ValidationError> {
        let car = self.car.as_ref().ok_or(ValidationError::MissingCar)?;
        let photo = self.photo.as_ref().ok_or(ValidationError::MissingPhoto)?;
        let coords = self.user_coords.ok_or(ValidationError::MissingCoordinates)?;

        let location_id = self.location.as_ref().and_then(ParkingLocation::catalog_id);
        let target = match (location_id, self.manual_max_stay_mins) {
            (Some(id), _) => SessionTarget::Location(id.to_string()),
            (None, Some(mins)) if mins > 0 => SessionTarget::Manual(mins),
            (None, _) => return Err(ValidationError::InvalidDuration),
        };

        Ok(Submission {
            car_id: car.id.clone(),
            photo: photo.clone(),
            coords,
            target,
        })
    }
}

/// How the backend should bound the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    /// Use the policy of a saved or public location.
    Location(String),
    /// Use a user-entered maximum stay, in minutes.
    Manual(u32),
}

/// A validated create-session request.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub car_id: String,
    pub photo: Photo,
    pub coords: Coordinates,
    pub target: SessionTarget,
}
