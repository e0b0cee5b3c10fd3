//! In-memory implementation of [`ParkingApi`].
//!
//! Follows the backend contract closely enough to drive the wizard and views
//! without a server. Sessions end after the location's max stay or the manual
//! duration. Failures can be injected per operation, and calls are counted.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Mutex;
use uuid::Uuid;

use crate::api::{ApiResult, ParkingApi};
use crate::draft::{SessionTarget, Submission};
use crate::error::ApiError;
use crate::models::{
    Car, CarList, Coordinates, NewCar, NewLocation, ParkingLocation, ProximityResponse,
    SessionCar, SessionDetails, SessionFilter, SessionLocation, SessionRecord,
};

pub const DEFAULT_PROXIMITY_RADIUS_M: f64 = 1_000.0;
const DEFAULT_STAY_MINS: u32 = 120;
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListCars,
    RegisterCar,
    ListLocations,
    CreateLocation,
    NearbyLocations,
    ListSessions,
    GetSession,
    CreateSession,
    CompleteSession,
}

#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    coords: Coordinates,
    photo_file_name: String,
    actual_end_time: Option<chrono::DateTime<Utc>>,
}

/// Great-circle distance in metres.
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

pub struct InMemoryParkingApi {
    base_url: String,
    radius_m: f64,
    cars: DashMap<String, Car>,
    locations: DashMap<String, ParkingLocation>,
    sessions: DashMap<String, StoredSession>,
    failures: DashMap<Operation, (u16, String)>,
    calls: DashMap<Operation, usize>,
    submissions: Mutex<Vec<Submission>>,
}

impl Default for InMemoryParkingApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryParkingApi {
    pub fn new() -> Self {
        Self {
            base_url: "memory://photos/".to_string(),
            radius_m: DEFAULT_PROXIMITY_RADIUS_M,
            cars: DashMap::new(),
            locations: DashMap::new(),
            sessions: DashMap::new(),
            failures: DashMap::new(),
            calls: DashMap::new(),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_car(self, car: Car) -> Self {
        self.add_car(car);
        self
    }

    pub fn with_location(self, location: ParkingLocation) -> Self {
        self.add_location(location);
        self
    }

    pub fn add_car(&self, car: Car) {
        self.cars.insert(car.id.clone(), car);
    }

    pub fn add_location(&self, location: ParkingLocation) {
        self.locations.insert(location.id.clone(), location);
    }

    /// Make every call to `op` fail with `status` and `detail` until [`recover`](Self::recover).
    pub fn fail(&self, op: Operation, status: u16, detail: impl Into<String>) {
        self.failures.insert(op, (status, detail.into()));
    }

    pub fn recover(&self, op: Operation) {
        self.failures.remove(&op);
    }

    pub fn calls(&self, op: Operation) -> usize {
        self.calls.get(&op).map(|n| *n).unwrap_or(0)
    }

    /// Every create-session payload received, in order, including rejected ones.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn enter(&self, op: Operation) -> ApiResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get(&op) {
            Some(failure) => {
                let (status, message) = failure.value().clone();
                Err(ApiError::Status { status, message })
            }
            None => Ok(()),
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: format!("{what} not found"),
        }
    }

    fn sorted_locations(&self) -> Vec<ParkingLocation> {
        let mut locations: Vec<ParkingLocation> =
            self.locations.iter().map(|e| e.value().clone()).collect();
        locations.sort_by(|a, b| a.id.cmp(&b.id));
        locations
    }
}

#[async_trait]
impl ParkingApi for InMemoryParkingApi {
    async fn list_cars(&self) -> ApiResult<CarList> {
        self.enter(Operation::ListCars)?;
        let mut cars: Vec<Car> = self.cars.iter().map(|e| e.value().clone()).collect();
        cars.sort_by(|a, b| a.license_plate.cmp(&b.license_plate));
        Ok(CarList {
            cars,
            base_url: self.base_url.clone(),
        })
    }

    async fn register_car(&self, car: NewCar) -> ApiResult<Value> {
        self.enter(Operation::RegisterCar)?;
        let id = Uuid::new_v4().to_string();
        let stored = Car {
            id: id.clone(),
            license_plate: car.license_plate,
            photo_filename: format!("{id}-{}", car.photo.file_name),
            photo_url: None,
        };
        self.cars.insert(id, stored.clone());
        Ok(serde_json::to_value(stored)?)
    }

    async fn list_locations(&self) -> ApiResult<Vec<ParkingLocation>> {
        self.enter(Operation::ListLocations)?;
        Ok(self.sorted_locations())
    }

    async fn create_location(&self, location: &NewLocation) -> ApiResult<Value> {
        self.enter(Operation::CreateLocation)?;
        let stored = ParkingLocation {
            id: Uuid::new_v4().to_string(),
            name: location.name.clone(),
            lat: location.lat,
            lng: location.lng,
            max_stay: location.max_stay,
            no_return_time: location.no_return_time,
            owner_id: Some("me".to_string()),
            is_owner: true,
            is_public: location.is_public,
            distance: None,
        };
        self.add_location(stored.clone());
        Ok(serde_json::to_value(stored)?)
    }

    async fn nearby_locations(&self, at: Coordinates) -> ApiResult<ProximityResponse> {
        self.enter(Operation::NearbyLocations)?;
        let mut response = ProximityResponse::default();

        for mut location in self.sorted_locations() {
            let distance = haversine_m(at, location.coordinates());
            if distance > self.radius_m {
                continue;
            }
            location.distance = Some(distance);
            if location.is_owner {
                response.saved.push(location);
            } else if location.is_public {
                response.public.push(location);
            }
        }

        let by_distance = |a: &ParkingLocation, b: &ParkingLocation| {
            a.distance.unwrap_or(0.0).total_cmp(&b.distance.unwrap_or(0.0))
        };
        response.saved.sort_by(by_distance);
        response.public.sort_by(by_distance);
        Ok(response)
    }

    async fn list_sessions(&self, filter: SessionFilter) -> ApiResult<Vec<SessionRecord>> {
        self.enter(Operation::ListSessions)?;
        let mut records: Vec<SessionRecord> = self
            .sessions
            .iter()
            .map(|e| e.value().record.clone())
            .filter(|record| match filter.as_query() {
                Some(status) => record.status.eq_ignore_ascii_case(status),
                None => true,
            })
            .collect();
        records.sort_by_key(|record| record.start_time);
        Ok(records)
    }

    async fn get_session(&self, id: &str) -> ApiResult<SessionDetails> {
        self.enter(Operation::GetSession)?;
        let stored = self
            .sessions
            .get(id)
            .map(|e| e.value().clone())
            .ok_or_else(|| Self::not_found("Session"))?;
        let record = &stored.record;

        let car = self
            .cars
            .get(&record.car_id)
            .map(|car| SessionCar {
                id: car.id.clone(),
                license_plate: car.license_plate.clone(),
            })
            .unwrap_or_else(|| SessionCar {
                id: record.car_id.clone(),
                license_plate: "Unknown Car".to_string(),
            });

        let location = match record
            .parking_location_id
            .as_ref()
            .and_then(|loc_id| self.locations.get(loc_id))
        {
            Some(loc) => SessionLocation {
                name: loc.name.clone(),
                id: Some(loc.id.clone()),
                coords: Some([loc.lat, loc.lng]),
            },
            None => SessionLocation {
                name: "Manual Timer".to_string(),
                id: None,
                coords: Some([stored.coords.lat, stored.coords.lng]),
            },
        };

        Ok(SessionDetails {
            id: record.id().to_string(),
            status: record.status.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            actual_end_time: stored.actual_end_time,
            photo_url: format!("{}{}", self.base_url, stored.photo_file_name),
            car,
            location,
            manual_max_stay_mins: record.manual_max_stay_mins,
        })
    }

    async fn create_session(&self, submission: &Submission) -> ApiResult<Value> {
        if let Ok(mut received) = self.submissions.lock() {
            received.push(submission.clone());
        }
        self.enter(Operation::CreateSession)?;

        if !self.cars.contains_key(&submission.car_id) {
            return Err(Self::not_found("Car"));
        }

        let (parking_location_id, stay_mins, manual) = match &submission.target {
            SessionTarget::Location(id) => {
                let location = self
                    .locations
                    .get(id)
                    .ok_or_else(|| Self::not_found("Parking location"))?;
                (
                    Some(id.clone()),
                    location.max_stay.unwrap_or(DEFAULT_STAY_MINS),
                    None,
                )
            }
            SessionTarget::Manual(mins) => (None, *mins, Some(*mins)),
        };

        let id = Uuid::new_v4().to_string();
        let start_time = Utc::now();
        let record = SessionRecord {
            id: Some(id.clone()),
            legacy_id: None,
            car_id: submission.car_id.clone(),
            parking_location_id,
            start_time,
            end_time: start_time + Duration::minutes(i64::from(stay_mins)),
            status: "active".to_string(),
            manual_max_stay_mins: manual,
        };

        let created = json!({
            "id": id,
            "status": record.status,
            "start_time": record.start_time.to_rfc3339(),
            "end_time": record.end_time.to_rfc3339(),
        });
        self.sessions.insert(
            id,
            StoredSession {
                record,
                coords: submission.coords,
                photo_file_name: submission.photo.file_name.clone(),
                actual_end_time: None,
            },
        );
        Ok(created)
    }

    async fn complete_session(&self, id: &str) -> ApiResult<Value> {
        self.enter(Operation::CompleteSession)?;
        let mut stored = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| Self::not_found("Session"))?;

        if !stored.record.status.eq_ignore_ascii_case("active") {
            return Err(ApiError::Status {
                status: 400,
                message: "Session is not active".to_string(),
            });
        }

        let now = Utc::now();
        stored.record.status = "completed".to_string();
        stored.actual_end_time = Some(now);
        Ok(json!({
            "id": id,
            "status": "completed",
            "actual_end_time": now.to_rfc3339(),
        }))
    }
}
