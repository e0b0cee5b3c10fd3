//! Session dashboard and detail screen.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::api::{ApiResult, ParkingApi};
use crate::format::{format_clock_time, format_duration, format_relative_date_local};
use crate::models::{Car, ParkingLocation, SessionDetails, SessionFilter, SessionRecord};
use crate::timer::{Remaining, remaining};

pub const UNKNOWN_CAR: &str = "Unknown Car";
pub const MANUAL_TIMER: &str = "Manual Timer";
pub const EMPTY_LIST: &str = "No active parking sessions.";
pub const LOAD_FAILED: &str = "Failed to load active sessions";

/// A session joined with its vehicle and location for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCard {
    pub id: String,
    pub license_plate: String,
    pub location_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub manual_max_stay_mins: Option<u32>,
}

impl SessionCard {
    pub fn is_manual(&self) -> bool {
        self.manual_max_stay_mins.is_some() || self.location_name == MANUAL_TIMER
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Remaining {
        remaining(self.end_time, now)
    }

    /// `Ends at 14:05`
    pub fn ends_at(&self) -> String {
        format!("Ends at {}", format_clock_time(&self.end_time))
    }
}

/// Attach plates and location names. Unknown ids fall back to placeholder labels.
pub fn enrich(
    records: Vec<SessionRecord>,
    cars: &[Car],
    locations: &[ParkingLocation],
) -> Vec<SessionCard> {
    let plates: HashMap<&str, &str> = cars
        .iter()
        .map(|car| (car.id.as_str(), car.license_plate.as_str()))
        .collect();
    let names: HashMap<&str, &str> = locations
        .iter()
        .filter_map(|loc| loc.catalog_id().map(|id| (id, loc.name.as_str())))
        .collect();

    records
        .into_iter()
        .map(|record| SessionCard {
            id: record.id().to_string(),
            license_plate: plates
                .get(record.car_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_CAR)
                .to_string(),
            location_name: record
                .parking_location_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .and_then(|id| names.get(id).copied())
                .filter(|name| !name.is_empty())
                .unwrap_or(MANUAL_TIMER)
                .to_string(),
            status: record.status,
            start_time: record.start_time,
            end_time: record.end_time,
            manual_max_stay_mins: record.manual_max_stay_mins,
        })
        .collect()
}

/// Fetch sessions, cars and locations together; any failure fails the dashboard.
pub async fn load_dashboard(api: &dyn ParkingApi, filter: SessionFilter) -> ApiResult<Vec<SessionCard>> {
    let (records, cars, locations) = tokio::try_join!(
        api.list_sessions(filter),
        api.list_cars(),
        api.list_locations(),
    )?;
    debug!(
        sessions = records.len(),
        cars = cars.cars.len(),
        locations = locations.len(),
        "loaded dashboard"
    );
    Ok(enrich(records, &cars.cars, &locations))
}

/// Text of the session detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLines {
    pub status: String,
    pub vehicle: String,
    pub location: String,
    /// `14:05 · Today`
    pub start: String,
    pub end: String,
    pub duration: String,
    pub ended_manually: Option<String>,
    pub photo_url: String,
}

fn when(at: &DateTime<Utc>) -> String {
    format!("{} · {}", format_clock_time(at), format_relative_date_local(at))
}

impl From<&SessionDetails> for SessionLines {
    fn from(details: &SessionDetails) -> Self {
        Self {
            status: details.status.clone(),
            vehicle: details.car.license_plate.clone(),
            location: details.location.name.clone(),
            start: when(&details.start_time),
            end: when(&details.end_time),
            duration: format_duration(details.duration_mins()),
            ended_manually: details
                .actual_end_time
                .as_ref()
                .map(|at| format!("Ended manually on {}", format_clock_time(at))),
            photo_url: details.photo_url.clone(),
        }
    }
}

pub async fn load_session(api: &dyn ParkingApi, id: &str) -> ApiResult<SessionDetails> {
    api.get_session(id).await
}

/// Finish a session, then read it back so the caller shows the backend's view.
pub async fn complete_and_refresh(api: &dyn ParkingApi, id: &str) -> ApiResult<SessionDetails> {
    api.complete_session(id).await?;
    info!(session_id = %id, "session completed");
    api.get_session(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::fixtures::*;
    use crate::memory::{InMemoryParkingApi, Operation};
    use serde_json::json;

    fn record(value: serde_json::Value) -> SessionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn enrich_falls_back_to_placeholders() {
        let records = vec![
            record(json!({
                "_id": "s1", "car_id": "c1", "parking_location_id": "loc-1",
                "start_time": "2025-03-01T10:00:00Z", "end_time": "2025-03-01T12:00:00Z",
                "status": "active"
            })),
            record(json!({
                "id": "s2", "car_id": "gone",
                "start_time": "2025-03-01T10:00:00Z", "end_time": "2025-03-01T10:30:00Z",
                "status": "active", "manual_max_stay_mins": 30
            })),
        ];
        let cards = enrich(
            records,
            &[car("c1", "AB12 CDE")],
            &[location("loc-1", "Home", 1.0, 1.0)],
        );

        assert_eq!(cards[0].id, "s1");
        assert_eq!(cards[0].license_plate, "AB12 CDE");
        assert_eq!(cards[0].location_name, "Home");
        assert_eq!(cards[1].license_plate, UNKNOWN_CAR);
        assert_eq!(cards[1].location_name, MANUAL_TIMER);
        assert!(cards[1].is_manual());
    }

    #[test]
    fn empty_location_id_is_a_manual_timer() {
        let records = vec![record(json!({
            "id": "s3", "car_id": "c1", "parking_location_id": "",
            "start_time": "2025-03-01T10:00:00Z", "end_time": "2025-03-01T11:00:00Z",
            "status": "active"
        }))];
        let cards = enrich(
            records,
            &[car("c1", "AB12 CDE")],
            &[location("", "Dropped pin", 1.0, 1.0)],
        );
        assert_eq!(cards[0].location_name, MANUAL_TIMER);
    }

    #[tokio::test]
    async fn dashboard_fails_when_any_fetch_fails() {
        let api = InMemoryParkingApi::new().with_car(car("c1", "AB12 CDE"));
        assert!(load_dashboard(&api, SessionFilter::Active).await.unwrap().is_empty());

        api.fail(Operation::ListLocations, 500, "down");
        assert!(load_dashboard(&api, SessionFilter::Active).await.is_err());
    }

    #[tokio::test]
    async fn complete_then_refetch() {
        let api = InMemoryParkingApi::new()
            .with_car(car("c1", "AB12 CDE"))
            .with_location(location("loc-1", "Home", 51.5, -0.1));
        let created = api
            .create_session(&complete_draft().validate().unwrap())
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let before = SessionLines::from(&load_session(&api, id).await.unwrap());
        assert_eq!(before.duration, "2 hours");
        assert!(before.ended_manually.is_none());

        let after = complete_and_refresh(&api, id).await.unwrap();
        assert!(!after.is_active());
        assert!(SessionLines::from(&after).ended_manually.is_some());
        assert_eq!(api.calls(Operation::GetSession), 2);
    }
}
