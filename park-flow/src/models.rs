//! Projections of backend records and the request bodies sent back to it.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Squared Euclidean distance in degree space. Good enough for ordering at city scale.
    pub fn squared_distance_to(&self, lat: f64, lng: f64) -> f64 {
        (lat - self.lat).powi(2) + (lng - self.lng).powi(2)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A captured image, held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub license_plate: String,
    #[serde(default)]
    pub photo_filename: String,
    /// `base_url + photo_filename`, filled in on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Body of `GET /api/private/car`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarList {
    #[serde(default)]
    pub cars: Vec<Car>,
    #[serde(default)]
    pub base_url: String,
}

impl CarList {
    /// Cars with their display image resolved against `base_url`.
    pub fn resolved(self) -> Vec<Car> {
        let base_url = self.base_url;
        self.cars
            .into_iter()
            .map(|mut car| {
                car.photo_url = Some(format!("{}{}", base_url, car.photo_filename));
                car
            })
            .collect()
    }
}

/// A saved or public parking location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLocation {
    /// Empty when the backend hands out a coordinates-only location.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub max_stay: Option<u32>,
    #[serde(default)]
    pub no_return_time: Option<u32>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_public: bool,
    /// Metres from the query point, only present on proximity results.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl ParkingLocation {
    /// `None` for coordinates-only locations.
    pub fn catalog_id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(id)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Body of `GET /api/private/parking/proximity`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProximityResponse {
    #[serde(default)]
    pub saved: Vec<ParkingLocation>,
    #[serde(default)]
    pub public: Vec<ParkingLocation>,
}

impl ProximityResponse {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.public.is_empty()
    }
}

/// Body of `POST /api/private/parking`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLocation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub max_stay: Option<u32>,
    pub no_return_time: Option<u32>,
    pub is_public: bool,
    pub fee_classification: String,
}

/// Multipart body of `POST /api/private/car`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    pub license_plate: String,
    pub photo: Photo,
}

/// Value of the `status` query parameter on the session list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionFilter {
    #[default]
    Active,
    Completed,
    /// Sends no `status` parameter.
    All,
}

impl SessionFilter {
    pub fn as_query(&self) -> Option<&'static str> {
        match self {
            SessionFilter::Active => Some("active"),
            SessionFilter::Completed => Some("completed"),
            SessionFilter::All => None,
        }
    }
}

impl std::str::FromStr for SessionFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SessionFilter::Active),
            "completed" => Ok(SessionFilter::Completed),
            "all" => Ok(SessionFilter::All),
            other => Err(format!("unknown session status filter: {other}")),
        }
    }
}

/// One entry of `GET /api/private/session`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default, rename = "_id")]
    pub(crate) legacy_id: Option<String>,
    pub car_id: String,
    #[serde(default)]
    pub parking_location_id: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub manual_max_stay_mins: Option<u32>,
}

impl SessionRecord {
    /// Prefers the backend's `_id` over `id`.
    pub fn id(&self) -> &str {
        self.legacy_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionCar {
    pub id: String,
    pub license_plate: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionLocation {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub coords: Option<[f64; 2]>,
}

/// Body of `GET /api/private/session/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    pub status: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub actual_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub photo_url: String,
    pub car: SessionCar,
    pub location: SessionLocation,
    #[serde(default)]
    pub manual_max_stay_mins: Option<u32>,
}

impl SessionDetails {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }

    /// Planned length of the session in whole minutes.
    pub fn duration_mins(&self) -> u32 {
        let mins = (self.end_time - self.start_time).num_minutes();
        u32::try_from(mins.max(0)).unwrap_or(u32::MAX)
    }
}

/// Backend timestamps arrive either as RFC 3339 or as naive ISO strings; naive ones are UTC.
pub(crate) mod timestamp {
    use super::*;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn deserialize_option<'de, D>(
        deserializer: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn car_list_resolves_photo_urls() {
        let list: CarList = serde_json::from_value(json!({
            "cars": [{"id": "c1", "license_plate": "AB12 CDE", "photo_filename": "c1.jpg"}],
            "base_url": "https://cdn.example.com/cars/"
        }))
        .unwrap();

        let cars = list.resolved();
        assert_eq!(
            cars[0].photo_url.as_deref(),
            Some("https://cdn.example.com/cars/c1.jpg")
        );
    }

    #[test]
    fn session_record_prefers_legacy_id() {
        let record: SessionRecord = serde_json::from_value(json!({
            "_id": "mongo-1",
            "car_id": "c1",
            "start_time": "2025-03-01T10:00:00",
            "end_time": "2025-03-01T12:00:00Z",
            "status": "active"
        }))
        .unwrap();

        assert_eq!(record.id(), "mongo-1");
        assert_eq!(
            record.start_time,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn session_details_duration_and_status() {
        let details: SessionDetails = serde_json::from_value(json!({
            "id": "s1",
            "status": "ACTIVE",
            "start_time": "2025-03-01T10:00:00Z",
            "end_time": "2025-03-01T11:30:00Z",
            "actual_end_time": null,
            "photo_url": "https://cdn.example.com/s1.jpg",
            "car": {"id": "c1", "license_plate": "AB12 CDE"},
            "location": {"name": "Manual", "id": null, "coords": [51.5, -0.1]},
            "manual_max_stay_mins": 90
        }))
        .unwrap();

        assert!(details.is_active());
        assert_eq!(details.duration_mins(), 90);
        assert!(details.actual_end_time.is_none());
    }

    #[test]
    fn location_without_id_has_no_catalog_id() {
        let loc: ParkingLocation =
            serde_json::from_value(json!({"name": "Pin", "lat": 1.0, "lng": 2.0})).unwrap();
        assert_eq!(loc.catalog_id(), None);
    }

    #[test]
    fn session_filter_query_values() {
        assert_eq!(SessionFilter::Active.as_query(), Some("active"));
        assert_eq!(SessionFilter::All.as_query(), None);
        assert_eq!("Completed".parse::<SessionFilter>(), Ok(SessionFilter::Completed));
    }
}
