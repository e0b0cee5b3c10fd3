//! HTTP client for the parking backend.
//!
//! [`HttpParkingApi::request`] is the single entry point for every call: it
//! adds the JSON content type (left off for multipart bodies so the transport
//! can write the boundary), always sends credentials, turns non-2xx replies
//! into [`ApiError::Status`] carrying the backend's `detail`, and resolves
//! `204`/empty bodies to `{}`.
//!
//! Steps and views talk to the backend through the [`ParkingApi`] trait so they
//! can be driven by an in-memory fake in tests.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::draft::{SessionTarget, Submission};
use crate::error::{ApiError, GENERIC_REQUEST_FAILURE};
use crate::models::{
    CarList, Coordinates, NewCar, NewLocation, Photo, ProximityResponse, SessionDetails,
    SessionFilter, SessionRecord,
};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Backend operations used by the wizard and the views.
#[async_trait]
pub trait ParkingApi: Send + Sync {
    async fn list_cars(&self) -> ApiResult<CarList>;
    async fn register_car(&self, car: NewCar) -> ApiResult<Value>;
    async fn list_locations(&self) -> ApiResult<Vec<crate::models::ParkingLocation>>;
    async fn create_location(&self, location: &NewLocation) -> ApiResult<Value>;
    async fn nearby_locations(&self, at: Coordinates) -> ApiResult<ProximityResponse>;
    async fn list_sessions(&self, filter: SessionFilter) -> ApiResult<Vec<SessionRecord>>;
    async fn get_session(&self, id: &str) -> ApiResult<SessionDetails>;
    async fn create_session(&self, submission: &Submission) -> ApiResult<Value>;
    async fn complete_session(&self, id: &str) -> ApiResult<Value>;
}

/// Request body accepted by [`HttpParkingApi::request`].
#[derive(Debug)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(Form),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// [`ParkingApi`] over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpParkingApi {
    client: reqwest::Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpParkingApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing client, e.g. to share its connection pool and cookie jar.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_cookie: config.session_cookie.clone(),
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn request(&self, method: Method, endpoint: &str, body: Body) -> ApiResult<Value> {
        let url = self.url(endpoint);
        debug!(%method, %url, "sending request");

        let mut builder = self.client.request(method.clone(), &url);
        if let Some(cookie) = &self.session_cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder = match body {
            Body::Empty => builder.header(CONTENT_TYPE, "application/json"),
            Body::Json(value) => builder.json(&value),
            Body::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "received response");

        if !status.is_success() {
            let message = Self::error_message(response).await;
            warn!(%method, %url, status = status.as_u16(), %message, "request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Object(Map::new()));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let value = self.request(Method::GET, endpoint, Body::Empty).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post(&self, endpoint: &str, body: Body) -> ApiResult<Value> {
        self.request(Method::POST, endpoint, body).await
    }

    async fn error_message(response: reqwest::Response) -> String {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);

        match detail {
            Some(Value::String(message)) if !message.trim().is_empty() => message,
            _ => GENERIC_REQUEST_FAILURE.to_string(),
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<Vec<T>> {
        let value = self.request(Method::GET, endpoint, Body::Empty).await?;
        decode_list(value)
    }
}

/// Lists come back as `{}` when the backend answers 204; treat anything that is not an array as empty.
fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        other => {
            debug!(body = %other, "expected a list, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn photo_part(photo: &Photo) -> ApiResult<Part> {
    Ok(Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.content_type)?)
}

/// Multipart body for `POST /api/private/session`.
pub fn session_form(submission: &Submission) -> ApiResult<Form> {
    let form = Form::new()
        .text("car_id", submission.car_id.clone())
        .part("photo", photo_part(&submission.photo)?)
        .text("lat", submission.coords.lat.to_string())
        .text("lng", submission.coords.lng.to_string());

    Ok(match &submission.target {
        SessionTarget::Location(id) => form.text("parking_location_id", id.clone()),
        SessionTarget::Manual(mins) => form.text("manual_max_stay_mins", mins.to_string()),
    })
}

#[async_trait]
impl ParkingApi for HttpParkingApi {
    async fn list_cars(&self) -> ApiResult<CarList> {
        self.get("/api/private/car").await
    }

    async fn register_car(&self, car: NewCar) -> ApiResult<Value> {
        let form = Form::new()
            .text("license_plate", car.license_plate)
            .part("photo", photo_part(&car.photo)?);
        self.post("/api/private/car", Body::Multipart(form)).await
    }

    async fn list_locations(&self) -> ApiResult<Vec<crate::models::ParkingLocation>> {
        self.get_list("/api/private/parking").await
    }

    async fn create_location(&self, location: &NewLocation) -> ApiResult<Value> {
        let body = serde_json::to_value(location)?;
        self.post("/api/private/parking", Body::Json(body)).await
    }

    async fn nearby_locations(&self, at: Coordinates) -> ApiResult<ProximityResponse> {
        self.get(&format!(
            "/api/private/parking/proximity?lat={}&lng={}",
            at.lat, at.lng
        ))
        .await
    }

    async fn list_sessions(&self, filter: SessionFilter) -> ApiResult<Vec<SessionRecord>> {
        let endpoint = match filter.as_query() {
            Some(status) => format!("/api/private/session?status={status}"),
            None => "/api/private/session".to_string(),
        };
        self.get_list(&endpoint).await
    }

    async fn get_session(&self, id: &str) -> ApiResult<SessionDetails> {
        self.get(&format!("/api/private/session/{}", urlencoding::encode(id)))
            .await
    }

    async fn create_session(&self, submission: &Submission) -> ApiResult<Value> {
        let form = session_form(submission)?;
        self.post("/api/private/session", Body::Multipart(form)).await
    }

    async fn complete_session(&self, id: &str) -> ApiResult<Value> {
        self.post(
            &format!("/api/private/session/{}/complete", urlencoding::encode(id)),
            Body::Empty,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api(base: &str) -> HttpParkingApi {
        HttpParkingApi::with_client(reqwest::Client::new(), &ClientConfig::new(base))
    }

    #[test]
    fn joins_endpoints_with_a_single_slash() {
        assert_eq!(
            api("http://host:8000/").url("/api/private/car"),
            "http://host:8000/api/private/car"
        );
        assert_eq!(
            api("http://host:8000").url("api/private/car"),
            "http://host:8000/api/private/car"
        );
    }

    #[test]
    fn non_array_list_bodies_decode_as_empty() {
        let sessions: Vec<SessionRecord> = decode_list(json!({})).unwrap();
        assert!(sessions.is_empty());
    }
}
