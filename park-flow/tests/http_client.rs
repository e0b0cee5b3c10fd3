//! HttpParkingApi against an in-process axum backend.

use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use park_flow::api::{HttpParkingApi, ParkingApi};
use park_flow::draft::{SessionTarget, Submission};
use park_flow::models::NewLocation;
use park_flow::{ApiError, ClientConfig, Coordinates, Photo, SessionFilter};

#[derive(Debug, Clone, Default)]
struct Seen {
    route: String,
    cookie: Option<String>,
    content_type: Option<String>,
    fields: Vec<(String, String)>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Seen>>>);

impl Recorder {
    fn push(&self, route: &str, headers: &HeaderMap, fields: Vec<(String, String)>) {
        let text = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.0.lock().unwrap().push(Seen {
            route: route.to_string(),
            cookie: text(header::COOKIE),
            content_type: text(header::CONTENT_TYPE),
            fields,
        });
    }

    fn last(&self, route: &str) -> Seen {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|seen| seen.route == route)
            .cloned()
            .unwrap()
    }
}

async fn list_cars(State(rec): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    rec.push("list_cars", &headers, vec![]);
    Json(json!({
        "cars": [{"id": "c1", "license_plate": "AB12 CDE", "photo_filename": "c1.jpg"}],
        "base_url": "https://cdn.test/cars/"
    }))
}

async fn list_locations() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn create_location(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    rec.push("create_location", &headers, vec![]);
    (StatusCode::CREATED, Json(body))
}

async fn proximity(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let fields = query.into_iter().collect();
    rec.push("proximity", &headers, fields);
    Json(json!({
        "saved": [{"id": "l1", "name": "Home", "lat": 51.5, "lng": -0.1, "distance": 12.5}],
        "public": []
    }))
}

async fn list_sessions(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    match query.get("status").map(String::as_str) {
        // 200 with no body at all
        Some("active") => StatusCode::OK.into_response(),
        _ => Json(json!([{
            "_id": "s-legacy",
            "car_id": "c1",
            "start_time": "2025-03-01T10:00:00",
            "end_time": "2025-03-01T12:00:00",
            "status": "completed"
        }]))
        .into_response(),
    }
}

async fn create_session(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let value = match file_name {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.unwrap();
                format!("{file_name}|{content_type}|{}", bytes.len())
            }
            None => field.text().await.unwrap(),
        };
        fields.push((name, value));
    }

    let missing_car = fields.iter().any(|(k, v)| k == "car_id" && v == "missing");
    rec.push("create_session", &headers, fields);

    if missing_car {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Car not found"})),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({"id": "s1", "status": "active"}))).into_response()
}

async fn complete_session() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn spawn_backend() -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/api/private/car", get(list_cars))
        .route(
            "/api/private/parking",
            get(list_locations).post(create_location),
        )
        .route("/api/private/parking/proximity", get(proximity))
        .route(
            "/api/private/session",
            get(list_sessions).post(create_session),
        )
        .route("/api/private/session/{id}/complete", post(complete_session))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), recorder)
}

fn submission(car_id: &str, target: SessionTarget) -> Submission {
    Submission {
        car_id: car_id.to_string(),
        photo: Photo::new("spot.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]),
        coords: Coordinates::new(51.5, -0.1),
        target,
    }
}

#[tokio::test]
async fn sends_cookie_and_json_content_type() {
    let (base, rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base).with_session_cookie("session=abc")).unwrap();

    let cars = api.list_cars().await.unwrap().resolved();
    assert_eq!(
        cars[0].photo_url.as_deref(),
        Some("https://cdn.test/cars/c1.jpg")
    );

    let seen = rec.last("list_cars");
    assert_eq!(seen.cookie.as_deref(), Some("session=abc"));
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn create_session_is_multipart_with_all_fields() {
    let (base, rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    let created = api
        .create_session(&submission("c1", SessionTarget::Location("loc-1".into())))
        .await
        .unwrap();
    assert_eq!(created["id"], "s1");

    let seen = rec.last("create_session");
    assert!(
        seen.content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );
    let fields: HashMap<_, _> = seen.fields.into_iter().collect();
    assert_eq!(fields["car_id"], "c1");
    assert_eq!(fields["lat"], "51.5");
    assert_eq!(fields["lng"], "-0.1");
    assert_eq!(fields["parking_location_id"], "loc-1");
    assert_eq!(fields["photo"], "spot.jpg|image/jpeg|3");
    assert!(!fields.contains_key("manual_max_stay_mins"));
}

#[tokio::test]
async fn manual_session_sends_duration_instead_of_location() {
    let (base, rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    api.create_session(&submission("c1", SessionTarget::Manual(45)))
        .await
        .unwrap();

    let fields: HashMap<_, _> = rec.last("create_session").fields.into_iter().collect();
    assert_eq!(fields["manual_max_stay_mins"], "45");
    assert!(!fields.contains_key("parking_location_id"));
}

#[tokio::test]
async fn backend_detail_is_surfaced_verbatim() {
    let (base, _rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    let err = api
        .create_session(&submission("missing", SessionTarget::Manual(30)))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Car not found");
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_generic_message() {
    let (base, _rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    match api.list_locations().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Request failed");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_content_resolves_to_an_empty_object() {
    let (base, _rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    let body = api.complete_session("s1").await.unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn empty_list_body_is_an_empty_list() {
    let (base, _rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    assert!(api.list_sessions(SessionFilter::Active).await.unwrap().is_empty());

    let all = api.list_sessions(SessionFilter::All).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id(), "s-legacy");
}

#[tokio::test]
async fn create_location_posts_json() {
    let (base, rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    let echoed = api
        .create_location(&NewLocation {
            name: "Office".to_string(),
            lat: 51.5,
            lng: -0.1,
            max_stay: Some(90),
            no_return_time: None,
            is_public: true,
            fee_classification: "free".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(echoed["name"], "Office");
    assert_eq!(echoed["max_stay"], 90);
    assert_eq!(echoed["fee_classification"], "free");
    assert!(
        rec.last("create_location")
            .content_type
            .unwrap()
            .starts_with("application/json")
    );
}

#[tokio::test]
async fn proximity_search_passes_coordinates_as_query() {
    let (base, rec) = spawn_backend().await;
    let api = HttpParkingApi::new(&ClientConfig::new(base)).unwrap();

    let nearby = api
        .nearby_locations(Coordinates::new(51.5, -0.1))
        .await
        .unwrap();
    assert_eq!(nearby.saved[0].distance, Some(12.5));

    let query: HashMap<_, _> = rec.last("proximity").fields.into_iter().collect();
    assert_eq!(query["lat"], "51.5");
    assert_eq!(query["lng"], "-0.1");
}
