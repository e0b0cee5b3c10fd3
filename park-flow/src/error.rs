use thiserror::Error;

use crate::wizard::WizardStep;

/// Fallback message when the backend gives no usable `detail`.
pub const GENERIC_REQUEST_FAILURE: &str = "Request failed";

/// Top-level error for everything in this crate.
#[derive(Error, Debug)]
pub enum ParkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Step {step:?} does not accept {input}")]
    InvalidTransition { step: WizardStep, input: &'static str },

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("The wizard has already finished")]
    WizardFinished,

    #[error("Photo capture failed: {0}")]
    Capture(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ParkError {
    /// Text suitable for an inline alert.
    pub fn user_message(&self) -> String {
        match self {
            ParkError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Missing or invalid local input, caught before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Car is required")]
    MissingCar,

    #[error("Photo is required")]
    MissingPhoto,

    #[error(
        "Location coordinates are required even for manual entry. Please ensure location services are enabled."
    )]
    MissingCoordinates,

    #[error("Please enter a parking duration of at least one minute")]
    InvalidDuration,

    #[error("Please provide both license plate and a photo.")]
    IncompleteCar,

    #[error("Please provide a name and pick a location on the map.")]
    IncompleteLocation,

    #[error("{field} must be a positive whole number of minutes")]
    InvalidMinutes { field: &'static str },
}

/// Failures talking to the backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the backend's `detail` or the generic fallback.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A 2xx body that did not match the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Transport(_) | ApiError::Decode(_) => "Something went wrong".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParkError>;
