pub mod api;
pub mod capture;
pub mod config;
pub mod context;
pub mod draft;
pub mod error;
pub mod format;
pub mod geo;
pub mod memory;
pub mod models;
pub mod runner;
pub mod step;
pub mod steps;
pub mod timer;
pub mod views;
pub mod wizard;

// Re-export commonly used types
pub use api::{HttpParkingApi, ParkingApi};
pub use config::ClientConfig;
pub use context::StepContext;
pub use draft::{SessionDraft, SessionTarget, Submission};
pub use error::{ApiError, ParkError, Result, ValidationError};
pub use geo::{FixedGeolocator, Geolocator, NoGeolocator, Position, Unavailable};
pub use memory::InMemoryParkingApi;
pub use models::{
    Car, Coordinates, ParkingLocation, Photo, SessionDetails, SessionFilter, SessionRecord,
};
pub use runner::WizardRunner;
pub use step::{ListState, Step};
pub use timer::{Countdown, Remaining};
pub use wizard::{Wizard, WizardInput, WizardStep};
