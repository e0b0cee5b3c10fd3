//! Screens outside the wizard: vehicles, saved locations, the session dashboard and detail.

pub mod cars;
pub mod locations;
pub mod sessions;

pub use cars::{CarForm, CarLine};
pub use locations::{DEFAULT_POSITION, LocationForm};
pub use sessions::{SessionCard, SessionLines};
