//! Device positioning as a capability.
//!
//! Asking for the position never fails: callers get [`Position::Unavailable`]
//! and pick a fallback instead of handling an error.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::models::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// No positioning facility on this device.
    Unsupported,
    PermissionDenied,
    Timeout,
    Failed,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Unavailable::Unsupported => "geolocation is not supported on this device",
            Unavailable::PermissionDenied => "permission to read the location was denied",
            Unavailable::Timeout => "timed out waiting for a location fix",
            Unavailable::Failed => "the location could not be determined",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Available(Coordinates),
    Unavailable(Unavailable),
}

impl Position {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Position::Available(coords) => Some(*coords),
            Position::Unavailable(_) => None,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Position;
}

/// Reports a position supplied up front (flags, environment).
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator {
    coords: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Position {
        Position::Available(self.coords)
    }
}

/// Always unavailable, for devices without positioning.
#[derive(Debug, Clone, Copy)]
pub struct NoGeolocator {
    reason: Unavailable,
}

impl NoGeolocator {
    pub fn new(reason: Unavailable) -> Self {
        Self { reason }
    }
}

impl Default for NoGeolocator {
    fn default() -> Self {
        Self::new(Unavailable::Unsupported)
    }
}

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn current_position(&self) -> Position {
        Position::Unavailable(self.reason)
    }
}

/// Builds a geolocator from an optional `(lat, lng)` pair.
pub fn from_optional(lat: Option<f64>, lng: Option<f64>) -> Arc<dyn Geolocator> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Arc::new(FixedGeolocator::new(Coordinates::new(lat, lng))),
        _ => Arc::new(NoGeolocator::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_and_missing_positions() {
        let fixed = from_optional(Some(51.5), Some(-0.1));
        assert_eq!(
            fixed.current_position().await.coordinates(),
            Some(Coordinates::new(51.5, -0.1))
        );

        let half = from_optional(Some(51.5), None);
        assert_eq!(
            half.current_position().await,
            Position::Unavailable(Unavailable::Unsupported)
        );
    }
}
