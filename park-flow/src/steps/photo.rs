use async_trait::async_trait;
use tracing::warn;

use crate::context::StepContext;
use crate::geo::Position;
use crate::models::{Coordinates, Photo};
use crate::step::Step;
use crate::wizard::{WizardInput, WizardStep};

pub const LOCATION_ADVISORY: &str = "Unable to get your location. You can still continue.";

/// Step 1: capture the parking photo, and the position if the device has one.
#[derive(Debug, Default)]
pub struct PhotoStep {
    photo: Option<Photo>,
    coords: Option<Coordinates>,
    advisory: Option<String>,
    located: bool,
}

impl PhotoStep {
    /// `initial` is the photo already in the draft when coming back to this step.
    pub fn new(initial: Option<Photo>) -> Self {
        Self {
            photo: initial,
            ..Self::default()
        }
    }

    pub fn set_photo(&mut self, photo: Photo) {
        self.photo = Some(photo);
    }

    pub fn clear(&mut self) {
        self.photo = None;
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn coords(&self) -> Option<Coordinates> {
        self.coords
    }

    /// Shown when positioning failed; it never blocks continuing.
    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn can_continue(&self) -> bool {
        self.photo.is_some()
    }

    /// `None` until a photo has been captured.
    pub fn confirm(&self) -> Option<WizardInput> {
        self.photo.clone().map(|photo| WizardInput::PhotoCaptured {
            photo,
            coords: self.coords,
        })
    }
}

#[async_trait]
impl Step for PhotoStep {
    fn id(&self) -> WizardStep {
        WizardStep::Photo
    }

    async fn enter(&mut self, ctx: &StepContext) {
        if self.located {
            return;
        }
        self.located = true;

        match ctx.geolocator().current_position().await {
            Position::Available(coords) => {
                self.coords = Some(coords);
                self.advisory = None;
            }
            Position::Unavailable(reason) => {
                warn!(%reason, "no position for the photo step");
                self.advisory = Some(LOCATION_ADVISORY.to_string());
            }
        }
    }
}
