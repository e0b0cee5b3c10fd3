//! The session wizard as an explicit state machine.
//!
//! [`transition`] is the whole transition table: a pure function from the
//! current step, the draft and an input to the next draft and step.
//! [`Wizard`] wraps it with the bookkeeping around submission (the surfaced
//! error, the in-flight flag, discarding the draft once the backend accepts it).

use tracing::{debug, info};
use uuid::Uuid;

use crate::draft::{SessionDraft, Submission};
use crate::error::{ParkError, Result};
use crate::models::{Car, Coordinates, ParkingLocation, Photo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Photo = 1,
    Car = 2,
    Location = 3,
    Details = 4,
}

impl WizardStep {
    pub const COUNT: u8 = 4;

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The step before this one; `Photo` stays put.
    pub fn previous(self) -> WizardStep {
        match self {
            WizardStep::Photo | WizardStep::Car => WizardStep::Photo,
            WizardStep::Location => WizardStep::Car,
            WizardStep::Details => WizardStep::Location,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Photo => "Take a Photo",
            WizardStep::Car => "Select Vehicle",
            WizardStep::Location => "Select Location",
            WizardStep::Details => "Confirm Details",
        }
    }
}

/// What a step hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardInput {
    PhotoCaptured {
        photo: Photo,
        coords: Option<Coordinates>,
    },
    CarSelected(Car),
    LocationSelected {
        location: ParkingLocation,
        coords: Option<Coordinates>,
    },
    /// The user's spot is not in the list.
    NoMatchingLocation {
        coords: Option<Coordinates>,
    },
    Back,
}

impl WizardInput {
    pub fn name(&self) -> &'static str {
        match self {
            WizardInput::PhotoCaptured { .. } => "PhotoCaptured",
            WizardInput::CarSelected(_) => "CarSelected",
            WizardInput::LocationSelected { .. } => "LocationSelected",
            WizardInput::NoMatchingLocation { .. } => "NoMatchingLocation",
            WizardInput::Back => "Back",
        }
    }
}

/// Apply one input to the draft. Inputs the current step does not accept are rejected.
pub fn transition(
    step: WizardStep,
    draft: &SessionDraft,
    input: WizardInput,
) -> Result<(SessionDraft, WizardStep)> {
    let mut next = draft.clone();

    let step_after = match (step, input) {
        (_, WizardInput::Back) => step.previous(),

        (WizardStep::Photo, WizardInput::PhotoCaptured { photo, coords }) => {
            next.photo = Some(photo);
            next.merge_coords(coords);
            WizardStep::Car
        }

        (WizardStep::Car, WizardInput::CarSelected(car)) => {
            next.car = Some(car);
            WizardStep::Location
        }

        (WizardStep::Location, WizardInput::LocationSelected { location, coords }) => {
            next.location = Some(location);
            next.manual_max_stay_mins = None;
            next.merge_coords(coords);
            WizardStep::Details
        }

        (WizardStep::Location, WizardInput::NoMatchingLocation { coords }) => {
            next.location = None;
            next.merge_coords(coords);
            WizardStep::Details
        }

        (step, input) => {
            return Err(ParkError::InvalidTransition {
                step,
                input: input.name(),
            });
        }
    };

    Ok((next, step_after))
}

/// One wizard invocation: current step, draft, and submission state.
#[derive(Debug)]
pub struct Wizard {
    id: Uuid,
    step: WizardStep,
    draft: SessionDraft,
    error: Option<String>,
    submitting: bool,
    finished: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::Photo,
            draft: SessionDraft::new(),
            error: None,
            submitting: false,
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &SessionDraft {
        &self.draft
    }

    /// Message for the alert shown above the current step.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn progress_percent(&self) -> f32 {
        f32::from(self.step.ordinal()) / f32::from(WizardStep::COUNT) * 100.0
    }

    pub fn progress_label(&self) -> String {
        format!("Step {} of {}", self.step.ordinal(), WizardStep::COUNT)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.finished {
            return Err(ParkError::WizardFinished);
        }
        if self.submitting {
            return Err(ParkError::SubmissionInFlight);
        }
        Ok(())
    }

    pub fn apply(&mut self, input: WizardInput) -> Result<WizardStep> {
        self.ensure_idle()?;

        let input_name = input.name();
        let is_back = matches!(input, WizardInput::Back);
        let (draft, step) = transition(self.step, &self.draft, input)?;

        debug!(wizard_id = %self.id, from = ?self.step, to = ?step, input = input_name, "wizard transition");
        self.draft = draft;
        self.step = step;
        if is_back {
            self.error = None;
        }
        Ok(step)
    }

    pub fn back(&mut self) -> Result<WizardStep> {
        self.apply(WizardInput::Back)
    }

    /// Record the duration typed into the details step. Only meaningful for manual sessions.
    pub fn set_manual_duration(&mut self, minutes: Option<u32>) -> Result<()> {
        self.ensure_idle()?;
        if self.step != WizardStep::Details {
            return Err(ParkError::InvalidTransition {
                step: self.step,
                input: "ManualDuration",
            });
        }
        self.draft.manual_max_stay_mins = if self.draft.is_manual() { minutes } else { None };
        Ok(())
    }

    /// Validate and mark a submission as in flight. On a validation failure the
    /// message is surfaced and nothing is dispatched.
    pub fn begin_submit(&mut self) -> Result<Submission> {
        self.ensure_idle()?;
        if self.step != WizardStep::Details {
            return Err(ParkError::InvalidTransition {
                step: self.step,
                input: "Submit",
            });
        }

        match self.draft.validate() {
            Ok(submission) => {
                self.error = None;
                self.submitting = true;
                Ok(submission)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Settle an in-flight submission. Success discards the draft; failure keeps it for a retry.
    pub fn finish_submit(&mut self, outcome: std::result::Result<(), String>) {
        self.submitting = false;
        match outcome {
            Ok(()) => {
                info!(wizard_id = %self.id, "session created, discarding draft");
                self.draft = SessionDraft::new();
                self.error = None;
                self.finished = true;
            }
            Err(message) => {
                info!(wizard_id = %self.id, %message, "submission failed, draft kept for retry");
                self.error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::fixtures::*;
    use crate::error::ValidationError;

    fn at_details() -> Wizard {
        let mut wizard = Wizard::new();
        wizard
            .apply(WizardInput::PhotoCaptured {
                photo: photo(),
                coords: Some(Coordinates::new(51.5, -0.1)),
            })
            .unwrap();
        wizard.apply(WizardInput::CarSelected(car("c1", "AB12 CDE"))).unwrap();
        wizard
            .apply(WizardInput::LocationSelected {
                location: location("loc-1", "Home", 51.5, -0.1),
                coords: None,
            })
            .unwrap();
        wizard
    }

    #[test]
    fn walks_the_steps_in_order() {
        let wizard = at_details();
        assert_eq!(wizard.step(), WizardStep::Details);
        assert_eq!(wizard.progress_label(), "Step 4 of 4");
        assert_eq!(wizard.progress_percent(), 100.0);
        // coords reported at the photo step survive a location step that had none
        assert_eq!(wizard.draft().user_coords, Some(Coordinates::new(51.5, -0.1)));
    }

    #[test]
    fn back_keeps_collected_data() {
        let mut wizard = at_details();
        assert_eq!(wizard.back().unwrap(), WizardStep::Location);
        assert_eq!(wizard.back().unwrap(), WizardStep::Car);
        assert!(wizard.draft().photo.is_some());
        assert!(wizard.draft().car.is_some());
    }

    #[test]
    fn back_from_photo_is_idempotent() {
        let mut wizard = Wizard::new();
        assert_eq!(wizard.back().unwrap(), WizardStep::Photo);
        assert_eq!(wizard.back().unwrap(), WizardStep::Photo);
        assert_eq!(wizard.draft(), &SessionDraft::new());
    }

    #[test]
    fn rejects_inputs_for_other_steps() {
        let mut wizard = Wizard::new();
        let err = wizard
            .apply(WizardInput::CarSelected(car("c1", "AB12 CDE")))
            .unwrap_err();
        assert!(matches!(
            err,
            ParkError::InvalidTransition {
                step: WizardStep::Photo,
                input: "CarSelected"
            }
        ));
        assert_eq!(wizard.step(), WizardStep::Photo);
    }

    #[test]
    fn no_matching_location_clears_the_location() {
        let draft = SessionDraft {
            location: Some(location("loc-1", "Home", 1.0, 1.0)),
            ..SessionDraft::new()
        };
        let (next, step) = transition(
            WizardStep::Location,
            &draft,
            WizardInput::NoMatchingLocation {
                coords: Some(Coordinates::new(2.0, 2.0)),
            },
        )
        .unwrap();
        assert_eq!(step, WizardStep::Details);
        assert!(next.location.is_none());
        assert_eq!(next.user_coords, Some(Coordinates::new(2.0, 2.0)));
    }

    #[test]
    fn selecting_a_location_clears_the_manual_duration() {
        let draft = SessionDraft {
            manual_max_stay_mins: Some(30),
            ..SessionDraft::new()
        };
        let (next, _) = transition(
            WizardStep::Location,
            &draft,
            WizardInput::LocationSelected {
                location: location("loc-1", "Home", 1.0, 1.0),
                coords: None,
            },
        )
        .unwrap();
        assert_eq!(next.manual_max_stay_mins, None);
    }

    #[test]
    fn validation_failure_surfaces_an_error_without_submitting() {
        let mut wizard = Wizard::new();
        wizard
            .apply(WizardInput::PhotoCaptured {
                photo: photo(),
                coords: None,
            })
            .unwrap();
        wizard.apply(WizardInput::CarSelected(car("c1", "AB12 CDE"))).unwrap();
        wizard
            .apply(WizardInput::NoMatchingLocation { coords: None })
            .unwrap();
        wizard.set_manual_duration(Some(60)).unwrap();

        let err = wizard.begin_submit().unwrap_err();
        assert!(matches!(
            err,
            ParkError::Validation(ValidationError::MissingCoordinates)
        ));
        assert!(!wizard.is_submitting());
        assert!(wizard.error().is_some());

        // back clears the surfaced error
        wizard.back().unwrap();
        assert!(wizard.error().is_none());
    }

    #[test]
    fn failed_submission_keeps_the_draft() {
        let mut wizard = at_details();
        wizard.begin_submit().unwrap();
        assert!(matches!(wizard.back(), Err(ParkError::SubmissionInFlight)));

        wizard.finish_submit(Err("Car not found".to_string()));
        assert_eq!(wizard.error(), Some("Car not found"));
        assert_eq!(wizard.step(), WizardStep::Details);
        assert!(wizard.draft().car.is_some());

        wizard.begin_submit().unwrap();
        wizard.finish_submit(Ok(()));
        assert!(wizard.is_finished());
        assert_eq!(wizard.draft(), &SessionDraft::new());
        assert!(matches!(wizard.back(), Err(ParkError::WizardFinished)));
    }

    #[test]
    fn manual_duration_is_ignored_for_catalog_locations() {
        let mut wizard = at_details();
        wizard.set_manual_duration(Some(15)).unwrap();
        assert_eq!(wizard.draft().manual_max_stay_mins, None);
    }
}
