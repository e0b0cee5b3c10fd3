use async_trait::async_trait;

use crate::context::StepContext;
use crate::draft::SessionDraft;
use crate::format::format_duration;
use crate::step::Step;
use crate::wizard::WizardStep;

/// Step 4: review, and enter a duration when the spot is not a catalog location.
#[derive(Debug, Default)]
pub struct DetailsStep {
    duration_input: String,
}

/// Read-only lines shown above the submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsSummary {
    pub vehicle: String,
    /// `None` in manual mode.
    pub location: Option<String>,
    pub max_stay: Option<String>,
    pub photo: Option<String>,
}

impl DetailsStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_duration_input(&mut self, raw: impl Into<String>) {
        self.duration_input = raw.into();
    }

    pub fn duration_input(&self) -> &str {
        &self.duration_input
    }

    /// The typed duration if it is a positive whole number of minutes.
    pub fn manual_minutes(&self) -> Option<u32> {
        self.duration_input
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|mins| *mins > 0)
    }

    pub fn can_submit(&self, draft: &SessionDraft, submitting: bool) -> bool {
        if submitting {
            return false;
        }
        !draft.is_manual() || self.manual_minutes().is_some()
    }

    pub fn summary(&self, draft: &SessionDraft) -> DetailsSummary {
        let location = draft.location.as_ref().filter(|_| !draft.is_manual());
        DetailsSummary {
            vehicle: draft
                .car
                .as_ref()
                .map(|car| car.license_plate.clone())
                .unwrap_or_else(|| "No Car Selected".to_string()),
            location: location.map(|loc| loc.name.clone()),
            max_stay: location
                .map(|loc| format!("Max Stay: {}", format_duration(loc.max_stay.unwrap_or(0)))),
            photo: draft.photo.as_ref().map(|photo| photo.file_name.clone()),
        }
    }
}

#[async_trait]
impl Step for DetailsStep {
    fn id(&self) -> WizardStep {
        WizardStep::Details
    }

    async fn enter(&mut self, _ctx: &StepContext) {}
}
