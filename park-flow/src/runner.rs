//! WizardRunner: the wizard plus the collaborators it needs to submit.
//!
//! Steps are built fresh from the draft each time they become current, so
//! going back re-renders a step with what was already collected. The runner
//! owns the only mutable [`Wizard`]; steps hand it [`WizardInput`]s.
//!
//! ```rust,ignore
//! let mut runner = WizardRunner::new(ctx);
//! let mut photo = runner.photo_step();
//! photo.enter(runner.ctx()).await;
//! photo.set_photo(captured);
//! runner.apply(photo.confirm().unwrap())?;
//! // ... car, location, details ...
//! let created = runner.submit(&details).await?;
//! ```

use serde_json::Value;
use tracing::{error, info};

use crate::context::StepContext;
use crate::error::Result;
use crate::steps::{CarStep, DetailsStep, LocationStep, PhotoStep};
use crate::wizard::{Wizard, WizardInput, WizardStep};

pub struct WizardRunner {
    wizard: Wizard,
    ctx: StepContext,
}

impl WizardRunner {
    pub fn new(ctx: StepContext) -> Self {
        Self {
            wizard: Wizard::new(),
            ctx,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn ctx(&self) -> &StepContext {
        &self.ctx
    }

    pub fn step(&self) -> WizardStep {
        self.wizard.step()
    }

    pub fn apply(&mut self, input: WizardInput) -> Result<WizardStep> {
        self.wizard.apply(input)
    }

    pub fn back(&mut self) -> Result<WizardStep> {
        self.wizard.back()
    }

    pub fn photo_step(&self) -> PhotoStep {
        PhotoStep::new(self.wizard.draft().photo.clone())
    }

    pub fn car_step(&self) -> CarStep {
        CarStep::new(self.wizard.draft().car.as_ref())
    }

    pub fn location_step(&self) -> LocationStep {
        LocationStep::new()
    }

    /// Prefilled with a previously entered manual duration.
    pub fn details_step(&self) -> DetailsStep {
        let mut details = DetailsStep::new();
        if let Some(mins) = self.wizard.draft().manual_max_stay_mins {
            details.set_duration_input(mins.to_string());
        }
        details
    }

    /// Write the typed duration into the draft so a rebuilt details step shows it again.
    pub fn keep_details(&mut self, details: &DetailsStep) -> Result<()> {
        self.wizard.set_manual_duration(details.manual_minutes())
    }

    /// Validate, send, and settle. The draft survives a rejected submission
    /// so the caller can fix it and try again.
    pub async fn submit(&mut self, details: &DetailsStep) -> Result<Value> {
        self.keep_details(details)?;
        let submission = self.wizard.begin_submit()?;
        let wizard_id = self.wizard.id();
        info!(%wizard_id, car_id = %submission.car_id, target = ?submission.target, "submitting session");

        match self.ctx.api().create_session(&submission).await {
            Ok(created) => {
                self.wizard.finish_submit(Ok(()));
                Ok(created)
            }
            Err(e) => {
                error!(%wizard_id, error = %e, "create session failed");
                self.wizard.finish_submit(Err(e.user_message()));
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for WizardRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardRunner")
            .field("wizard", &self.wizard)
            .finish_non_exhaustive()
    }
}
