use async_trait::async_trait;
use tracing::{error, info};

use crate::context::StepContext;
use crate::models::Car;
use crate::step::{ListState, Step};
use crate::wizard::{WizardInput, WizardStep};

pub const LOAD_FAILED: &str = "Failed to load your cars";
pub const EMPTY_MESSAGE: &str = "You don't have any cars registered.";
pub const EMPTY_ACTION: &str = "Add a car first with `park cars add`";

/// Step 2: pick one of the caller's registered vehicles.
#[derive(Debug)]
pub struct CarStep {
    state: ListState<Car>,
    selected_id: Option<String>,
    loaded: bool,
}

impl CarStep {
    pub fn new(selected: Option<&Car>) -> Self {
        Self {
            state: ListState::Loading,
            selected_id: selected.map(|car| car.id.clone()),
            loaded: false,
        }
    }

    pub fn state(&self) -> &ListState<Car> {
        &self.state
    }

    pub fn is_selected(&self, car: &Car) -> bool {
        self.selected_id.as_deref() == Some(car.id.as_str())
    }

    /// Selecting emits straight away; there is no confirm.
    pub fn select(&mut self, car_id: &str) -> Option<WizardInput> {
        let car = self
            .state
            .items()
            .iter()
            .find(|car| car.id == car_id)?
            .clone();
        self.selected_id = Some(car.id.clone());
        Some(WizardInput::CarSelected(car))
    }

    pub async fn retry(&mut self, ctx: &StepContext) {
        self.loaded = false;
        self.enter(ctx).await;
    }
}

#[async_trait]
impl Step for CarStep {
    fn id(&self) -> WizardStep {
        WizardStep::Car
    }

    async fn enter(&mut self, ctx: &StepContext) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        self.state = ListState::Loading;

        self.state = match ctx.api().list_cars().await {
            Ok(list) => {
                let cars = list.resolved();
                info!(count = cars.len(), "loaded cars");
                ListState::Loaded(cars)
            }
            Err(e) => {
                error!(error = %e, "failed to load cars");
                ListState::Failed(LOAD_FAILED.to_string())
            }
        };
    }
}
