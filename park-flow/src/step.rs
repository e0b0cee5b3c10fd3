use async_trait::async_trait;

use crate::context::StepContext;
use crate::wizard::WizardStep;

/// A wizard step that may need to load something when it becomes current.
#[async_trait]
pub trait Step: Send {
    /// Which wizard state this step renders.
    fn id(&self) -> WizardStep;

    /// Entry action: positioning, data fetches. Calling it again without a
    /// dependency change does nothing. Failures are kept in the step's state.
    async fn enter(&mut self, ctx: &StepContext);
}

/// Fetch state of a list shown by a step or view.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    Failed(String),
    Loaded(Vec<T>),
}

impl<T> ListState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ListState::Loaded(items) => items,
            ListState::Loading | ListState::Failed(_) => &[],
        }
    }

    /// Loaded and holding nothing, as opposed to still loading or failed.
    pub fn is_empty(&self) -> bool {
        matches!(self, ListState::Loaded(items) if items.is_empty())
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ListState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
