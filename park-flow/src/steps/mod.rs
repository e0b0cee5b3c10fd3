pub mod car;
pub mod details;
pub mod location;
pub mod photo;

pub use car::CarStep;
pub use details::{DetailsStep, DetailsSummary};
pub use location::{LocationStep, ViewMode};
pub use photo::PhotoStep;
