mod store;
mod workflow;

pub use crate::error::CourseStepError;
pub use store::{CourseStepStore, StorePhase};
pub use workflow::CourseStepService;
