mod draw;
mod store;
mod workflow;

pub use crate::error::QuizError;
pub use draw::draw;
pub use store::ScenarioQuizStore;
pub use workflow::{DEFAULT_QUIZ_SIZE, ScenarioQuizService, SubmitOutcome};
