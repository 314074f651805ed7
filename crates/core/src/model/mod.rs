mod auth;
mod course;
mod ids;
mod notes;
mod progress;
mod scenario;
mod step;

pub use auth::{
    AuthResponse, FieldError, LoginForm, SignupForm, User, ValidationError, MIN_PASSWORD_LEN,
};
pub use course::{CourseListItem, CourseOverview};
pub use ids::{CourseId, ModuleId, NoteId, ParseIdError, ScenarioId, StepId, UserId};
pub use notes::{Note, NoteError, Notes};
pub use progress::{
    Confidence, ModuleProgress, Percent, ProgressError, ProgressSnapshot, ProgressUpdate,
};
pub use scenario::{Scenario, ScenarioAttempt, ScenarioError};
pub use step::{CourseSteps, Step, StepError, StepKind};
