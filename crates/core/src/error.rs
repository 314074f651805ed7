use thiserror::Error;

use crate::model::{NoteError, ProgressError, ScenarioError, StepError, ValidationError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
