#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod catalog;
pub mod config;
pub mod course_steps;
mod epoch;
pub mod error;
pub mod progress;
pub mod remote;
pub mod scenarios;

pub use learnaid_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, AuthSession};
pub use catalog::{CatalogService, CourseCatalog};
pub use config::ApiConfig;
pub use course_steps::{CourseStepService, CourseStepStore, StorePhase};
pub use epoch::LoadTicket;
pub use error::{
    ApiError, AppServicesError, AuthError, CatalogError, CourseStepError, ProgressServiceError,
    QuizError,
};
pub use progress::{ProgressBoard, ProgressService, RequestStatus};
pub use remote::{HttpClient, InMemoryBackend, Remote};
pub use scenarios::{DEFAULT_QUIZ_SIZE, ScenarioQuizService, ScenarioQuizStore, SubmitOutcome};
