mod board;
mod service;

pub use crate::error::ProgressServiceError;
pub use board::{ProgressBoard, RequestStatus};
pub use service::ProgressService;
