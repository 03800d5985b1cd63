use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use taskboard_core::domain::TaskId;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("task {0} is not on the board")]
    TaskNotFound(TaskId),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::TaskNotFound(_) => StatusCode::NOT_FOUND,
        };
        warn!(error = %self, %status, "request failed");
        (status, self.to_string()).into_response()
    }
}
