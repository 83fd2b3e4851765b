use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the whole service. Every handler returns
/// `Result<_, AppError>` and each flow surfaces exactly one human-readable
/// message; internal detail stays in the logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Authentication(&'static str),

    #[error("User already registered. Please sign in.")]
    DuplicateAccount,

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("An unexpected error occurred")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::DuplicateAccount => StatusCode::CONFLICT,
            AppError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Unexpected(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unexpected(ref e) = self {
            error!(error = %e, "unexpected error");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Postgres unique-violation (SQLSTATE 23505); the authoritative duplicate
/// rejection behind the signup pre-check.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::Authentication("You must be logged in to do that").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::DuplicateAccount.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Upload("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::NotFound("room").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Forbidden("owners only").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation("price must be a number".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unexpected(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unexpected_message_does_not_leak_detail() {
        let e = AppError::Unexpected(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(e.to_string(), "An unexpected error occurred");
    }

    #[test]
    fn not_found_names_the_target() {
        assert_eq!(AppError::NotFound("room").to_string(), "room not found");
    }
}
