// HTTP error mapping
use crate::domain::error::ReadingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Reading(#[from] ReadingError),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Reading(err) => match err {
                ReadingError::UnknownMeter(_) => StatusCode::NOT_FOUND,
                ReadingError::InvalidInput { .. } | ReadingError::SaveBlocked(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ReadingError::NothingToSave => StatusCode::BAD_REQUEST,
                ReadingError::SaveInFlight | ReadingError::NotAwaitingApproval(_) => {
                    StatusCode::CONFLICT
                }
                ReadingError::PersistenceFailure { .. } => StatusCode::BAD_GATEWAY,
                ReadingError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Reading(err) => match err {
                ReadingError::UnknownMeter(_) => "UNKNOWN_METER",
                ReadingError::InvalidInput { .. } => "INVALID_INPUT",
                ReadingError::SaveBlocked(_) => "SAVE_BLOCKED",
                ReadingError::NothingToSave => "NOTHING_TO_SAVE",
                ReadingError::SaveInFlight => "SAVE_IN_FLIGHT",
                ReadingError::NotAwaitingApproval(_) => "NOT_AWAITING_APPROVAL",
                ReadingError::PersistenceFailure { .. } => "PERSISTENCE_FAILURE",
                ReadingError::TimedOut { .. } => "TIMED_OUT",
            },
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, "Internal server error"),
            _ => tracing::warn!(error = %self, "API error"),
        }

        let body = ErrorBody {
            code: self.error_code(),
            // Don't leak store details
            message: match &self {
                Self::Internal(_) => "An internal error occurred".to_string(),
                other => other.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ReadingError::UnknownMeter("x".into()), StatusCode::NOT_FOUND),
            (ReadingError::SaveBlocked(2), StatusCode::UNPROCESSABLE_ENTITY),
            (
                ReadingError::TimedOut {
                    meter_id: "x".into(),
                    after: Duration::from_secs(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ReadingError::NotAwaitingApproval("x".into()),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
