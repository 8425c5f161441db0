use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use schedly_core::AppError;
use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    status: &'static str,
    kind: &'static str,
    message: String,
    retryable: bool,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InvalidTransition(_)
            | AppError::InvalidState(_)
            | AppError::Full(_) => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse {
            status: "error",
            kind: self.0.kind(),
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use schedly_core::AppError;

    use super::ApiError;

    #[test]
    fn lifecycle_failures_map_to_conflict() {
        for error in [
            AppError::InvalidTransition("x".to_owned()),
            AppError::InvalidState("x".to_owned()),
            AppError::Full("x".to_owned()),
            AppError::Conflict("x".to_owned()),
        ] {
            assert_eq!(
                ApiError(error).into_response().status(),
                StatusCode::CONFLICT
            );
        }
    }

    #[test]
    fn storage_outages_are_service_unavailable() {
        let response = ApiError(AppError::StorageUnavailable("db".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
