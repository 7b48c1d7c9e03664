use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use finquest_advisor::LlmError;
use finquest_api::ServiceError;
use std::fmt;

/// Unified API error type.
///
/// Produces `{"error": "<message>"}` JSON responses.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
}

impl ApiErr {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Build a closure that logs a DB/IO error and returns `500 Internal Server Error`.
    pub fn from_db<E: fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| {
            tracing::error!("{context}: {e}");
            Self::internal("internal server error")
        }
    }
}

impl From<ServiceError> for ApiErr {
    fn from(e: ServiceError) -> Self {
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("service error: {e}");
            return Self::internal("internal server error");
        }
        Self {
            status,
            message: e.message().to_string(),
        }
    }
}

impl From<LlmError> for ApiErr {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Rate limits exceeded, please try again later.".into(),
            },
            LlmError::PaymentRequired => Self {
                status: StatusCode::PAYMENT_REQUIRED,
                message: "Payment required, please add credits to continue.".into(),
            },
            LlmError::NotConfigured(reason) => {
                Self::service_unavailable(format!("AI advisor is not configured: {reason}"))
            }
            other => {
                tracing::error!("advisor call failed: {other}");
                Self {
                    status: StatusCode::BAD_GATEWAY,
                    message: "AI advisor request failed".into(),
                }
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_errors_map_to_gateway_statuses() {
        assert_eq!(
            ApiErr::from(LlmError::RateLimited).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiErr::from(LlmError::PaymentRequired).status(),
            StatusCode::PAYMENT_REQUIRED
        );
        let err = ApiErr::from(LlmError::Upstream {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "AI advisor request failed");
        assert_eq!(
            ApiErr::from(LlmError::InvalidResponse("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn internal_service_errors_are_masked() {
        let err = ApiErr::from(ServiceError::Internal("disk on fire".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");

        let err = ApiErr::from(ServiceError::NotFound("expense not found".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "expense not found");
    }
}
