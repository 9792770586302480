//! Mapping of use-case errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::ValueObjectError,
    hub::HubError,
    infrastructure::dto::http::ErrorResponse,
    usecase::{JoinError, SuperChatError},
};

/// Rejected request, rendered as `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(e: ValueObjectError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl From<HubError> for ApiError {
    fn from(e: HubError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::Unauthorized(_) => Self::new(StatusCode::UNAUTHORIZED, e.to_string()),
            JoinError::HubStopped(e) => e.into(),
        }
    }
}

impl From<SuperChatError> for ApiError {
    fn from(e: SuperChatError) -> Self {
        let status = match &e {
            SuperChatError::Anonymous => StatusCode::FORBIDDEN,
            SuperChatError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SuperChatError::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            SuperChatError::HubStopped(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, e.to_string())
    }
}
