use crate::domain::RsvpError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Wrapper type for successful API responses.
///
/// Encapsulates the data payload and prepares it for JSON serialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    // ---
    pub error: String,
}

/// Error half of handler results.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    // ---
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Extractor rejection rendered as an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct Rejection {
    // ---
    status: StatusCode,
    message: String,
}

macro_rules! rejection_from {
    // ---
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for Rejection {
                fn from(rejection: $rejection) -> Self {
                    Self {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

rejection_from!(JsonRejection, PathRejection, QueryRejection);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        api_error(self.status, self.message).into_response()
    }
}

/// `Query` whose failures answer with `{ "error": ... }`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Rejection))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose failures answer with `{ "error": ... }`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Rejection))]
pub struct ApiPath<T>(pub T);

/// `Json` whose failures answer with `{ "error": ... }`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Rejection))]
pub struct ApiJson<T>(pub T);

/// Map a domain error onto an HTTP status, logging backend failures.
pub fn rsvp_error(err: RsvpError) -> ApiError {
    // ---
    match err {
        RsvpError::InvalidIdentity => api_error(StatusCode::BAD_REQUEST, err.to_string()),
        RsvpError::EventNotFound(_) => api_error(StatusCode::NOT_FOUND, err.to_string()),
        RsvpError::Backend(ref cause) => {
            tracing::error!("Backend failure: {cause:#}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}
