use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One failed input check, tied to the field it belongs to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Everything that can go wrong inside the user-facing flows. Each variant
/// maps to exactly one HTTP response, so handlers only ever `?` and return.
#[derive(Debug, Error)]
pub enum FlowError {
    /// An authenticated user hit a route meant for anonymous visitors.
    #[error("already authenticated")]
    AlreadyAuthenticated,

    /// An anonymous caller hit a route that needs a session. Carries the
    /// requested path so the login page can send the user back afterwards.
    #[error("login required")]
    LoginRequired { next: String },

    /// Deliberately generic: the response never says whether the email or
    /// the password was the wrong half.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired reset token")]
    InvalidResetToken,

    #[error("username already taken")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    #[error("user not found")]
    UserNotFound,

    #[error("page out of range")]
    PageOutOfRange,

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        match self {
            FlowError::AlreadyAuthenticated => Redirect::to("/").into_response(),
            FlowError::LoginRequired { next } => {
                Redirect::to(&format!("/login?next={next}")).into_response()
            }
            FlowError::InvalidCredentials => error_body(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password",
            ),
            FlowError::InvalidResetToken => error_body(
                StatusCode::BAD_REQUEST,
                "invalid_or_expired_token",
                "That is an invalid or expired token",
            ),
            FlowError::UsernameTaken => error_body(
                StatusCode::CONFLICT,
                "username_taken",
                "That username is taken. Please choose a different one",
            ),
            FlowError::EmailTaken => error_body(
                StatusCode::CONFLICT,
                "email_taken",
                "That email is taken. Please choose a different one",
            ),
            FlowError::UserNotFound => {
                error_body(StatusCode::NOT_FOUND, "not_found", "User not found")
            }
            FlowError::PageOutOfRange => {
                error_body(StatusCode::NOT_FOUND, "not_found", "Page not found")
            }
            FlowError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "validation_failed",
                    "fields": fields,
                })),
            )
                .into_response(),
            FlowError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Something went wrong",
                )
            }
        }
    }
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_authenticated_redirects_home() {
        let response = FlowError::AlreadyAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/");
    }

    #[test]
    fn login_required_carries_the_requested_path() {
        let response = FlowError::LoginRequired {
            next: "/account".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/login?next=/account"
        );
    }

    #[test]
    fn out_of_range_pages_are_not_found() {
        let response = FlowError::PageOutOfRange.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_credentials_is_unauthorized() {
        let response = FlowError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn conflict_variants_use_409() {
        assert_eq!(
            FlowError::UsernameTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            FlowError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn validation_errors_are_unprocessable() {
        let response =
            FlowError::Validation(vec![FieldError::new("username", "too short")]).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn internal_errors_stay_opaque() {
        let response =
            FlowError::Internal(anyhow::anyhow!("pg password leaked here")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
