/// Error handling for the API server.
///
/// Every handler returns `Result<T, ApiError>`; the component errors from
/// the shared crate convert into `ApiError` and from there into HTTP
/// responses. Internal failures are logged with their cause and answered
/// with a generic message so implementation detail never leaks to callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskcamp_shared::auth::authorization::AuthzError;
use taskcamp_shared::auth::session::SessionError;
use taskcamp_shared::lifecycle::LifecycleError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email or membership
    Conflict(String),

    /// Unprocessable entity (422), request validation failures
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// One failed request-validation rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

/// Wire format for error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code (e.g. "not_found")
    pub error: String,

    /// Human-readable message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Converts `validator` derive output into a 422 with per-field details.
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| ValidationErrorDetail {
                    field: field.to_string(),
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log the cause, answer with a generic message
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::DuplicateIdentity => ApiError::Conflict(err.to_string()),
            SessionError::NotFound => ApiError::NotFound("no such user".to_string()),
            SessionError::EmailNotVerified => ApiError::Forbidden(err.to_string()),
            SessionError::AlreadyVerified => ApiError::BadRequest(err.to_string()),
            SessionError::InvalidCredential => {
                ApiError::Unauthorized("invalid email or password".to_string())
            }
            SessionError::PasswordMismatch => ApiError::BadRequest(err.to_string()),
            SessionError::InvalidOrExpiredToken => ApiError::BadRequest(err.to_string()),
            SessionError::Revoked => ApiError::Unauthorized(err.to_string()),
            SessionError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            SessionError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAMember(_) => {
                ApiError::Forbidden("not a member of this project".to_string())
            }
            AuthzError::Forbidden { .. } => {
                ApiError::Forbidden("insufficient role for this operation".to_string())
            }
            AuthzError::Store(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::ProjectNotFound(_)
            | LifecycleError::TaskNotFound(_)
            | LifecycleError::SubTaskNotFound(_) => ApiError::NotFound(err.to_string()),
            LifecycleError::AlreadyMember { .. } => ApiError::Conflict(err.to_string()),
            LifecycleError::NotAMember { .. } => ApiError::NotFound(err.to_string()),
            LifecycleError::RoleUnchanged(_) => ApiError::BadRequest(err.to_string()),
            LifecycleError::Store(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict("resource already exists".to_string())
            }
            _ => ApiError::InternalError(format!("database error: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskcamp_shared::auth::authorization::ProjectRole;
    use uuid::Uuid;

    #[test]
    fn display_formats() {
        let err = ApiError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");

        let err = ApiError::NotFound("user not found".to_string());
        assert_eq!(err.to_string(), "Not found: user not found");
    }

    #[test]
    fn session_errors_map_to_statuses() {
        assert!(matches!(
            ApiError::from(SessionError::DuplicateIdentity),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::InvalidCredential),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::Revoked),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::InvalidOrExpiredToken),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::EmailNotVerified),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn authz_errors_are_forbidden() {
        assert!(matches!(
            ApiError::from(AuthzError::NotAMember(Uuid::new_v4())),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(AuthzError::Forbidden {
                actual: ProjectRole::Member,
                allowed: vec![ProjectRole::Admin],
            }),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn lifecycle_errors_map_to_statuses() {
        assert!(matches!(
            ApiError::from(LifecycleError::ProjectNotFound(Uuid::new_v4())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::AlreadyMember {
                user_id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
            }),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(LifecycleError::RoleUnchanged(ProjectRole::Member)),
            ApiError::BadRequest(_)
        ));
    }
}
