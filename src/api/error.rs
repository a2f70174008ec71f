use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::approval::ApprovalError;
use crate::services::menu_tree::MenuTreeError;
use crate::services::session::SessionError;
use crate::services::token::TokenError;

/// Every error kind the service surfaces to clients. Handlers convert
/// typed internal errors into exactly one of these; lower layers never
/// touch status codes.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    InvalidInput(String),

    InvalidCredentials,

    InactiveAccount,

    TwoFactorRequired,

    InvalidOtp,

    ExpiredToken,

    UsedToken,

    Unauthorized(String),

    Forbidden(String),

    StaleApprovalState(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::InactiveAccount => write!(f, "Account is inactive"),
            Self::TwoFactorRequired => write!(f, "Two-factor authentication is required"),
            Self::InvalidOtp => write!(f, "Invalid one-time password"),
            Self::ExpiredToken => write!(f, "Token has expired"),
            Self::UsedToken => write!(f, "Token has already been used"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::StaleApprovalState(msg) => write!(f, "Stale approval state: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            Self::InactiveAccount => (StatusCode::FORBIDDEN, "account is inactive".to_string()),
            Self::TwoFactorRequired => (
                StatusCode::FORBIDDEN,
                "two-factor authentication is required".to_string(),
            ),
            Self::InvalidOtp => (
                StatusCode::UNAUTHORIZED,
                "invalid one-time password".to_string(),
            ),
            Self::ExpiredToken => (StatusCode::UNAUTHORIZED, "token has expired".to_string()),
            Self::UsedToken => (
                StatusCode::BAD_REQUEST,
                "token has already been used".to_string(),
            ),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::StaleApprovalState(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "a database error occurred".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            status: status.as_u16(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

/// Database constraint violations map to client errors: unique → conflict,
/// foreign key → invalid input. Anything else is internal.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(db_err) = err.downcast_ref::<sea_orm::DbErr>() {
            let text = db_err.to_string();
            if text.contains("UNIQUE constraint failed") {
                return Self::Conflict("a record with the same key already exists".to_string());
            }
            if text.contains("FOREIGN KEY constraint failed") {
                return Self::InvalidInput("a referenced record does not exist".to_string());
            }
        }

        Self::InternalError(format!("{err:#}"))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::NotFound("user or token not found".to_string()),
            SessionError::Inactive => Self::InactiveAccount,
            SessionError::InvalidCredentials => Self::InvalidCredentials,
            SessionError::TwoFactorRequired => Self::TwoFactorRequired,
            SessionError::InvalidOtp => Self::InvalidOtp,
            SessionError::TwoFactorNotEnrolled => {
                Self::InvalidInput("two-factor authentication is not enrolled".to_string())
            }
            SessionError::InvalidToken => Self::Unauthorized("token is invalid".to_string()),
            SessionError::ExpiredToken => Self::ExpiredToken,
            SessionError::UsedToken => Self::UsedToken,
            SessionError::Internal(err) => err.into(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::ExpiredToken,
            TokenError::Invalid | TokenError::WrongAlgorithm => {
                Self::Unauthorized("token is invalid".to_string())
            }
        }
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotConfigured => {
                Self::NotFound("no approval definition for this menu".to_string())
            }
            ApprovalError::Misconfigured(msg) => {
                Self::InvalidInput(format!("approval definition is misconfigured: {msg}"))
            }
            ApprovalError::InvalidTransition(msg) => Self::InvalidInput(msg),
            ApprovalError::Stale(msg) => Self::StaleApprovalState(msg),
            ApprovalError::NotApprover => {
                Self::Forbidden("user is not an approver for the current level".to_string())
            }
            ApprovalError::NotOwner => {
                Self::Forbidden("only the record owner may perform this action".to_string())
            }
            ApprovalError::Internal(err) => err.into(),
        }
    }
}

impl From<MenuTreeError> for ApiError {
    fn from(err: MenuTreeError) -> Self {
        match err {
            MenuTreeError::DanglingParent(_) | MenuTreeError::Cycle(_) => {
                tracing::error!("Menu forest integrity failure: {err}");
                Self::InternalError(err.to_string())
            }
            MenuTreeError::Internal(err) => err.into(),
        }
    }
}
