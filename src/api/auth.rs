use axum::{
    Json,
    extract::{Path, Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::db::User;
use crate::services::session::LoginOutcome;
use crate::services::token::TokenKind;

pub const ROTATION_COOKIE: &str = "refresh_token";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct TwoFaRequest {
    pub username: String,
    pub otp_key: String,
}

#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

#[derive(Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub is_two_fa: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            email: user.email,
            is_two_fa: user.is_two_fa,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current: String,
    pub new: String,
}

#[derive(Serialize)]
pub struct TwoFaEnrolmentResponse {
    pub secret: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct SendPasswordResetRequest {
    pub id: i32,
}

#[derive(Deserialize)]
pub struct ResetTokenQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub password: String,
    pub confirm: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authenticated user context, injected by `auth_middleware` from the
/// verified access token. Write handlers stamp this id into
/// created-by / updated-by columns.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub id: i32,
}

/// Validates the `Authorization: Bearer` access token and injects
/// `AuthUser` into the request.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let user_id = state.shared.tokens.verify(TokenKind::Access, &token)?;

    request.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization")?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Password check, then either tokens or a 403 demanding the second
/// factor. The rotation token travels only in the httpOnly cookie.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<AccessTokenResponse>), ApiError> {
    validation::validate_required(&payload.username, "username")?;
    validation::validate_required(&payload.password, "password")?;

    match state
        .shared
        .sessions
        .login(&payload.username, &payload.password)
        .await?
    {
        LoginOutcome::TwoFactorRequired => Err(ApiError::TwoFactorRequired),
        LoginOutcome::Tokens(user, issued) => {
            let jar = jar.add(rotation_cookie(&state, issued.rotation));
            Ok((
                jar,
                ApiResponse::ok(AccessTokenResponse {
                    access_token: issued.access,
                    user: Some(UserDto::from(*user)),
                }),
            ))
        }
    }
}

/// POST /auth/two-fa
/// Second step of a 2FA login: a valid current TOTP code completes the
/// session.
pub async fn two_fa(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<TwoFaRequest>,
) -> Result<(CookieJar, ApiResponse<AccessTokenResponse>), ApiError> {
    validation::validate_required(&payload.username, "username")?;
    validation::validate_required(&payload.otp_key, "otp_key")?;

    let (user, issued) = state
        .shared
        .sessions
        .verify_two_fa(&payload.username, &payload.otp_key)
        .await?;

    let jar = jar.add(rotation_cookie(&state, issued.rotation));
    Ok((
        jar,
        ApiResponse::ok(AccessTokenResponse {
            access_token: issued.access,
            user: Some(UserDto::from(user)),
        }),
    ))
}

/// GET /auth/token
/// Exchange the rotation cookie for a fresh access token; the cookie
/// itself is not rotated here.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<ApiResponse<AccessTokenResponse>, ApiError> {
    let cookie = jar
        .get(ROTATION_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("missing rotation cookie".to_string()))?;

    let access = state.shared.sessions.rotate(cookie.value()).await?;

    Ok(ApiResponse::ok(AccessTokenResponse {
        access_token: access,
        user: None,
    }))
}

/// DELETE /auth/logout
/// Clears the user's rotation slot and erases the cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<()>), ApiError> {
    if let Some(cookie) = jar.get(ROTATION_COOKIE) {
        state.shared.sessions.logout(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(ROTATION_COOKIE).path("/"));
    Ok((jar, ApiResponse::message("logged out")))
}

/// GET /auth/user-info
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    auth: axum::Extension<AuthUser>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    let user = state
        .shared
        .store
        .users()
        .get_by_id(auth.id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("User", auth.id))?;

    Ok(ApiResponse::ok(UserDto::from(user)))
}

/// PUT /auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: axum::Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_password(&payload.new)?;
    if payload.current == payload.new {
        return Err(ApiError::validation(
            "New password must be different from current password",
        ));
    }

    state
        .shared
        .sessions
        .change_password(auth.id, &payload.current, payload.new)
        .await?;

    Ok(ApiResponse::message("password updated"))
}

/// PUT /auth/{id}/two-fa
/// Enrol the target user into 2FA. The response carries the secret and
/// provisioning URL; the client renders the QR image.
pub async fn enrol_two_fa(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<TwoFaEnrolmentResponse>, ApiError> {
    validation::validate_id(id)?;

    let enrolment = state.shared.sessions.enrol_two_fa(id).await?;

    Ok(ApiResponse::ok(TwoFaEnrolmentResponse {
        secret: enrolment.secret,
        url: enrolment.url,
    }))
}

/// POST /auth/send-password-reset
/// The target user id arrives in the body; the reset link goes out by
/// mail and is valid for 24 hours, single use.
pub async fn send_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendPasswordResetRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(payload.id)?;

    state.shared.sessions.send_password_reset(payload.id).await?;

    Ok(ApiResponse::message("password reset link sent"))
}

/// POST /auth/password-reset?token=...
pub async fn password_reset(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetTokenQuery>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_password(&payload.password)?;
    if payload.password != payload.confirm {
        return Err(ApiError::validation("Passwords do not match"));
    }

    state
        .shared
        .sessions
        .reset_password(&query.token, payload.password)
        .await?;

    Ok(ApiResponse::message("password has been reset"))
}

// ============================================================================
// Helpers
// ============================================================================

fn rotation_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let ttl_hours = state.shared.tokens.rotation_ttl().num_hours();

    Cookie::build((ROTATION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.shared.config.server.secure_cookies)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}
