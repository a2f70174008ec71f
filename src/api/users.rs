use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{AuthUser, UserDto};
use super::{ApiError, ApiResponse, AppState, ListQuery, Paginated, validation};
use crate::db::repositories::user::NewUser;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct ReplaceRolesRequest {
    pub role_ids: Vec<i32>,
}

/// GET /admin/master/user
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<UserDto>>, ApiError> {
    let req = query.into_page_request();
    let (users, total) = state.shared.store.users().list(&req).await?;

    let items = users.into_iter().map(UserDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

/// GET /admin/master/user/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    validation::validate_id(id)?;

    let user = state
        .shared
        .store
        .users()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(ApiResponse::ok(UserDto::from(user)))
}

/// POST /admin/master/user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    validation::validate_required(&payload.username, "username")?;
    validation::validate_password(&payload.password)?;

    let user = state
        .shared
        .store
        .users()
        .create(
            NewUser {
                username: payload.username,
                display_name: payload.display_name,
                email: payload.email,
                password: payload.password,
                is_active: payload.is_active,
            },
            auth.id,
        )
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "user", Some(user.id), None)
        .await?;

    Ok(ApiResponse::created(UserDto::from(user)))
}

/// PUT /admin/master/user/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<ApiResponse<UserDto>, ApiError> {
    validation::validate_id(id)?;

    let user = state
        .shared
        .store
        .users()
        .update(
            id,
            payload.display_name,
            payload.email,
            payload.is_active,
            auth.id,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "user", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(UserDto::from(user)))
}

/// DELETE /admin/master/user/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.users().delete(id).await? {
        return Err(ApiError::not_found("User", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "user", Some(id), None)
        .await?;

    Ok(ApiResponse::message("user deleted"))
}

/// PUT /admin/master/user/{id}/roles
/// Replace-set semantics: the body carries the complete desired role
/// set; partial deltas are not accepted.
pub async fn replace_user_roles(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ReplaceRolesRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    state
        .shared
        .store
        .users()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    state
        .shared
        .store
        .permissions()
        .replace_user_roles(id, &payload.role_ids)
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "replace-roles", "user", Some(id), None)
        .await?;

    Ok(ApiResponse::message("user roles replaced"))
}
