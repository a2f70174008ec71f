use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, ListQuery, Paginated, validation};
use crate::entities::roles;

#[derive(Deserialize)]
pub struct RoleRequest {
    pub code: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct ReplaceMenusRequest {
    pub menu_ids: Vec<i32>,
}

#[derive(Serialize)]
pub struct RoleDto {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<roles::Model> for RoleDto {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// GET /admin/master/role
pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<RoleDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.roles().list(&req).await?;

    let items = rows.into_iter().map(RoleDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

/// GET /admin/master/role/{id}
pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<RoleDto>, ApiError> {
    validation::validate_id(id)?;

    let role = state
        .shared
        .store
        .roles()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", id))?;

    Ok(ApiResponse::ok(RoleDto::from(role)))
}

/// POST /admin/master/role
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<RoleRequest>,
) -> Result<ApiResponse<RoleDto>, ApiError> {
    validation::validate_required(&payload.code, "code")?;
    validation::validate_required(&payload.name, "name")?;

    let role = state
        .shared
        .store
        .roles()
        .create(payload.code, payload.name, auth.id)
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "role", Some(role.id), None)
        .await?;

    Ok(ApiResponse::created(RoleDto::from(role)))
}

/// PUT /admin/master/role/{id}
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RoleRequest>,
) -> Result<ApiResponse<RoleDto>, ApiError> {
    validation::validate_id(id)?;

    let role = state
        .shared
        .store
        .roles()
        .update(id, payload.code, payload.name, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "role", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(RoleDto::from(role)))
}

/// DELETE /admin/master/role/{id}
pub async fn delete_role(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.roles().delete(id).await? {
        return Err(ApiError::not_found("Role", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "role", Some(id), None)
        .await?;

    Ok(ApiResponse::message("role deleted"))
}

/// PUT /admin/master/role/{id}/menus
/// Replace-set semantics, same contract as user-role replacement.
pub async fn replace_role_menus(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ReplaceMenusRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    state
        .shared
        .store
        .roles()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", id))?;

    state
        .shared
        .store
        .permissions()
        .replace_role_menus(id, &payload.menu_ids)
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "replace-menus", "role", Some(id), None)
        .await?;

    Ok(ApiResponse::message("role menus replaced"))
}
