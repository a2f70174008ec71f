use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, ListQuery, Paginated, validation};
use crate::db::repositories::menu::NewMenu;
use crate::entities::menus;
use crate::services::menu_tree::MenuNode;

#[derive(Deserialize)]
pub struct MenuRequest {
    pub menu_key: i32,
    pub parent_key: Option<i32>,
    pub label: String,
    pub path: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Serialize)]
pub struct MenuDto {
    pub id: i32,
    pub menu_key: i32,
    pub parent_key: Option<i32>,
    pub label: String,
    pub path: Option<String>,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<menus::Model> for MenuDto {
    fn from(model: menus::Model) -> Self {
        Self {
            id: model.id,
            menu_key: model.menu_key,
            parent_key: model.parent_key,
            label: model.label,
            path: model.path,
            sort_order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// GET /admin/master/tree-menu
/// The full navigation forest.
pub async fn tree_menu(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<MenuNode>>, ApiError> {
    let forest = state.shared.menu_tree.full_forest().await?;
    Ok(ApiResponse::ok(forest))
}

/// GET /admin/master/tree-menu/user
/// The forest pruned to what the current user can reach.
pub async fn tree_menu_for_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<MenuNode>>, ApiError> {
    let forest = state.shared.menu_tree.forest_for_user(auth.id).await?;
    Ok(ApiResponse::ok(forest))
}

/// GET /admin/master/menu
pub async fn list_menus(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<MenuDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.menus().list(&req).await?;

    let items = rows.into_iter().map(MenuDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

/// GET /admin/master/menu/{id}
pub async fn get_menu(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<MenuDto>, ApiError> {
    validation::validate_id(id)?;

    let menu = state
        .shared
        .store
        .menus()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu", id))?;

    Ok(ApiResponse::ok(MenuDto::from(menu)))
}

/// POST /admin/master/menu
pub async fn create_menu(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<MenuRequest>,
) -> Result<ApiResponse<MenuDto>, ApiError> {
    validate_menu(&payload)?;

    let menu = state
        .shared
        .store
        .menus()
        .create(
            NewMenu {
                menu_key: payload.menu_key,
                parent_key: payload.parent_key,
                label: payload.label,
                path: normalize_path_field(payload.path),
                sort_order: payload.sort_order,
            },
            auth.id,
        )
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "menu", Some(menu.id), None)
        .await?;

    Ok(ApiResponse::created(MenuDto::from(menu)))
}

/// PUT /admin/master/menu/{id}
pub async fn update_menu(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<MenuRequest>,
) -> Result<ApiResponse<MenuDto>, ApiError> {
    validation::validate_id(id)?;
    validate_menu(&payload)?;

    let menu = state
        .shared
        .store
        .menus()
        .update(
            id,
            NewMenu {
                menu_key: payload.menu_key,
                parent_key: payload.parent_key,
                label: payload.label,
                path: normalize_path_field(payload.path),
                sort_order: payload.sort_order,
            },
            auth.id,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Menu", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "menu", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(MenuDto::from(menu)))
}

/// DELETE /admin/master/menu/{id}
pub async fn delete_menu(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.menus().delete(id).await? {
        return Err(ApiError::not_found("Menu", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "menu", Some(id), None)
        .await?;

    Ok(ApiResponse::message("menu deleted"))
}

fn validate_menu(payload: &MenuRequest) -> Result<(), ApiError> {
    validation::validate_required(&payload.label, "label")?;

    if payload.menu_key <= 0 {
        return Err(ApiError::validation("menu_key must be a positive integer"));
    }
    if payload.parent_key == Some(payload.menu_key) {
        return Err(ApiError::validation("a menu cannot be its own parent"));
    }

    Ok(())
}

fn normalize_path_field(path: Option<String>) -> Option<String> {
    path.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}
