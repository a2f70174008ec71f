use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, validation};
use crate::db::ActionFlags;
use crate::entities::role_permissions;
use crate::services::menu_tree::MenuNode;

#[derive(Deserialize)]
pub struct UpsertPermissionRequest {
    pub role_id: i32,
    pub menu_id: i32,
    #[serde(default)]
    pub may_create: bool,
    #[serde(default)]
    pub may_update: bool,
    #[serde(default)]
    pub may_delete: bool,
}

#[derive(Serialize)]
pub struct PermissionDto {
    pub id: i32,
    pub role_id: i32,
    pub menu_id: i32,
    pub may_create: bool,
    pub may_update: bool,
    pub may_delete: bool,
}

impl From<role_permissions::Model> for PermissionDto {
    fn from(model: role_permissions::Model) -> Self {
        Self {
            id: model.id,
            role_id: model.role_id,
            menu_id: model.menu_id,
            may_create: model.may_create,
            may_update: model.may_update,
            may_delete: model.may_delete,
        }
    }
}

/// The menu forest annotated with one role's current link and flags.
#[derive(Serialize)]
pub struct PermissionNode {
    pub id: i32,
    pub menu_key: i32,
    pub label: String,
    pub path: Option<String>,
    pub sort_order: i32,
    pub linked: bool,
    pub may_create: bool,
    pub may_update: bool,
    pub may_delete: bool,
    pub children: Vec<PermissionNode>,
}

/// GET /admin/role-permission/{roleId}
pub async fn get_role_permissions(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<i32>,
) -> Result<ApiResponse<Vec<PermissionNode>>, ApiError> {
    validation::validate_id(role_id)?;

    state
        .shared
        .store
        .roles()
        .get(role_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", role_id))?;

    let forest = state.shared.menu_tree.full_forest().await?;
    let linked: HashSet<i32> = state
        .shared
        .store
        .permissions()
        .menu_ids_for_role(role_id)
        .await?
        .into_iter()
        .collect();
    let flags: HashMap<i32, role_permissions::Model> = state
        .shared
        .store
        .permissions()
        .permissions_for_role(role_id)
        .await?
        .into_iter()
        .map(|row| (row.menu_id, row))
        .collect();

    let annotated = forest
        .iter()
        .map(|node| annotate(node, &linked, &flags))
        .collect();

    Ok(ApiResponse::ok(annotated))
}

/// POST /admin/role-permission
/// Upsert one (role, menu) flag row. There is no delete; revocation
/// clears the flags.
pub async fn upsert_role_permission(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpsertPermissionRequest>,
) -> Result<ApiResponse<PermissionDto>, ApiError> {
    validation::validate_id(payload.role_id)?;
    validation::validate_id(payload.menu_id)?;

    let row = state
        .shared
        .store
        .permissions()
        .upsert_role_permission(
            payload.role_id,
            payload.menu_id,
            ActionFlags {
                may_create: payload.may_create,
                may_update: payload.may_update,
                may_delete: payload.may_delete,
            },
            auth.id,
        )
        .await?;

    state
        .shared
        .store
        .activity()
        .add(
            Some(auth.id),
            "upsert",
            "role-permission",
            Some(row.id),
            Some(format!("role {} menu {}", payload.role_id, payload.menu_id)),
        )
        .await?;

    Ok(ApiResponse::ok(PermissionDto::from(row)))
}

fn annotate(
    node: &MenuNode,
    linked: &HashSet<i32>,
    flags: &HashMap<i32, role_permissions::Model>,
) -> PermissionNode {
    let row = flags.get(&node.id);

    PermissionNode {
        id: node.id,
        menu_key: node.menu_key,
        label: node.label.clone(),
        path: node.path.clone(),
        sort_order: node.sort_order,
        linked: linked.contains(&node.id),
        may_create: row.is_some_and(|r| r.may_create),
        may_update: row.is_some_and(|r| r.may_update),
        may_delete: row.is_some_and(|r| r.may_delete),
        children: node
            .children
            .iter()
            .map(|child| annotate(child, linked, flags))
            .collect(),
    }
}
