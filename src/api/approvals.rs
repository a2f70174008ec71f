use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, ListQuery, Paginated, validation};
use crate::db::repositories::approval::{
    DefinitionWithLevels, LevelAddOutcome, LevelDeleteOutcome,
};
use crate::entities::approvals;
use crate::services::approval::{
    ApprovalAction, PendingNotification, StreamView, TransitionRequest,
};

#[derive(Deserialize)]
pub struct DefinitionRequest {
    pub menu_id: i32,
    pub name: String,
}

#[derive(Deserialize)]
pub struct AddLevelRequest {
    pub level_index: i32,
}

#[derive(Deserialize)]
pub struct ReplaceLevelUsersRequest {
    pub user_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct HistoryRequest {
    pub ref_table: String,
    pub ref_id: i32,
    pub menu_id: i32,
    pub action: String,
    pub note: Option<String>,
}

#[derive(Serialize)]
pub struct DefinitionDto {
    pub id: i32,
    pub menu_id: i32,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<LevelDto>>,
}

#[derive(Serialize)]
pub struct LevelDto {
    pub id: i32,
    pub level_index: i32,
    pub user_ids: Vec<i32>,
}

impl From<approvals::Model> for DefinitionDto {
    fn from(model: approvals::Model) -> Self {
        Self {
            id: model.id,
            menu_id: model.menu_id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            levels: None,
        }
    }
}

impl From<DefinitionWithLevels> for DefinitionDto {
    fn from(def: DefinitionWithLevels) -> Self {
        let levels = def
            .levels
            .into_iter()
            .map(|l| LevelDto {
                id: l.level.id,
                level_index: l.level.level_index,
                user_ids: l.user_ids,
            })
            .collect();

        let mut dto = Self::from(def.definition);
        dto.levels = Some(levels);
        dto
    }
}

// ============================================================================
// Definition store
// ============================================================================

/// GET /admin/approval
pub async fn list_definitions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<DefinitionDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.approvals().list(&req).await?;

    let items = rows.into_iter().map(DefinitionDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

/// GET /admin/approval/{id}
pub async fn get_definition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<DefinitionDto>, ApiError> {
    validation::validate_id(id)?;

    let def = state
        .shared
        .store
        .approvals()
        .get_with_levels(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval definition", id))?;

    Ok(ApiResponse::ok(DefinitionDto::from(def)))
}

/// GET /admin/approval/{menuId}/menu
/// The definition attached to a menu, levels ordered ascending, each
/// with its user set.
pub async fn get_definition_for_menu(
    State(state): State<Arc<AppState>>,
    Path(menu_id): Path<i32>,
) -> Result<ApiResponse<DefinitionDto>, ApiError> {
    validation::validate_id(menu_id)?;

    let def = state
        .shared
        .store
        .approvals()
        .get_by_menu(menu_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval definition for menu", menu_id))?;

    Ok(ApiResponse::ok(DefinitionDto::from(def)))
}

/// POST /admin/approval
pub async fn create_definition(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<DefinitionRequest>,
) -> Result<ApiResponse<DefinitionDto>, ApiError> {
    validation::validate_id(payload.menu_id)?;
    validation::validate_required(&payload.name, "name")?;

    let def = state
        .shared
        .store
        .approvals()
        .create(payload.menu_id, payload.name, auth.id)
        .await?;

    Ok(ApiResponse::created(DefinitionDto::from(def)))
}

/// PUT /admin/approval/{id}
pub async fn update_definition(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<DefinitionRequest>,
) -> Result<ApiResponse<DefinitionDto>, ApiError> {
    validation::validate_id(id)?;
    validation::validate_required(&payload.name, "name")?;

    let def = state
        .shared
        .store
        .approvals()
        .update(id, payload.menu_id, payload.name, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval definition", id))?;

    Ok(ApiResponse::ok(DefinitionDto::from(def)))
}

/// DELETE /admin/approval/{id}
pub async fn delete_definition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.approvals().delete(id).await? {
        return Err(ApiError::not_found("Approval definition", id));
    }

    Ok(ApiResponse::message("approval definition deleted"))
}

/// POST /admin/approval/{id}/level
/// Level indices must stay contiguous: only max+1 is accepted.
pub async fn add_level(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AddLevelRequest>,
) -> Result<ApiResponse<LevelDto>, ApiError> {
    validation::validate_id(id)?;

    state
        .shared
        .store
        .approvals()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval definition", id))?;

    match state
        .shared
        .store
        .approvals()
        .add_level(id, payload.level_index)
        .await?
    {
        LevelAddOutcome::Added(level) => Ok(ApiResponse::created(LevelDto {
            id: level.id,
            level_index: level.level_index,
            user_ids: Vec::new(),
        })),
        LevelAddOutcome::GapRejected { expected } => Err(ApiError::validation(format!(
            "level indices must be contiguous; next level must be {expected}"
        ))),
    }
}

/// DELETE /admin/approval/level/{id}
pub async fn delete_level(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    match state.shared.store.approvals().delete_level(id).await? {
        LevelDeleteOutcome::Deleted => Ok(ApiResponse::message("approval level deleted")),
        LevelDeleteOutcome::NotFound => Err(ApiError::not_found("Approval level", id)),
        LevelDeleteOutcome::NotTopLevel => Err(ApiError::validation(
            "only the highest level can be deleted",
        )),
    }
}

/// PUT /admin/approval/level/{id}/users
/// Replace-set semantics for the level's approver set.
pub async fn replace_level_users(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ReplaceLevelUsersRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    state
        .shared
        .store
        .approvals()
        .get_level(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Approval level", id))?;

    state
        .shared
        .store
        .approvals()
        .replace_level_users(id, &payload.user_ids)
        .await?;

    Ok(ApiResponse::message("approval level users replaced"))
}

// ============================================================================
// Workflow engine
// ============================================================================

/// POST /admin/approval-history
/// One state-machine transition; appends exactly one event on success.
pub async fn post_history(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<HistoryRequest>,
) -> Result<ApiResponse<StreamView>, ApiError> {
    validation::validate_required(&payload.ref_table, "ref_table")?;
    validation::validate_id(payload.ref_id)?;
    validation::validate_id(payload.menu_id)?;

    let action = ApprovalAction::parse(&payload.action).ok_or_else(|| {
        ApiError::validation("action must be one of: submit, approve, reject, revise")
    })?;

    state
        .shared
        .approvals
        .transition(TransitionRequest {
            ref_table: payload.ref_table.clone(),
            ref_id: payload.ref_id,
            menu_id: payload.menu_id,
            actor: auth.id,
            action,
            note: payload.note,
        })
        .await?;

    let view = state
        .shared
        .approvals
        .view(&payload.ref_table, payload.ref_id)
        .await?;

    Ok(ApiResponse::ok(view))
}

/// GET /admin/approval-history/{table}/{refId}
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path((table, ref_id)): Path<(String, i32)>,
) -> Result<ApiResponse<StreamView>, ApiError> {
    validation::validate_id(ref_id)?;

    let view = state.shared.approvals.view(&table, ref_id).await?;
    Ok(ApiResponse::ok(view))
}

/// GET /admin/approval-history/notifications
/// Everything currently awaiting the polling user's action.
pub async fn notifications(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<Vec<PendingNotification>>, ApiError> {
    let pending = state.shared.approvals.notifications(auth.id).await?;
    Ok(ApiResponse::ok(pending))
}
