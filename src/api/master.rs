//! Master-data endpoints. Each entity is one instantiation of the same
//! CRUD template: paginated list, get, create, update, delete, with
//! activity stamping on every write.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, ListQuery, Paginated, validation};
use crate::entities::{activity_logs, currencies, departments, machines};

// ============================================================================
// Departments
// ============================================================================

#[derive(Deserialize)]
pub struct DepartmentRequest {
    pub code: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct DepartmentDto {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<departments::Model> for DepartmentDto {
    fn from(model: departments::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<DepartmentDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.departments().list(&req).await?;

    let items = rows.into_iter().map(DepartmentDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<DepartmentDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .departments()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Department", id))?;

    Ok(ApiResponse::ok(DepartmentDto::from(row)))
}

pub async fn create_department(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<DepartmentRequest>,
) -> Result<ApiResponse<DepartmentDto>, ApiError> {
    validation::validate_required(&payload.code, "code")?;
    validation::validate_required(&payload.name, "name")?;

    let row = state
        .shared
        .store
        .departments()
        .create(payload.code, payload.name, auth.id)
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "department", Some(row.id), None)
        .await?;

    Ok(ApiResponse::created(DepartmentDto::from(row)))
}

pub async fn update_department(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<DepartmentRequest>,
) -> Result<ApiResponse<DepartmentDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .departments()
        .update(id, payload.code, payload.name, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Department", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "department", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(DepartmentDto::from(row)))
}

pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.departments().delete(id).await? {
        return Err(ApiError::not_found("Department", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "department", Some(id), None)
        .await?;

    Ok(ApiResponse::message("department deleted"))
}

// ============================================================================
// Machines
// ============================================================================

#[derive(Deserialize)]
pub struct MachineRequest {
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Serialize)]
pub struct MachineDto {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<machines::Model> for MachineDto {
    fn from(model: machines::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            location: model.location,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn list_machines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<MachineDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.machines().list(&req).await?;

    let items = rows.into_iter().map(MachineDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

pub async fn get_machine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<MachineDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .machines()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Machine", id))?;

    Ok(ApiResponse::ok(MachineDto::from(row)))
}

pub async fn create_machine(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<MachineRequest>,
) -> Result<ApiResponse<MachineDto>, ApiError> {
    validation::validate_required(&payload.code, "code")?;
    validation::validate_required(&payload.name, "name")?;

    let row = state
        .shared
        .store
        .machines()
        .create(
            payload.code,
            payload.name,
            payload.location,
            payload.is_active,
            auth.id,
        )
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "machine", Some(row.id), None)
        .await?;

    Ok(ApiResponse::created(MachineDto::from(row)))
}

pub async fn update_machine(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<MachineRequest>,
) -> Result<ApiResponse<MachineDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .machines()
        .update(
            id,
            payload.code,
            payload.name,
            payload.location,
            payload.is_active,
            auth.id,
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Machine", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "machine", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(MachineDto::from(row)))
}

pub async fn delete_machine(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.machines().delete(id).await? {
        return Err(ApiError::not_found("Machine", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "machine", Some(id), None)
        .await?;

    Ok(ApiResponse::message("machine deleted"))
}

// ============================================================================
// Currencies
// ============================================================================

#[derive(Deserialize)]
pub struct CurrencyRequest {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

#[derive(Serialize)]
pub struct CurrencyDto {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<currencies::Model> for CurrencyDto {
    fn from(model: currencies::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            symbol: model.symbol,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub async fn list_currencies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<CurrencyDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.currencies().list(&req).await?;

    let items = rows.into_iter().map(CurrencyDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}

pub async fn get_currency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<CurrencyDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .currencies()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Currency", id))?;

    Ok(ApiResponse::ok(CurrencyDto::from(row)))
}

pub async fn create_currency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CurrencyRequest>,
) -> Result<ApiResponse<CurrencyDto>, ApiError> {
    validation::validate_required(&payload.code, "code")?;
    validation::validate_required(&payload.name, "name")?;

    let row = state
        .shared
        .store
        .currencies()
        .create(payload.code, payload.name, payload.symbol, auth.id)
        .await?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "create", "currency", Some(row.id), None)
        .await?;

    Ok(ApiResponse::created(CurrencyDto::from(row)))
}

pub async fn update_currency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<CurrencyRequest>,
) -> Result<ApiResponse<CurrencyDto>, ApiError> {
    validation::validate_id(id)?;

    let row = state
        .shared
        .store
        .currencies()
        .update(id, payload.code, payload.name, payload.symbol, auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Currency", id))?;

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "update", "currency", Some(id), None)
        .await?;

    Ok(ApiResponse::ok(CurrencyDto::from(row)))
}

pub async fn delete_currency(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<ApiResponse<()>, ApiError> {
    validation::validate_id(id)?;

    if !state.shared.store.currencies().delete(id).await? {
        return Err(ApiError::not_found("Currency", id));
    }

    state
        .shared
        .store
        .activity()
        .add(Some(auth.id), "delete", "currency", Some(id), None)
        .await?;

    Ok(ApiResponse::message("currency deleted"))
}

// ============================================================================
// Activity log
// ============================================================================

#[derive(Serialize)]
pub struct ActivityDto {
    pub id: i64,
    pub user_id: Option<i32>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i32>,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<activity_logs::Model> for ActivityDto {
    fn from(model: activity_logs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            entity: model.entity,
            entity_id: model.entity_id,
            detail: model.detail,
            created_at: model.created_at,
        }
    }
}

/// GET /admin/activity-log
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<ActivityDto>>, ApiError> {
    let req = query.into_page_request();
    let (rows, total) = state.shared.store.activity().list(&req).await?;

    let items = rows.into_iter().map(ActivityDto::from).collect();
    Ok(Json(Paginated::new(items, &req, total)))
}
