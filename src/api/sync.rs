use axum::{Extension, extract::State};
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState};
use crate::services::sync::{SyncReport, sync_currencies, sync_employees};

/// POST /admin/sync/employee
/// Caller-initiated sweep of the external HR directory. Partial failure
/// is reported in the body, not hidden behind a 500.
pub async fn sync_employee_directory(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<SyncReport>, ApiError> {
    let report = sync_employees(&state.shared.store, &state.shared.hr_directory, auth.id).await;

    state
        .shared
        .store
        .activity()
        .add(
            Some(auth.id),
            "sync",
            "employee-directory",
            None,
            Some(format!(
                "{} fetched, {} failures",
                report.fetched,
                report.failures.len()
            )),
        )
        .await?;

    Ok(ApiResponse::ok(report))
}

/// POST /admin/sync/currency
pub async fn sync_currency_catalog(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse<SyncReport>, ApiError> {
    let report = sync_currencies(
        &state.shared.store,
        &state.shared.currency_catalog,
        auth.id,
    )
    .await;

    state
        .shared
        .store
        .activity()
        .add(
            Some(auth.id),
            "sync",
            "currency-catalog",
            None,
            Some(format!(
                "{} fetched, {} failures",
                report.fetched,
                report.failures.len()
            )),
        )
        .await?;

    Ok(ApiResponse::ok(report))
}
