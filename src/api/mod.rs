use axum::{
    Router,
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::authorizer::{Action, normalize_menu_path};
use crate::state::SharedState;

pub mod approvals;
pub mod auth;
mod error;
pub mod master;
pub mod menus;
pub mod role_permission;
pub mod roles;
pub mod sync;
mod types;
pub mod users;
mod validation;

pub use error::ApiError;
pub use types::{ApiResponse, ListQuery, PageInfo, Paginated};

pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/two-fa", post(auth::two_fa))
        .route("/auth/token", get(auth::refresh_token))
        .route("/auth/password-reset", post(auth::password_reset))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Master-data CRUD is additionally guarded by the path-keyed
    // permission matrix; method → required action.
    let master_routes = Router::new()
        .route(
            "/admin/master/user",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/admin/master/user/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/admin/master/user/{id}/roles", put(users::replace_user_roles))
        .route(
            "/admin/master/role",
            get(roles::list_roles).post(roles::create_role),
        )
        .route(
            "/admin/master/role/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/admin/master/role/{id}/menus", put(roles::replace_role_menus))
        .route(
            "/admin/master/menu",
            get(menus::list_menus).post(menus::create_menu),
        )
        .route(
            "/admin/master/menu/{id}",
            get(menus::get_menu)
                .put(menus::update_menu)
                .delete(menus::delete_menu),
        )
        .route(
            "/admin/master/department",
            get(master::list_departments).post(master::create_department),
        )
        .route(
            "/admin/master/department/{id}",
            get(master::get_department)
                .put(master::update_department)
                .delete(master::delete_department),
        )
        .route(
            "/admin/master/machine",
            get(master::list_machines).post(master::create_machine),
        )
        .route(
            "/admin/master/machine/{id}",
            get(master::get_machine)
                .put(master::update_machine)
                .delete(master::delete_machine),
        )
        .route(
            "/admin/master/currency",
            get(master::list_currencies).post(master::create_currency),
        )
        .route(
            "/admin/master/currency/{id}",
            get(master::get_currency)
                .put(master::update_currency)
                .delete(master::delete_currency),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authorize_middleware,
        ));

    Router::new()
        .merge(master_routes)
        .route("/auth/logout", delete(auth::logout))
        .route("/auth/user-info", get(auth::user_info))
        .route("/auth/change-password", put(auth::change_password))
        .route("/auth/{id}/two-fa", put(auth::enrol_two_fa))
        .route("/auth/send-password-reset", post(auth::send_password_reset))
        .route("/admin/master/tree-menu", get(menus::tree_menu))
        .route("/admin/master/tree-menu/user", get(menus::tree_menu_for_user))
        .route(
            "/admin/role-permission/{id}",
            get(role_permission::get_role_permissions),
        )
        .route(
            "/admin/role-permission",
            post(role_permission::upsert_role_permission),
        )
        .route(
            "/admin/approval",
            get(approvals::list_definitions).post(approvals::create_definition),
        )
        .route(
            "/admin/approval/{id}",
            get(approvals::get_definition)
                .put(approvals::update_definition)
                .delete(approvals::delete_definition),
        )
        .route("/admin/approval/{id}/menu", get(approvals::get_definition_for_menu))
        .route("/admin/approval/{id}/level", post(approvals::add_level))
        .route("/admin/approval/level/{id}", delete(approvals::delete_level))
        .route(
            "/admin/approval/level/{id}/users",
            put(approvals::replace_level_users),
        )
        .route("/admin/approval-history", post(approvals::post_history))
        .route(
            "/admin/approval-history/notifications",
            get(approvals::notifications),
        )
        .route(
            "/admin/approval-history/{table}/{id}",
            get(approvals::get_history),
        )
        .route("/admin/activity-log", get(master::list_activity))
        .route("/admin/sync/employee", post(sync::sync_employee_directory))
        .route("/admin/sync/currency", post(sync::sync_currency_catalog))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Path-keyed authorization over the master-data surface. Reads need a
/// role→menu link on the request path; writes need the matching flag in
/// the permission matrix. No matching row means forbidden.
async fn authorize_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = request
        .extensions()
        .get::<auth::AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("missing authentication".to_string()))?;

    let path = normalize_menu_path(request.uri().path());
    let action = match request.method().as_str() {
        "POST" => Action::Create,
        "PUT" | "PATCH" => Action::Update,
        "DELETE" => Action::Delete,
        _ => Action::Read,
    };

    let allowed = state
        .shared
        .authorizer
        .allows(auth.id, &path, action)
        .await
        .map_err(ApiError::from)?;

    if !allowed {
        return Err(ApiError::Forbidden(format!(
            "no permission for {path}"
        )));
    }

    Ok(next.run(request).await)
}
