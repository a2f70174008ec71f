pub mod prelude;

pub mod activity_logs;
pub mod approval_histories;
pub mod approval_levels;
pub mod approval_users;
pub mod approvals;
pub mod currencies;
pub mod departments;
pub mod machines;
pub mod menus;
pub mod reset_tokens;
pub mod role_menus;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;
