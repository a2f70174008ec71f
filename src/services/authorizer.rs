use anyhow::Result;

use crate::db::repositories::permission::ActionFlags;
use crate::db::Store;

/// Write actions the permission matrix distinguishes. Read is absent on
/// purpose: reaching an endpoint only requires a role→menu link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// Resolves a user's effective action flags for one request path by
/// OR-reducing the RolePermission rows of every (role, menu) pair the
/// user can reach on that path.
pub struct Authorizer {
    store: Store,
}

impl Authorizer {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn effective_flags(&self, user_id: i32, path: &str) -> Result<ActionFlags> {
        let menu_ids = self.store.menus().ids_by_path(path).await?;
        self.store
            .permissions()
            .effective_flags(user_id, &menu_ids)
            .await
    }

    /// Whether the user may perform `action` on the menu path. No
    /// matching permission row means every flag is false and the caller
    /// must treat the action as forbidden.
    pub async fn allows(&self, user_id: i32, path: &str, action: Action) -> Result<bool> {
        let menu_ids = self.store.menus().ids_by_path(path).await?;

        if matches!(action, Action::Read) {
            return self.store.permissions().read_allowed(user_id, &menu_ids).await;
        }

        let flags = self
            .store
            .permissions()
            .effective_flags(user_id, &menu_ids)
            .await?;

        Ok(match action {
            Action::Read => unreachable!(),
            Action::Create => flags.may_create,
            Action::Update => flags.may_update,
            Action::Delete => flags.may_delete,
        })
    }
}

/// Reduce a request path to the menu path it is authorized against:
/// the `/api` prefix goes, and everything from the first numeric
/// segment on goes (`/api/admin/master/user/5/roles` →
/// `/admin/master/user`).
#[must_use]
pub fn normalize_menu_path(request_path: &str) -> String {
    let path = request_path.strip_prefix("/api").unwrap_or(request_path);

    let mut normalized = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_api_prefix() {
        assert_eq!(
            normalize_menu_path("/api/admin/master/department"),
            "/admin/master/department"
        );
    }

    #[test]
    fn truncates_at_first_numeric_segment() {
        assert_eq!(
            normalize_menu_path("/api/admin/master/user/5/roles"),
            "/admin/master/user"
        );
        assert_eq!(
            normalize_menu_path("/admin/master/department/42"),
            "/admin/master/department"
        );
    }

    #[test]
    fn leaves_plain_paths_alone() {
        assert_eq!(normalize_menu_path("/admin/master/machine"), "/admin/master/machine");
        assert_eq!(normalize_menu_path("/"), "/");
    }
}
