use std::collections::HashSet;

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

use crate::entities::{prelude::*, role_menus, role_permissions, user_roles};

/// Aggregated write flags for one (user, path) pair. Absence of any
/// matching row means all three are false and the action is forbidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    pub may_create: bool,
    pub may_update: bool,
    pub may_delete: bool,
}

pub struct PermissionRepository {
    conn: DatabaseConnection,
}

impl PermissionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn role_ids_for_user(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids = UserRoles::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .select_only()
            .column(user_roles::Column::RoleId)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    pub async fn user_ids_for_role(&self, role_id: i32) -> Result<Vec<i32>> {
        let ids = UserRoles::find()
            .filter(user_roles::Column::RoleId.eq(role_id))
            .select_only()
            .column(user_roles::Column::UserId)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    pub async fn menu_ids_for_role(&self, role_id: i32) -> Result<Vec<i32>> {
        let ids = RoleMenus::find()
            .filter(role_menus::Column::RoleId.eq(role_id))
            .select_only()
            .column(role_menus::Column::MenuId)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    /// Flat set of menu ids reachable through the user's roles. The tree
    /// service consumes this for the per-user projection, so the recursion
    /// never touches the database.
    pub async fn permitted_menu_ids(&self, user_id: i32) -> Result<HashSet<i32>> {
        let role_ids = self.role_ids_for_user(user_id).await?;
        if role_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = RoleMenus::find()
            .filter(role_menus::Column::RoleId.is_in(role_ids))
            .select_only()
            .column(role_menus::Column::MenuId)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Replace the complete role set of one user. Delete + insert run in a
    /// single transaction so a failed insert leaves the prior set intact.
    pub async fn replace_user_roles(&self, user_id: i32, role_ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;

        UserRoles::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        if !role_ids.is_empty() {
            let links: Vec<user_roles::ActiveModel> = role_ids
                .iter()
                .map(|role_id| user_roles::ActiveModel {
                    user_id: Set(user_id),
                    role_id: Set(*role_id),
                    ..Default::default()
                })
                .collect();

            UserRoles::insert_many(links).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Replace the complete menu set of one role, same contract as
    /// `replace_user_roles`.
    pub async fn replace_role_menus(&self, role_id: i32, menu_ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;

        RoleMenus::delete_many()
            .filter(role_menus::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        if !menu_ids.is_empty() {
            let links: Vec<role_menus::ActiveModel> = menu_ids
                .iter()
                .map(|menu_id| role_menus::ActiveModel {
                    role_id: Set(role_id),
                    menu_id: Set(*menu_id),
                    ..Default::default()
                })
                .collect();

            RoleMenus::insert_many(links).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Upsert the action flags for one (role, menu) pair. There is no
    /// delete; revocation clears the flags.
    pub async fn upsert_role_permission(
        &self,
        role_id: i32,
        menu_id: i32,
        flags: ActionFlags,
        actor: i32,
    ) -> Result<role_permissions::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let existing = RolePermissions::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::MenuId.eq(menu_id))
            .one(&self.conn)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: role_permissions::ActiveModel = row.into();
                active.may_create = Set(flags.may_create);
                active.may_update = Set(flags.may_update);
                active.may_delete = Set(flags.may_delete);
                active.updated_at = Set(now);
                active.updated_by = Set(Some(actor));
                active.update(&self.conn).await?
            }
            None => {
                role_permissions::ActiveModel {
                    role_id: Set(role_id),
                    menu_id: Set(menu_id),
                    may_create: Set(flags.may_create),
                    may_update: Set(flags.may_update),
                    may_delete: Set(flags.may_delete),
                    created_at: Set(now.clone()),
                    updated_at: Set(now),
                    created_by: Set(Some(actor)),
                    updated_by: Set(Some(actor)),
                    ..Default::default()
                }
                .insert(&self.conn)
                .await?
            }
        };

        Ok(model)
    }

    pub async fn permissions_for_role(&self, role_id: i32) -> Result<Vec<role_permissions::Model>> {
        Ok(RolePermissions::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .all(&self.conn)
            .await?)
    }

    /// Effective flags for (user, menu set): OR-reduction over every
    /// RolePermission row whose role belongs to the user and whose menu is
    /// in the given set.
    pub async fn effective_flags(&self, user_id: i32, menu_ids: &[i32]) -> Result<ActionFlags> {
        if menu_ids.is_empty() {
            return Ok(ActionFlags::default());
        }

        let role_ids = self.role_ids_for_user(user_id).await?;
        if role_ids.is_empty() {
            return Ok(ActionFlags::default());
        }

        let rows = RolePermissions::find()
            .filter(role_permissions::Column::RoleId.is_in(role_ids))
            .filter(role_permissions::Column::MenuId.is_in(menu_ids.to_vec()))
            .all(&self.conn)
            .await?;

        Ok(rows.iter().fold(ActionFlags::default(), |acc, row| {
            ActionFlags {
                may_create: acc.may_create || row.may_create,
                may_update: acc.may_update || row.may_update,
                may_delete: acc.may_delete || row.may_delete,
            }
        }))
    }

    /// Read access: any role→menu link on one of the given menus suffices.
    pub async fn read_allowed(&self, user_id: i32, menu_ids: &[i32]) -> Result<bool> {
        if menu_ids.is_empty() {
            return Ok(false);
        }

        let role_ids = self.role_ids_for_user(user_id).await?;
        if role_ids.is_empty() {
            return Ok(false);
        }

        let count = RoleMenus::find()
            .filter(role_menus::Column::RoleId.is_in(role_ids))
            .filter(role_menus::Column::MenuId.is_in(menu_ids.to_vec()))
            .count(&self.conn)
            .await?;

        Ok(count > 0)
    }
}
