use crate::entities::prelude::*;
use crate::entities::{
    approval_users, menus, role_menus, role_permissions, roles, user_roles, users,
};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the default admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Roles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Menus)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserRoles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RoleMenus)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RolePermissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ResetTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Approvals)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApprovalLevels)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApprovalUsers)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ApprovalHistories)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Departments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Machines)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Currencies)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ActivityLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Link tables are unique on their pair, not just the surrogate id
        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_pair")
                    .table(UserRoles)
                    .col(user_roles::Column::UserId)
                    .col(user_roles::Column::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_menus_pair")
                    .table(RoleMenus)
                    .col(role_menus::Column::RoleId)
                    .col(role_menus::Column::MenuId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_permissions_pair")
                    .table(RolePermissions)
                    .col(role_permissions::Column::RoleId)
                    .col(role_permissions::Column::MenuId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_users_pair")
                    .table(ApprovalUsers)
                    .col(approval_users::Column::LevelId)
                    .col(approval_users::Column::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_levels_index")
                    .table(ApprovalLevels)
                    .col(crate::entities::approval_levels::Column::ApprovalId)
                    .col(crate::entities::approval_levels::Column::LevelIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approval_histories_stream")
                    .table(ApprovalHistories)
                    .col(crate::entities::approval_histories::Column::RefTable)
                    .col(crate::entities::approval_histories::Column::RefId)
                    .col(crate::entities::approval_histories::Column::Id)
                    .unique()
                    .to_owned(),
            )
            .await?;

        seed(manager).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Machines).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalHistories).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalUsers).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ApprovalLevels).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Approvals).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResetTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolePermissions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RoleMenus).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRoles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Menus).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}

/// Seed the admin account, the administration menu subtree and an ADMIN
/// role holding full flags on every leaf, so a fresh install is usable.
async fn seed(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash = hash_default_password();

    let insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Users)
        .columns([
            users::Column::Id,
            users::Column::Username,
            users::Column::DisplayName,
            users::Column::Email,
            users::Column::PasswordHash,
            users::Column::IsTwoFa,
            users::Column::IsActive,
            users::Column::CreatedAt,
            users::Column::UpdatedAt,
        ])
        .values_panic([
            1.into(),
            "admin".into(),
            "Administrator".into(),
            "admin@localhost".into(),
            password_hash.into(),
            false.into(),
            true.into(),
            now.clone().into(),
            now.clone().into(),
        ])
        .to_owned();
    manager.exec_stmt(insert).await?;

    let leaves: [(i32, &str, &str); 6] = [
        (2, "Users", "/admin/master/user"),
        (3, "Roles", "/admin/master/role"),
        (4, "Menus", "/admin/master/menu"),
        (5, "Departments", "/admin/master/department"),
        (6, "Machines", "/admin/master/machine"),
        (7, "Currencies", "/admin/master/currency"),
    ];

    let mut insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Menus)
        .columns([
            menus::Column::Id,
            menus::Column::MenuKey,
            menus::Column::ParentKey,
            menus::Column::Label,
            menus::Column::Path,
            menus::Column::SortOrder,
            menus::Column::CreatedAt,
            menus::Column::UpdatedAt,
        ])
        .to_owned();
    insert.values_panic([
        1.into(),
        1.into(),
        Option::<i32>::None.into(),
        "Administration".into(),
        Option::<String>::None.into(),
        1.into(),
        now.clone().into(),
        now.clone().into(),
    ]);
    for (sort, (id, label, path)) in leaves.iter().enumerate() {
        insert.values_panic([
            (*id).into(),
            (*id).into(),
            1.into(),
            (*label).into(),
            (*path).into(),
            (sort as i32 + 1).into(),
            now.clone().into(),
            now.clone().into(),
        ]);
    }
    manager.exec_stmt(insert).await?;

    let insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(Roles)
        .columns([
            roles::Column::Id,
            roles::Column::Code,
            roles::Column::Name,
            roles::Column::CreatedAt,
            roles::Column::UpdatedAt,
        ])
        .values_panic([
            1.into(),
            "ADMIN".into(),
            "Administrator".into(),
            now.clone().into(),
            now.clone().into(),
        ])
        .to_owned();
    manager.exec_stmt(insert).await?;

    let insert = sea_orm_migration::sea_query::Query::insert()
        .into_table(UserRoles)
        .columns([user_roles::Column::UserId, user_roles::Column::RoleId])
        .values_panic([1.into(), 1.into()])
        .to_owned();
    manager.exec_stmt(insert).await?;

    let mut link = sea_orm_migration::sea_query::Query::insert()
        .into_table(RoleMenus)
        .columns([role_menus::Column::RoleId, role_menus::Column::MenuId])
        .to_owned();
    let mut perms = sea_orm_migration::sea_query::Query::insert()
        .into_table(RolePermissions)
        .columns([
            role_permissions::Column::RoleId,
            role_permissions::Column::MenuId,
            role_permissions::Column::MayCreate,
            role_permissions::Column::MayUpdate,
            role_permissions::Column::MayDelete,
            role_permissions::Column::CreatedAt,
            role_permissions::Column::UpdatedAt,
        ])
        .to_owned();
    for (id, _, _) in &leaves {
        link.values_panic([1.into(), (*id).into()]);
        perms.values_panic([
            1.into(),
            (*id).into(),
            true.into(),
            true.into(),
            true.into(),
            now.clone().into(),
            now.clone().into(),
        ]);
    }
    manager.exec_stmt(link).await?;
    manager.exec_stmt(perms).await?;

    Ok(())
}
