use sea_orm::entity::prelude::*;

/// A node in the navigation forest. A menu with a `path` is a leaf that
/// maps to one request path; a menu without one is a group whose children
/// reference it via `parent_key`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub menu_key: i32,

    pub parent_key: Option<i32>,

    pub label: String,

    pub path: Option<String>,

    pub sort_order: i32,

    pub created_at: String,

    pub updated_at: String,

    pub created_by: Option<i32>,

    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_menus::Entity")]
    RoleMenus,
}

impl Related<super::role_menus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMenus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
