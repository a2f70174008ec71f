use sea_orm::entity::prelude::*;

/// Approval definition attached to a menu: an ordered chain of approver
/// groups (see `approval_levels`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub menu_id: i32,

    pub name: String,

    pub created_at: String,

    pub updated_at: String,

    pub created_by: Option<i32>,

    pub updated_by: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::menus::Entity",
        from = "Column::MenuId",
        to = "super::menus::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Menus,
    #[sea_orm(has_many = "super::approval_levels::Entity")]
    ApprovalLevels,
}

impl Related<super::menus::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menus.def()
    }
}

impl Related<super::approval_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalLevels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
