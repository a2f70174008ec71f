use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approval_users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub level_id: i32,

    pub user_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_levels::Entity",
        from = "Column::LevelId",
        to = "super::approval_levels::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ApprovalLevels,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::approval_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalLevels.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
