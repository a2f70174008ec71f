use sea_orm::entity::prelude::*;

/// One step of an approval chain. Level indices within a definition form
/// the contiguous sequence 1..N.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approval_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub approval_id: i32,

    pub level_index: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approvals::Entity",
        from = "Column::ApprovalId",
        to = "super::approvals::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Approvals,
    #[sea_orm(has_many = "super::approval_users::Entity")]
    ApprovalUsers,
}

impl Related<super::approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl Related<super::approval_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
