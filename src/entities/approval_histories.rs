use sea_orm::entity::prelude::*;

/// Append-only approval event. The stream for one (`ref_table`,
/// `ref_id`) pair is ordered by id; events are never edited or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approval_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub ref_table: String,

    pub ref_id: i32,

    pub approval_id: i32,

    /// Pending level at the time the event was recorded
    pub level_index: i32,

    pub user_id: i32,

    /// One of: submit, approve, reject, revise
    pub action: String,

    pub note: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approvals::Entity",
        from = "Column::ApprovalId",
        to = "super::approvals::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Approvals,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
