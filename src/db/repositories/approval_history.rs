use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{approval_histories, prelude::*};

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub ref_table: String,
    pub ref_id: i32,
    pub approval_id: i32,
    pub level_index: i32,
    pub user_id: i32,
    pub action: String,
    pub note: Option<String>,
}

pub struct ApprovalHistoryRepository {
    conn: DatabaseConnection,
}

impl ApprovalHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Full stream for one (table, record) key, in append order. Ties on
    /// equal timestamps resolve by the monotonic id.
    pub async fn stream(
        &self,
        ref_table: &str,
        ref_id: i32,
    ) -> Result<Vec<approval_histories::Model>> {
        Ok(ApprovalHistories::find()
            .filter(approval_histories::Column::RefTable.eq(ref_table))
            .filter(approval_histories::Column::RefId.eq(ref_id))
            .order_by_asc(approval_histories::Column::Id)
            .all(&self.conn)
            .await?)
    }

    pub async fn append(&self, event: NewEvent) -> Result<approval_histories::Model> {
        let model = approval_histories::ActiveModel {
            ref_table: Set(event.ref_table),
            ref_id: Set(event.ref_id),
            approval_id: Set(event.approval_id),
            level_index: Set(event.level_index),
            user_id: Set(event.user_id),
            action: Set(event.action),
            note: Set(event.note),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    /// Latest event of every stream. Stream state is derivable from the
    /// last event alone, so this is all the notification view needs.
    pub async fn latest_events(&self) -> Result<Vec<approval_histories::Model>> {
        let ids: Vec<Option<i32>> = ApprovalHistories::find()
            .select_only()
            .column_as(approval_histories::Column::Id.max(), "id")
            .group_by(approval_histories::Column::RefTable)
            .group_by(approval_histories::Column::RefId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let ids: Vec<i32> = ids.into_iter().flatten().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(ApprovalHistories::find()
            .filter(approval_histories::Column::Id.is_in(ids))
            .order_by_asc(approval_histories::Column::Id)
            .all(&self.conn)
            .await?)
    }
}
