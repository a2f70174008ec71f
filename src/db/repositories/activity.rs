use anyhow::Result;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use super::PageRequest;
use crate::entities::{activity_logs, prelude::*};

pub struct ActivityRepository {
    conn: DatabaseConnection,
}

impl ActivityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(
        &self,
        user_id: Option<i32>,
        action: &str,
        entity: &str,
        entity_id: Option<i32>,
        detail: Option<String>,
    ) -> Result<()> {
        let active_model = activity_logs::ActiveModel {
            user_id: Set(user_id),
            action: Set(action.to_string()),
            entity: Set(entity.to_string()),
            entity_id: Set(entity_id),
            detail: Set(detail),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        ActivityLogs::insert(active_model).exec(&self.conn).await?;
        Ok(())
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<activity_logs::Model>, u64)> {
        let mut query = ActivityLogs::find().order_by_desc(activity_logs::Column::Id);

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(activity_logs::Column::Action.contains(term))
                    .add(activity_logs::Column::Entity.contains(term))
                    .add(activity_logs::Column::Detail.contains(term)),
            );
        }

        let paginator = query.paginate(&self.conn, req.rows);
        let total_rows = paginator.num_items().await?;
        let items = paginator.fetch_page(req.page - 1).await?;

        Ok((items, total_rows))
    }
}
