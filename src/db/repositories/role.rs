use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::PageRequest;
use crate::entities::{prelude::*, roles};

pub struct RoleRepository {
    conn: DatabaseConnection,
}

impl RoleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<roles::Model>> {
        Ok(Roles::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<roles::Model>, u64)> {
        let mut query = Roles::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(roles::Column::Code.contains(term))
                    .add(roles::Column::Name.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("code") => roles::Column::Code,
            Some("name") => roles::Column::Name,
            Some("created_at") => roles::Column::CreatedAt,
            _ => roles::Column::Id,
        };
        query = if req.ascending {
            query.order_by_asc(column)
        } else {
            query.order_by_desc(column)
        };

        let paginator = query.paginate(&self.conn, req.rows);
        let total_rows = paginator.num_items().await?;
        let items = paginator.fetch_page(req.page - 1).await?;

        Ok((items, total_rows))
    }

    pub async fn create(&self, code: String, name: String, actor: i32) -> Result<roles::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = roles::ActiveModel {
            code: Set(code),
            name: Set(name),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    pub async fn update(
        &self,
        id: i32,
        code: String,
        name: String,
        actor: i32,
    ) -> Result<Option<roles::Model>> {
        let Some(role) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: roles::ActiveModel = role.into();
        active.code = Set(code);
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Roles::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }
}
