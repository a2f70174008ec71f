use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::PageRequest;
use crate::entities::{menus, prelude::*};

#[derive(Debug, Clone)]
pub struct NewMenu {
    pub menu_key: i32,
    pub parent_key: Option<i32>,
    pub label: String,
    pub path: Option<String>,
    pub sort_order: i32,
}

pub struct MenuRepository {
    conn: DatabaseConnection,
}

impl MenuRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<menus::Model>> {
        Ok(Menus::find_by_id(id).one(&self.conn).await?)
    }

    /// Every menu row, sibling-ordered: the tree service assembles the
    /// forest from this flat list in one pass.
    pub async fn load_all(&self) -> Result<Vec<menus::Model>> {
        Ok(Menus::find()
            .order_by_asc(menus::Column::SortOrder)
            .order_by_asc(menus::Column::MenuKey)
            .all(&self.conn)
            .await?)
    }

    /// Ids of every menu whose path equals the given one. Normally a
    /// single id; duplicates are tolerated by the authorization resolver.
    pub async fn ids_by_path(&self, path: &str) -> Result<Vec<i32>> {
        Ok(Menus::find()
            .filter(menus::Column::Path.eq(path))
            .select_only()
            .column(menus::Column::Id)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<menus::Model>, u64)> {
        let mut query = Menus::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(menus::Column::Label.contains(term))
                    .add(menus::Column::Path.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("label") => menus::Column::Label,
            Some("menu_key") => menus::Column::MenuKey,
            Some("sort_order") => menus::Column::SortOrder,
            _ => menus::Column::Id,
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

    pub async fn create(&self, new: NewMenu, actor: i32) -> Result<menus::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = menus::ActiveModel {
            menu_key: Set(new.menu_key),
            parent_key: Set(new.parent_key),
            label: Set(new.label),
            path: Set(new.path),
            sort_order: Set(new.sort_order),
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

    pub async fn update(&self, id: i32, new: NewMenu, actor: i32) -> Result<Option<menus::Model>> {
        let Some(menu) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: menus::ActiveModel = menu.into();
        active.menu_key = Set(new.menu_key);
        active.parent_key = Set(new.parent_key);
        active.label = Set(new.label);
        active.path = Set(new.path);
        active.sort_order = Set(new.sort_order);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Menus::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }
}
