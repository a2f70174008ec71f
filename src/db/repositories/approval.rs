use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::PageRequest;
use crate::entities::{approval_levels, approval_users, approvals, prelude::*};

/// One approval level together with its allowed approver set.
#[derive(Debug, Clone)]
pub struct LevelWithUsers {
    pub level: approval_levels::Model,
    pub user_ids: Vec<i32>,
}

/// A definition with its chain, ordered by level index ascending.
#[derive(Debug, Clone)]
pub struct DefinitionWithLevels {
    pub definition: approvals::Model,
    pub levels: Vec<LevelWithUsers>,
}

pub struct ApprovalRepository {
    conn: DatabaseConnection,
}

impl ApprovalRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<approvals::Model>> {
        Ok(Approvals::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<approvals::Model>, u64)> {
        let mut query = Approvals::find();

        if let Some(term) = &req.search {
            query = query.filter(approvals::Column::Name.contains(term));
        }

        let column = match req.sort_by.as_deref() {
            Some("name") => approvals::Column::Name,
            Some("created_at") => approvals::Column::CreatedAt,
            _ => approvals::Column::Id,
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

    pub async fn create(&self, menu_id: i32, name: String, actor: i32) -> Result<approvals::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = approvals::ActiveModel {
            menu_id: Set(menu_id),
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
        menu_id: i32,
        name: String,
        actor: i32,
    ) -> Result<Option<approvals::Model>> {
        let Some(def) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: approvals::ActiveModel = def.into();
        active.menu_id = Set(menu_id);
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));
        let model = active.update(&self.conn).await?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Approvals::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }

    /// Append a level to a definition. Indices must stay contiguous from 1,
    /// so the only index accepted is current max + 1.
    pub async fn add_level(&self, approval_id: i32, level_index: i32) -> Result<LevelAddOutcome> {
        let max: Option<i32> = ApprovalLevels::find()
            .filter(approval_levels::Column::ApprovalId.eq(approval_id))
            .select_only()
            .column_as(approval_levels::Column::LevelIndex.max(), "max")
            .into_tuple()
            .one(&self.conn)
            .await?
            .flatten();

        let expected = max.unwrap_or(0) + 1;
        if level_index != expected {
            return Ok(LevelAddOutcome::GapRejected { expected });
        }

        let model = approval_levels::ActiveModel {
            approval_id: Set(approval_id),
            level_index: Set(level_index),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(LevelAddOutcome::Added(model))
    }

    /// Only the highest level may be removed; deleting from the middle
    /// would leave a gap in the 1..N sequence.
    pub async fn delete_level(&self, level_id: i32) -> Result<LevelDeleteOutcome> {
        let Some(level) = ApprovalLevels::find_by_id(level_id).one(&self.conn).await? else {
            return Ok(LevelDeleteOutcome::NotFound);
        };

        let max: Option<i32> = ApprovalLevels::find()
            .filter(approval_levels::Column::ApprovalId.eq(level.approval_id))
            .select_only()
            .column_as(approval_levels::Column::LevelIndex.max(), "max")
            .into_tuple()
            .one(&self.conn)
            .await?
            .flatten();

        if Some(level.level_index) != max {
            return Ok(LevelDeleteOutcome::NotTopLevel);
        }

        ApprovalLevels::delete_by_id(level_id).exec(&self.conn).await?;
        Ok(LevelDeleteOutcome::Deleted)
    }

    /// Replace the complete approver set of one level inside a single
    /// transaction.
    pub async fn replace_level_users(&self, level_id: i32, user_ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;

        ApprovalUsers::delete_many()
            .filter(approval_users::Column::LevelId.eq(level_id))
            .exec(&txn)
            .await?;

        if !user_ids.is_empty() {
            let links: Vec<approval_users::ActiveModel> = user_ids
                .iter()
                .map(|user_id| approval_users::ActiveModel {
                    level_id: Set(level_id),
                    user_id: Set(*user_id),
                    ..Default::default()
                })
                .collect();

            ApprovalUsers::insert_many(links).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn get_level(&self, level_id: i32) -> Result<Option<approval_levels::Model>> {
        Ok(ApprovalLevels::find_by_id(level_id).one(&self.conn).await?)
    }

    pub async fn get_by_menu(&self, menu_id: i32) -> Result<Option<DefinitionWithLevels>> {
        let Some(definition) = Approvals::find()
            .filter(approvals::Column::MenuId.eq(menu_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let levels = self.levels_with_users(definition.id).await?;
        Ok(Some(DefinitionWithLevels { definition, levels }))
    }

    pub async fn get_with_levels(&self, approval_id: i32) -> Result<Option<DefinitionWithLevels>> {
        let Some(definition) = self.get(approval_id).await? else {
            return Ok(None);
        };

        let levels = self.levels_with_users(definition.id).await?;
        Ok(Some(DefinitionWithLevels { definition, levels }))
    }

    async fn levels_with_users(&self, approval_id: i32) -> Result<Vec<LevelWithUsers>> {
        let levels = ApprovalLevels::find()
            .filter(approval_levels::Column::ApprovalId.eq(approval_id))
            .order_by_asc(approval_levels::Column::LevelIndex)
            .all(&self.conn)
            .await?;

        let mut out = Vec::with_capacity(levels.len());
        for level in levels {
            let user_ids = ApprovalUsers::find()
                .filter(approval_users::Column::LevelId.eq(level.id))
                .select_only()
                .column(approval_users::Column::UserId)
                .into_tuple::<i32>()
                .all(&self.conn)
                .await?;
            out.push(LevelWithUsers { level, user_ids });
        }

        Ok(out)
    }
}

#[derive(Debug)]
pub enum LevelAddOutcome {
    Added(approval_levels::Model),
    GapRejected { expected: i32 },
}

#[derive(Debug)]
pub enum LevelDeleteOutcome {
    Deleted,
    NotFound,
    NotTopLevel,
}
