//! Master-data CRUD repositories. Every master entity follows the same
//! mechanical template: paginated searchable list, get, create, update,
//! delete, with actor stamps on writes.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::PageRequest;
use crate::entities::{currencies, departments, machines, prelude::*};

pub struct DepartmentRepository {
    conn: DatabaseConnection,
}

impl DepartmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<departments::Model>> {
        Ok(Departments::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<departments::Model>, u64)> {
        let mut query = Departments::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(departments::Column::Code.contains(term))
                    .add(departments::Column::Name.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("code") => departments::Column::Code,
            Some("name") => departments::Column::Name,
            Some("created_at") => departments::Column::CreatedAt,
            _ => departments::Column::Id,
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

    pub async fn create(
        &self,
        code: String,
        name: String,
        actor: i32,
    ) -> Result<departments::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        Ok(departments::ActiveModel {
            code: Set(code),
            name: Set(name),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn update(
        &self,
        id: i32,
        code: String,
        name: String,
        actor: i32,
    ) -> Result<Option<departments::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: departments::ActiveModel = row.into();
        active.code = Set(code);
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Departments::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }
}

pub struct MachineRepository {
    conn: DatabaseConnection,
}

impl MachineRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<machines::Model>> {
        Ok(Machines::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<machines::Model>, u64)> {
        let mut query = Machines::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(machines::Column::Code.contains(term))
                    .add(machines::Column::Name.contains(term))
                    .add(machines::Column::Location.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("code") => machines::Column::Code,
            Some("name") => machines::Column::Name,
            Some("location") => machines::Column::Location,
            Some("created_at") => machines::Column::CreatedAt,
            _ => machines::Column::Id,
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

    pub async fn create(
        &self,
        code: String,
        name: String,
        location: Option<String>,
        is_active: bool,
        actor: i32,
    ) -> Result<machines::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        Ok(machines::ActiveModel {
            code: Set(code),
            name: Set(name),
            location: Set(location),
            is_active: Set(is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn update(
        &self,
        id: i32,
        code: String,
        name: String,
        location: Option<String>,
        is_active: bool,
        actor: i32,
    ) -> Result<Option<machines::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: machines::ActiveModel = row.into();
        active.code = Set(code);
        active.name = Set(name);
        active.location = Set(location);
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Machines::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }
}

pub struct CurrencyRepository {
    conn: DatabaseConnection,
}

impl CurrencyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<currencies::Model>> {
        Ok(Currencies::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<currencies::Model>> {
        Ok(Currencies::find()
            .filter(currencies::Column::Code.eq(code))
            .one(&self.conn)
            .await?)
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<currencies::Model>, u64)> {
        let mut query = Currencies::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(currencies::Column::Code.contains(term))
                    .add(currencies::Column::Name.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("code") => currencies::Column::Code,
            Some("name") => currencies::Column::Name,
            Some("created_at") => currencies::Column::CreatedAt,
            _ => currencies::Column::Id,
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

    pub async fn create(
        &self,
        code: String,
        name: String,
        symbol: Option<String>,
        actor: i32,
    ) -> Result<currencies::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        Ok(currencies::ActiveModel {
            code: Set(code),
            name: Set(name),
            symbol: Set(symbol),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?)
    }

    pub async fn update(
        &self,
        id: i32,
        code: String,
        name: String,
        symbol: Option<String>,
        actor: i32,
    ) -> Result<Option<currencies::Model>> {
        let Some(row) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: currencies::ActiveModel = row.into();
        active.code = Set(code);
        active.name = Set(name);
        active.symbol = Set(symbol);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));

        Ok(Some(active.update(&self.conn).await?))
    }

    /// Idempotent upsert keyed by currency code, used by the catalog sync.
    pub async fn upsert_by_code(
        &self,
        code: String,
        name: String,
        symbol: Option<String>,
        actor: i32,
    ) -> Result<currencies::Model> {
        match self.get_by_code(&code).await? {
            Some(row) => {
                let id = row.id;
                Ok(self
                    .update(id, code, name, symbol, actor)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Currency {id} vanished during upsert"))?)
            }
            None => self.create(code, name, symbol, actor).await,
        }
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Currencies::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }
}
