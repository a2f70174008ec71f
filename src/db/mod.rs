use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::PageRequest;
pub use repositories::permission::ActionFlags;
pub use repositories::user::User;

/// Handle to the relational store. The database owns every entity's
/// persisted state; repositories are cheap per-call views over the pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn roles(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn menus(&self) -> repositories::menu::MenuRepository {
        repositories::menu::MenuRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn permissions(&self) -> repositories::permission::PermissionRepository {
        repositories::permission::PermissionRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn approvals(&self) -> repositories::approval::ApprovalRepository {
        repositories::approval::ApprovalRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn approval_history(&self) -> repositories::approval_history::ApprovalHistoryRepository {
        repositories::approval_history::ApprovalHistoryRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn reset_tokens(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn departments(&self) -> repositories::master::DepartmentRepository {
        repositories::master::DepartmentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn machines(&self) -> repositories::master::MachineRepository {
        repositories::master::MachineRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn currencies(&self) -> repositories::master::CurrencyRepository {
        repositories::master::CurrencyRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn activity(&self) -> repositories::activity::ActivityRepository {
        repositories::activity::ActivityRepository::new(self.conn.clone())
    }
}
