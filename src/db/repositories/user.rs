use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tokio::task;

use super::PageRequest;
use crate::entities::{prelude::*, users};

/// User data handed out of the repository (password hash stripped)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub totp_url: Option<String>,
    pub is_two_fa: bool,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            email: model.email,
            totp_url: model.totp_url,
            is_two_fa: model.is_two_fa,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Full credential row, for the session service only. Username lookup
    /// is case-sensitive and backed by the unique index.
    pub async fn get_credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<users::Model>> {
        Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn get_credentials_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        Ok(self.get_credentials_by_id(id).await?.map(User::from))
    }

    pub async fn list(&self, req: &PageRequest) -> Result<(Vec<User>, u64)> {
        let mut query = Users::find();

        if let Some(term) = &req.search {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Username.contains(term))
                    .add(users::Column::DisplayName.contains(term))
                    .add(users::Column::Email.contains(term)),
            );
        }

        let column = match req.sort_by.as_deref() {
            Some("username") => users::Column::Username,
            Some("display_name") => users::Column::DisplayName,
            Some("email") => users::Column::Email,
            Some("created_at") => users::Column::CreatedAt,
            _ => users::Column::Id,
        };
        query = if req.ascending {
            query.order_by_asc(column)
        } else {
            query.order_by_desc(column)
        };

        let paginator = query.paginate(&self.conn, req.rows);
        let total_rows = paginator.num_items().await?;
        let items = paginator.fetch_page(req.page - 1).await?;

        Ok((items.into_iter().map(User::from).collect(), total_rows))
    }

    pub async fn create(&self, new: NewUser, actor: i32) -> Result<User> {
        let password_hash = hash_password_blocking(new.password).await?;
        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            username: Set(new.username),
            display_name: Set(new.display_name),
            email: Set(new.email),
            password_hash: Set(password_hash),
            is_two_fa: Set(false),
            is_active: Set(new.is_active),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(User::from(model))
    }

    pub async fn update(
        &self,
        id: i32,
        display_name: String,
        email: String,
        is_active: bool,
        actor: i32,
    ) -> Result<Option<User>> {
        let Some(user) = self.get_credentials_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.display_name = Set(display_name);
        active.email = Set(email);
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.updated_by = Set(Some(actor));
        let model = active.update(&self.conn).await?;

        Ok(Some(User::from(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Users::delete_by_id(id).exec(&self.conn).await?;
        Ok(res.rows_affected > 0)
    }

    /// Idempotent upsert keyed by username, used by the HR-directory
    /// sync. New accounts arrive inactive with an unguessable password;
    /// an administrator activates them and issues a reset link.
    pub async fn upsert_directory_entry(
        &self,
        username: &str,
        display_name: &str,
        email: Option<&str>,
        actor: i32,
    ) -> Result<bool> {
        match self.get_credentials_by_username(username).await? {
            Some(user) => {
                let mut active: users::ActiveModel = user.into();
                active.display_name = Set(display_name.to_string());
                if let Some(email) = email {
                    active.email = Set(email.to_string());
                }
                active.updated_at = Set(chrono::Utc::now().to_rfc3339());
                active.updated_by = Set(Some(actor));
                active.update(&self.conn).await?;
                Ok(false)
            }
            None => {
                self.create(
                    NewUser {
                        username: username.to_string(),
                        display_name: display_name.to_string(),
                        email: email.unwrap_or_default().to_string(),
                        password: generate_opaque_token(),
                        is_active: false,
                    },
                    actor,
                )
                .await?;
                Ok(true)
            }
        }
    }

    /// Verify a password against the stored hash. Argon2 is CPU-bound, so
    /// the comparison runs under `spawn_blocking`.
    pub async fn verify_password(&self, user: &users::Model, password: &str) -> Result<bool> {
        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_password_hash(&self, user_id: i32, password: String) -> Result<()> {
        let user = self
            .get_credentials_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let new_hash = hash_password_blocking(password).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Overwrite the single rotation-token slot. Passing `None` logs the
    /// user out of the rotation path entirely.
    pub async fn set_rotation_token(&self, user_id: i32, token: Option<String>) -> Result<()> {
        let user = self
            .get_credentials_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.rotation_token = Set(token);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Persist a fresh TOTP secret and its provisioning URL first, then
    /// flip the 2FA flag. The flag must never be set while the secret is
    /// absent.
    pub async fn enable_two_fa(&self, user_id: i32, secret: String, url: String) -> Result<()> {
        let user = self
            .get_credentials_by_id(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.totp_secret = Set(Some(secret));
        active.totp_url = Set(Some(url));
        let updated = active.update(&self.conn).await?;

        let mut active: users::ActiveModel = updated.into();
        active.is_two_fa = Set(true);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password with Argon2id on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with default params.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate an opaque high-entropy token (64 character hex string)
#[must_use]
pub fn generate_opaque_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
