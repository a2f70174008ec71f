use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{prelude::*, reset_tokens, users};

/// Why a presented reset token is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenRejection {
    Unknown,
    Expired,
    AlreadyUsed,
}

pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: i32,
        token: String,
        expires_at: String,
    ) -> Result<reset_tokens::Model> {
        let model = reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(token),
            expires_at: Set(expires_at),
            used: Set(false),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(model)
    }

    /// Consume a reset token: validate it, store the new password hash and
    /// mark the token used, all in one transaction. A token is single-use;
    /// expiry and the used flag are both checked at consume time.
    pub async fn consume(
        &self,
        token: &str,
        new_password_hash: String,
    ) -> Result<std::result::Result<i32, ResetTokenRejection>> {
        let txn = self.conn.begin().await?;

        let Some(row) = ResetTokens::find()
            .filter(reset_tokens::Column::Token.eq(token))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(Err(ResetTokenRejection::Unknown));
        };

        if row.used {
            txn.rollback().await?;
            return Ok(Err(ResetTokenRejection::AlreadyUsed));
        }

        let expires = chrono::DateTime::parse_from_rfc3339(&row.expires_at)
            .context("Malformed reset-token expiry")?;
        if expires < chrono::Utc::now() {
            txn.rollback().await?;
            return Ok(Err(ResetTokenRejection::Expired));
        }

        let user_id = row.user_id;

        let user = Users::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Reset token references missing user {user_id}"))?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_password_hash);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&txn).await?;

        let mut active: reset_tokens::ActiveModel = row.into();
        active.used = Set(true);
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(Ok(user_id))
    }
}
