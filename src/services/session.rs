use std::sync::Arc;

use thiserror::Error;

use crate::db::Store;
use crate::db::repositories::reset_token::ResetTokenRejection;
use crate::db::repositories::user::{
    User, generate_opaque_token, hash_password_blocking,
};
use crate::entities::users;
use crate::services::mailer::Mailer;
use crate::services::token::{TokenError, TokenKind, TokenService};
use crate::services::totp::{Enrolment, TotpService};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("user not found")]
    NotFound,
    #[error("account is inactive")]
    Inactive,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("two-factor authentication is required")]
    TwoFactorRequired,
    #[error("invalid one-time password")]
    InvalidOtp,
    #[error("two-factor authentication is not enrolled for this account")]
    TwoFactorNotEnrolled,
    #[error("token is invalid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("reset token has already been used")]
    UsedToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::ExpiredToken,
            TokenError::Invalid | TokenError::WrongAlgorithm => Self::InvalidToken,
        }
    }
}

/// Access + rotation pair minted on a completed login.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access: String,
    pub rotation: String,
}

/// What a correct password buys: either tokens, or a demand for the
/// second factor first.
pub enum LoginOutcome {
    Tokens(Box<User>, IssuedTokens),
    TwoFactorRequired,
}

/// Orchestrates login, second-factor verification, token rotation,
/// logout and the password lifecycle. Every credential mismatch is
/// reported; nothing is retried silently.
pub struct SessionService {
    store: Store,
    tokens: Arc<TokenService>,
    totp: TotpService,
    mailer: Arc<dyn Mailer>,
    reset_base_url: String,
    reset_ttl_hours: i64,
}

impl SessionService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: Arc<TokenService>,
        totp: TotpService,
        mailer: Arc<dyn Mailer>,
        reset_base_url: String,
        reset_ttl_hours: i64,
    ) -> Self {
        Self {
            store,
            tokens,
            totp,
            mailer,
            reset_base_url,
            reset_ttl_hours,
        }
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, SessionError> {
        let user = self.active_user_by_username(username).await?;

        let users = self.store.users();
        if !users.verify_password(&user, password).await? {
            return Err(SessionError::InvalidCredentials);
        }

        if user.is_two_fa {
            return Ok(LoginOutcome::TwoFactorRequired);
        }

        let issued = self.issue_tokens(&user).await?;
        Ok(LoginOutcome::Tokens(Box::new(User::from(user)), issued))
    }

    pub async fn verify_two_fa(
        &self,
        username: &str,
        otp: &str,
    ) -> Result<(User, IssuedTokens), SessionError> {
        let user = self.active_user_by_username(username).await?;

        let Some(secret) = user.totp_secret.as_deref() else {
            return Err(SessionError::TwoFactorNotEnrolled);
        };

        if !self.totp.verify(secret, &user.username, otp)? {
            return Err(SessionError::InvalidOtp);
        }

        let issued = self.issue_tokens(&user).await?;
        Ok((User::from(user), issued))
    }

    /// Exchange a rotation token for a fresh access token. The cookie is
    /// not rotated on this path. The presented token must match the
    /// user's single rotation slot, so a newer login invalidates any
    /// older cookie even before its signed expiry.
    pub async fn rotate(&self, rotation_token: &str) -> Result<String, SessionError> {
        let user_id = self.tokens.verify(TokenKind::Rotation, rotation_token)?;

        let user = self
            .store
            .users()
            .get_credentials_by_id(user_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !user.is_active {
            return Err(SessionError::Inactive);
        }

        if user.rotation_token.as_deref() != Some(rotation_token) {
            return Err(SessionError::InvalidToken);
        }

        Ok(self.tokens.mint(TokenKind::Access, user.id)?)
    }

    pub async fn logout(&self, rotation_token: &str) -> Result<(), SessionError> {
        let user_id = self.tokens.verify(TokenKind::Rotation, rotation_token)?;
        self.store.users().set_rotation_token(user_id, None).await?;
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        current: &str,
        new_password: String,
    ) -> Result<(), SessionError> {
        let users = self.store.users();
        let user = users
            .get_credentials_by_id(user_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !users.verify_password(&user, current).await? {
            return Err(SessionError::InvalidCredentials);
        }

        users.update_password_hash(user_id, new_password).await?;
        Ok(())
    }

    /// Enrol a user into 2FA. The secret and provisioning URL are
    /// persisted before the required flag flips, so the account is never
    /// flagged without a secret to back it.
    pub async fn enrol_two_fa(&self, target_user_id: i32) -> Result<Enrolment, SessionError> {
        let user = self
            .store
            .users()
            .get_credentials_by_id(target_user_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        let enrolment = self.totp.enrol(&user.username)?;
        self.store
            .users()
            .enable_two_fa(user.id, enrolment.secret.clone(), enrolment.url.clone())
            .await?;

        Ok(enrolment)
    }

    /// Mint a reset token for the target user and mail the templated
    /// link. The token is random, single-use and expires after 24 hours.
    pub async fn send_password_reset(&self, target_user_id: i32) -> Result<(), SessionError> {
        let user = self
            .store
            .users()
            .get_credentials_by_id(target_user_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        let token = generate_opaque_token();
        let expires_at =
            (chrono::Utc::now() + chrono::Duration::hours(self.reset_ttl_hours)).to_rfc3339();

        self.store
            .reset_tokens()
            .create(user.id, token.clone(), expires_at)
            .await?;

        let link = format!(
            "{}/password-reset?token={}",
            self.reset_base_url.trim_end_matches('/'),
            urlencoding::encode(&token)
        );

        self.mailer
            .send_password_reset(&user.email, &user.username, &link)
            .await?;

        Ok(())
    }

    /// Consume a reset link: the new hash lands and the token is marked
    /// used inside the same transaction.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: String,
    ) -> Result<(), SessionError> {
        let hash = hash_password_blocking(new_password).await?;

        match self.store.reset_tokens().consume(token, hash).await? {
            Ok(_user_id) => Ok(()),
            Err(ResetTokenRejection::Unknown) => Err(SessionError::NotFound),
            Err(ResetTokenRejection::Expired) => Err(SessionError::ExpiredToken),
            Err(ResetTokenRejection::AlreadyUsed) => Err(SessionError::UsedToken),
        }
    }

    async fn active_user_by_username(
        &self,
        username: &str,
    ) -> Result<users::Model, SessionError> {
        let user = self
            .store
            .users()
            .get_credentials_by_username(username)
            .await?
            .ok_or(SessionError::NotFound)?;

        if !user.is_active {
            return Err(SessionError::Inactive);
        }

        Ok(user)
    }

    /// Mint both tokens and overwrite the user's rotation slot, which
    /// invalidates any previously issued rotation token for that user.
    async fn issue_tokens(&self, user: &users::Model) -> Result<IssuedTokens, SessionError> {
        let access = self.tokens.mint(TokenKind::Access, user.id)?;
        let rotation = self.tokens.mint(TokenKind::Rotation, user.id)?;

        self.store
            .users()
            .set_rotation_token(user.id, Some(rotation.clone()))
            .await?;

        Ok(IssuedTokens { access, rotation })
    }
}
