use std::sync::Arc;

use anyhow::Result;

use crate::clients::currency_catalog::CurrencyCatalogClient;
use crate::clients::hr_directory::HrDirectoryClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ApprovalEngine, Authorizer, Mailer, MenuTreeService, NoopMailer, SessionService, SmtpMailer,
    TokenService, TotpService,
};

/// Composition root: every service receives its dependencies here, once,
/// at startup. Nothing reads the environment or a module global later.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub sessions: Arc<SessionService>,

    pub menu_tree: Arc<MenuTreeService>,

    pub authorizer: Arc<Authorizer>,

    pub approvals: Arc<ApprovalEngine>,

    pub mailer: Arc<dyn Mailer>,

    pub hr_directory: Arc<HrDirectoryClient>,

    pub currency_catalog: Arc<CurrencyCatalogClient>,
}

impl SharedState {
    pub async fn new(config: Config) -> Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> Result<Self> {
        let tokens = Arc::new(TokenService::new(
            &config.tokens.access_key,
            &config.tokens.rotation_key,
            config.tokens.access_ttl_minutes,
            config.tokens.rotation_ttl_hours,
        ));

        let mailer: Arc<dyn Mailer> = if config.smtp.enabled {
            Arc::new(SmtpMailer::new(&config.smtp)?)
        } else {
            Arc::new(NoopMailer)
        };

        let sessions = Arc::new(SessionService::new(
            store.clone(),
            tokens.clone(),
            TotpService::new(config.tokens.totp_issuer.clone()),
            mailer.clone(),
            config.server.public_url.clone(),
            config.tokens.reset_ttl_hours,
        ));

        let hr_directory = Arc::new(HrDirectoryClient::new(
            config.sync.hr_base_url.clone(),
            config.sync.hr_session_cookie.clone(),
            config.sync.timeout_seconds,
        )?);

        let currency_catalog = Arc::new(CurrencyCatalogClient::new(
            config.sync.currency_url.clone(),
            config.sync.timeout_seconds,
        )?);

        Ok(Self {
            config: Arc::new(config),
            menu_tree: Arc::new(MenuTreeService::new(store.clone())),
            authorizer: Arc::new(Authorizer::new(store.clone())),
            approvals: Arc::new(ApprovalEngine::new(store.clone())),
            store,
            tokens,
            sessions,
            mailer,
            hr_directory,
            currency_catalog,
        })
    }
}
