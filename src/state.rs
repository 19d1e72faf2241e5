use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthKeys;
use crate::config::Config;
use crate::db::DbPool;
use crate::notifications::Notifier;

/// Shared secret the payment gateway signs webhook bodies with
#[derive(Clone)]
pub struct WebhookSecret(pub String);

/// Everything handlers need, passed to the router once
///
/// Handlers pull out only the parts they use through `FromRef`, so
/// `State<Arc<DbPool>>` keeps working alongside the other pieces.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub keys: Arc<AuthKeys>,
    pub notifier: Notifier,
    pub webhook_secret: Arc<WebhookSecret>,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, keys: AuthKeys, webhook_secret: String) -> Self {
        Self {
            notifier: Notifier::new(pool.clone()),
            pool,
            keys: Arc::new(keys),
            webhook_secret: Arc::new(WebhookSecret(webhook_secret)),
        }
    }

    pub fn from_config(pool: Arc<DbPool>, config: &Config) -> Self {
        let keys = AuthKeys::new(&config.jwt_secret, config.access_token_ttl(), config.refresh_token_ttl());
        Self::new(pool, keys, config.payment_webhook_secret.clone())
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<AuthKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl FromRef<AppState> for Notifier {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}

impl FromRef<AppState> for Arc<WebhookSecret> {
    fn from_ref(state: &AppState) -> Self {
        state.webhook_secret.clone()
    }
}
