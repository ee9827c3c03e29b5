//! Composition root wiring the client components together.

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiClient, ChatClient};
use crate::auth::{AuthStatus, CredentialStore, TokenStorage};
use crate::config::Config;
use crate::coordinator::FailureCoordinator;
use crate::navigation::Navigator;
use crate::notify::NotificationCenter;

/// One instance of every component, all sharing a single credential store.
pub struct ClientContext {
    pub credentials: CredentialStore,
    pub api: ApiClient,
    pub notifications: NotificationCenter,
    pub failures: FailureCoordinator,
    pub chat: ChatClient,
    pub auth: AuthStatus,
}

impl ClientContext {
    pub fn new(
        config: &Config,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let credentials = CredentialStore::new(storage);
        let api = ApiClient::new(&config.base_url, config.request_timeout(), credentials.clone())?;
        let notifications = NotificationCenter::new(config.notification_dismiss_after());
        let failures =
            FailureCoordinator::new(credentials.clone(), notifications.clone(), navigator.clone());
        let chat = ChatClient::new(api.clone(), failures.clone(), notifications.clone(), navigator);
        let auth = AuthStatus::new(api.clone(), credentials.clone(), failures.clone());

        Ok(Self {
            credentials,
            api,
            notifications,
            failures,
            chat,
            auth,
        })
    }
}
