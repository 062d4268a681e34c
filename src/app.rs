//! Wires configuration, storage, the HTTP gateway and both controllers
//! around one shared store.

use std::sync::Arc;

use anyhow::{Context, Result};
use calapp_core::config::AppConfig;
use calapp_core::controller::{EventController, SessionController};
use calapp_core::http::HttpGateway;
use calapp_core::session::AuthStatus;
use calapp_core::storage::FileStorage;
use calapp_core::store::AppStore;
use calapp_core::User;
use tracing::debug;

use crate::commands;
use crate::utils::tui;

pub struct App {
    pub storage: Arc<FileStorage>,
    pub store: AppStore,
    pub session: SessionController,
    pub events: EventController,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let gateway = Arc::new(
            HttpGateway::new(&config.api_url, config.request_timeout())
                .context("Failed to set up the API client")?,
        );
        let storage = Arc::new(FileStorage::new(config.storage_path()?));
        debug!(api_url = %config.api_url, storage = %storage.path().display(), "app configured");
        let store = AppStore::new();

        let session = SessionController::new(
            store.clone(),
            gateway.clone(),
            storage.clone(),
            config.error_message_ttl(),
        );
        let events = EventController::new(store.clone(), gateway, storage.clone());

        Ok(App {
            storage,
            store,
            session,
            events,
        })
    }

    /// Re-validate the stored session, as done once at startup.
    pub async fn restore_session(&self) -> AuthStatus {
        let spinner = tui::create_spinner("Checking session".to_string());
        let status = self.session.renew_token().await;
        spinner.finish_and_clear();
        status
    }

    /// Restore the session and load events, or explain how to sign in.
    pub async fn signed_in(&self) -> Result<User> {
        if self.restore_session().await != AuthStatus::Authenticated {
            anyhow::bail!(
                "Not signed in.\n\n\
                Sign in with:\n  \
                calapp login\n\n\
                Or create an account with:\n  \
                calapp register"
            );
        }

        let spinner = tui::create_spinner("Loading events".to_string());
        let loaded = self.events.load_events().await;
        spinner.finish_and_clear();
        loaded.map_err(|e| commands::failed_to("load events", e))?;

        self.store
            .read(|s| s.session.user().cloned())
            .await
            .context("Session ended while loading events")
    }
}
