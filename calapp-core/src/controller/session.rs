//! Session controller: login, registration, token renewal and logout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::calendar::CalendarAction;
use crate::error::{CalAppError, CalAppResult};
use crate::gateway::{AuthGateway, AuthGrant, Credentials, Profile};
use crate::session::{AuthStatus, SessionAction};
use crate::storage::ClientStorage;
use crate::store::AppStore;
use crate::user::User;

/// Shown for any failed login; the server's reason is not surfaced.
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect email or password";

/// Shown for a failed registration when the server gives no reason.
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed";

/// The message a failed registration surfaces: the server's, or a fallback
/// when it sent none.
pub fn register_failure_message(err: &CalAppError) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        REGISTER_FAILED_MESSAGE.to_string()
    } else {
        message
    }
}

pub struct SessionController {
    store: AppStore,
    gateway: Arc<dyn AuthGateway>,
    storage: Arc<dyn ClientStorage>,
    error_message_ttl: Duration,
}

impl SessionController {
    pub fn new(
        store: AppStore,
        gateway: Arc<dyn AuthGateway>,
        storage: Arc<dyn ClientStorage>,
        error_message_ttl: Duration,
    ) -> Self {
        SessionController {
            store,
            gateway,
            storage,
            error_message_ttl,
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub async fn login(&self, credentials: &Credentials) -> CalAppResult<User> {
        info!(email = %credentials.email, "login");
        self.store.dispatch(SessionAction::Checking).await;

        match self.gateway.login(credentials).await {
            Ok(grant) => self.accept(grant).await,
            Err(err) => {
                warn!(error = %err, "login failed");
                self.reject(LOGIN_FAILED_MESSAGE.to_string()).await;
                Err(err)
            }
        }
    }

    pub async fn register(&self, profile: &Profile) -> CalAppResult<User> {
        info!(email = %profile.email, "register");
        self.store.dispatch(SessionAction::Checking).await;

        match self.gateway.register(profile).await {
            Ok(grant) => self.accept(grant).await,
            Err(err) => {
                warn!(error = %err, "registration failed");
                self.reject(register_failure_message(&err)).await;
                Err(err)
            }
        }
    }

    /// Re-validate the stored token.
    ///
    /// Without a stored token this settles on `NotAuthenticated` without
    /// touching the network. A rejected renewal also wipes local storage.
    pub async fn renew_token(&self) -> AuthStatus {
        let token = match self.storage.token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no stored token; skipping renewal");
                self.store.dispatch(SessionAction::Logout(None)).await;
                return AuthStatus::NotAuthenticated;
            }
            Err(err) => {
                warn!(error = %err, "could not read stored token");
                self.store.dispatch(SessionAction::Logout(None)).await;
                return AuthStatus::NotAuthenticated;
            }
        };

        match self.gateway.renew(&token).await {
            Ok(grant) => match self.persist(&grant) {
                Ok(()) => {
                    info!(user = %grant.user.id, "session renewed");
                    self.store.dispatch(SessionAction::Login(grant.user)).await;
                    AuthStatus::Authenticated
                }
                Err(err) => {
                    warn!(error = %err, "could not store renewed token");
                    self.store.dispatch(SessionAction::Logout(None)).await;
                    AuthStatus::NotAuthenticated
                }
            },
            Err(err) => {
                warn!(error = %err, "token renewal failed");
                if let Err(err) = self.storage.clear() {
                    warn!(error = %err, "could not clear storage");
                }
                self.store.dispatch(SessionAction::Logout(None)).await;
                AuthStatus::NotAuthenticated
            }
        }
    }

    /// Forget everything local. No network call.
    ///
    /// State is reset even when clearing storage fails; the storage error is
    /// still returned.
    pub async fn logout(&self) -> CalAppResult<()> {
        info!("logout");
        let cleared = self.storage.clear();

        self.store
            .dispatch_all([
                SessionAction::Logout(None).into(),
                CalendarAction::Clear.into(),
            ])
            .await;

        cleared
    }

    fn persist(&self, grant: &AuthGrant) -> CalAppResult<()> {
        self.storage.set_token(&grant.token)
    }

    async fn accept(&self, grant: AuthGrant) -> CalAppResult<User> {
        if let Err(err) = self.persist(&grant) {
            warn!(error = %err, "could not store token");
            self.reject(register_failure_message(&err)).await;
            return Err(err);
        }

        info!(user = %grant.user.id, "authenticated");
        self.store
            .dispatch(SessionAction::Login(grant.user.clone()))
            .await;
        Ok(grant.user)
    }

    /// Surface `message` and clear it again after the configured delay.
    async fn reject(&self, message: String) {
        self.store
            .dispatch(SessionAction::Logout(Some(message)))
            .await;

        let store = self.store.clone();
        let ttl = self.error_message_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            store.dispatch(SessionAction::ClearErrorMessage).await;
        });
    }
}
