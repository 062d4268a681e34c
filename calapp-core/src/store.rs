//! The application store.
//!
//! Session and event state live in one [`AppState`] behind a shared lock.
//! Controllers change it only through [`AppStore::dispatch`], and readers get
//! either a closure over the current state or a cloned snapshot, so a
//! half-applied transition is never visible.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::trace;

use crate::calendar::{CalendarAction, EventStore};
use crate::session::{Session, SessionAction};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub session: Session,
    pub calendar: EventStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Session(SessionAction),
    Calendar(CalendarAction),
}

impl From<SessionAction> for Action {
    fn from(action: SessionAction) -> Self {
        Action::Session(action)
    }
}

impl From<CalendarAction> for Action {
    fn from(action: CalendarAction) -> Self {
        Action::Calendar(action)
    }
}

impl AppState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Session(action) => self.session.apply(action),
            Action::Calendar(action) => self.calendar.apply(action),
        }
    }
}

/// Cheap-to-clone handle to the shared [`AppState`].
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    state: Arc<RwLock<AppState>>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        trace!(?action, "dispatch");
        self.state.write().await.apply(action);
    }

    /// Apply several actions under a single write lock.
    pub async fn dispatch_all<I>(&self, actions: I)
    where
        I: IntoIterator<Item = Action>,
    {
        let mut state = self.state.write().await;
        for action in actions {
            trace!(?action, "dispatch");
            state.apply(action);
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&*self.state.read().await)
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AuthStatus;
    use crate::user::User;

    #[tokio::test]
    async fn test_dispatch_all_applies_in_order() {
        let store = AppStore::new();
        store
            .dispatch_all([
                SessionAction::Login(User::new("u-1", "Test User")).into(),
                SessionAction::Logout(None).into(),
                CalendarAction::Clear.into(),
            ])
            .await;

        let state = store.snapshot().await;
        assert_eq!(state.session.status(), AuthStatus::NotAuthenticated);
        assert_eq!(state.calendar, EventStore::default());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = AppStore::new();
        let other = store.clone();
        other
            .dispatch(SessionAction::Login(User::new("u-1", "Test User")))
            .await;
        assert!(store.read(|s| s.session.is_authenticated()).await);
    }
}
