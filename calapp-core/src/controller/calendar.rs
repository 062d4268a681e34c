//! Event controller: load, save and delete events against the event gateway.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::calendar::CalendarAction;
use crate::error::{CalAppError, CalAppResult};
use crate::event::{CalendarEvent, EventDraft, ingest_events};
use crate::gateway::EventGateway;
use crate::ids::EventId;
use crate::session::SessionAction;
use crate::storage::{ClientStorage, Token};
use crate::store::AppStore;
use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(EventId),
    Updated(EventId),
}

impl SaveOutcome {
    pub fn id(&self) -> &EventId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Updated(id) => id,
        }
    }
}

/// One async mutex per event id. Update and delete calls for the same event
/// run one at a time; calls for different events do not wait on each other.
///
/// Only ids with a holder or a waiter keep an entry: idle locks (referenced by
/// the map alone) are dropped on the next `acquire`.
#[derive(Default)]
struct EventLocks {
    locks: Mutex<HashMap<EventId, Arc<Mutex<()>>>>,
}

impl EventLocks {
    async fn acquire(&self, id: &EventId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

pub struct EventController {
    store: AppStore,
    gateway: Arc<dyn EventGateway>,
    storage: Arc<dyn ClientStorage>,
    locks: EventLocks,
}

impl EventController {
    pub fn new(
        store: AppStore,
        gateway: Arc<dyn EventGateway>,
        storage: Arc<dyn ClientStorage>,
    ) -> Self {
        EventController {
            store,
            gateway,
            storage,
            locks: EventLocks::default(),
        }
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    /// Fetch every event and merge it into the store by id.
    /// Returns how many events were new.
    pub async fn load_events(&self) -> CalAppResult<usize> {
        let token = self.require_token().await?;

        let raw = self.gateway.list_events(&token).await.inspect_err(|err| {
            warn!(error = %err, "loading events failed");
        })?;
        let events = ingest_events(raw)?;

        let before = self.store.read(|s| s.calendar.events().len()).await;
        self.store.dispatch(CalendarAction::LoadEvents(events)).await;
        let added = self.store.read(|s| s.calendar.events().len()).await - before;

        debug!(added, "events loaded");
        Ok(added)
    }

    /// Create the event when the draft has no id, update it otherwise.
    ///
    /// The stored event takes the current user as owner in both cases.
    pub async fn save_event(&self, draft: &EventDraft) -> CalAppResult<SaveOutcome> {
        let user = self.require_user().await?;
        let token = self.require_token().await?;
        let payload = draft.payload();

        match &draft.id {
            Some(id) => {
                let _guard = self.locks.acquire(id).await;
                info!(event = %id, "updating event");

                self.gateway
                    .update_event(&token, id, &payload)
                    .await
                    .inspect_err(|err| warn!(event = %id, error = %err, "update failed"))?;

                let event = CalendarEvent::from_draft(draft, id.clone(), user);
                self.store.dispatch(CalendarAction::UpdateEvent(event)).await;
                Ok(SaveOutcome::Updated(id.clone()))
            }
            None => {
                info!(title = %draft.title, "creating event");

                let id = self
                    .gateway
                    .create_event(&token, &payload)
                    .await
                    .inspect_err(|err| warn!(error = %err, "create failed"))?;

                let event = CalendarEvent::from_draft(draft, id.clone(), user);
                self.store.dispatch(CalendarAction::AddNewEvent(event)).await;
                Ok(SaveOutcome::Created(id))
            }
        }
    }

    /// Delete the active event. Fails with [`CalAppError::NoActiveEvent`]
    /// when nothing is selected.
    pub async fn delete_active_event(&self) -> CalAppResult<EventId> {
        let id = self
            .store
            .read(|s| s.calendar.active_event_id().cloned())
            .await
            .ok_or(CalAppError::NoActiveEvent)?;

        let token = self.require_token().await?;
        let _guard = self.locks.acquire(&id).await;
        info!(event = %id, "deleting event");

        self.gateway
            .delete_event(&token, &id)
            .await
            .inspect_err(|err| warn!(event = %id, error = %err, "delete failed"))?;

        self.store.dispatch(CalendarAction::DeleteEvent(id.clone())).await;
        Ok(id)
    }

    /// Select an event (or clear the selection). Local only.
    pub async fn set_active_event(&self, id: Option<EventId>) -> CalAppResult<()> {
        if let Some(id) = &id {
            let known = self.store.read(|s| s.calendar.contains(id)).await;
            if !known {
                return Err(CalAppError::UnknownEvent(id.to_string()));
            }
        }

        self.store.dispatch(CalendarAction::SetActiveEvent(id)).await;
        Ok(())
    }

    /// The stored token. Without one the session is forced to logged out.
    async fn require_token(&self) -> CalAppResult<Token> {
        match self.storage.token()? {
            Some(token) => Ok(token),
            None => {
                debug!("no stored token; forcing logout");
                self.store
                    .dispatch_all([
                        SessionAction::Logout(None).into(),
                        CalendarAction::Clear.into(),
                    ])
                    .await;
                Err(CalAppError::NotAuthenticated)
            }
        }
    }

    async fn require_user(&self) -> CalAppResult<User> {
        self.store
            .read(|s| s.session.user().cloned())
            .await
            .ok_or(CalAppError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventPayload, RawDate, RawEvent};
    use crate::session::AuthStatus;
    use crate::storage::MemoryStorage;
    use crate::user::RawUser;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Create(EventPayload),
        Update(EventId, EventPayload),
        Delete(EventId),
    }

    #[derive(Default)]
    struct FakeEvents {
        remote: Vec<(&'static str, &'static str)>,
        next_id: &'static str,
        fail: bool,
        delay: Option<Duration>,
        calls: std::sync::Mutex<Vec<Call>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeEvents {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn record(&self, call: Call) -> CalAppResult<()> {
            self.calls.lock().unwrap().push(call);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                Err(CalAppError::Persistence("Event not found".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl EventGateway for FakeEvents {
        async fn list_events(&self, _token: &Token) -> CalAppResult<Vec<RawEvent>> {
            self.record(Call::List).await?;
            Ok(self
                .remote
                .iter()
                .map(|(id, title)| RawEvent {
                    id: None,
                    object_id: Some(id.to_string().into()),
                    title: title.to_string(),
                    notes: None,
                    start: RawDate::Text("2025-03-20T15:00:00.000Z".into()),
                    end: RawDate::Text("2025-03-20T16:00:00.000Z".into()),
                    user: RawUser {
                        object_id: Some("u-2".into()),
                        name: Some("Other".into()),
                        ..RawUser::default()
                    },
                })
                .collect())
        }

        async fn create_event(&self, _token: &Token, event: &EventPayload) -> CalAppResult<EventId> {
            self.record(Call::Create(event.clone())).await?;
            Ok(EventId::new(self.next_id))
        }

        async fn update_event(
            &self,
            _token: &Token,
            id: &EventId,
            event: &EventPayload,
        ) -> CalAppResult<()> {
            self.record(Call::Update(id.clone(), event.clone())).await
        }

        async fn delete_event(&self, _token: &Token, id: &EventId) -> CalAppResult<()> {
            self.record(Call::Delete(id.clone())).await
        }
    }

    fn me() -> User {
        User::new("u-1", "Test User")
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft::new(
            title,
            Utc.with_ymd_and_hms(2025, 3, 21, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 21, 10, 0, 0).unwrap(),
        )
    }

    /// A signed-in controller with a stored token.
    async fn signed_in(gateway: Arc<FakeEvents>) -> EventController {
        let storage = Arc::new(MemoryStorage::with_token(Token::issued_now("t")));
        let controller = EventController::new(AppStore::new(), gateway, storage);
        controller.store().dispatch(SessionAction::Login(me())).await;
        controller
    }

    fn ids(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_events_twice_is_idempotent() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a"), ("2", "b")],
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;

        assert_eq!(controller.load_events().await.unwrap(), 2);
        assert_eq!(controller.load_events().await.unwrap(), 0);

        let state = controller.store().snapshot().await;
        assert_eq!(ids(state.calendar.events()), vec!["1", "2"]);
        assert!(!state.calendar.is_loading_events());
        assert_eq!(state.calendar.events()[0].owner.id.as_str(), "u-2");
        assert_eq!(gateway.calls(), vec![Call::List, Call::List]);
    }

    #[tokio::test]
    async fn test_load_events_failure_leaves_state() {
        let gateway = Arc::new(FakeEvents {
            fail: true,
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway).await;

        assert!(controller.load_events().await.is_err());
        assert!(controller.store().read(|s| s.calendar.is_loading_events()).await);
    }

    #[tokio::test]
    async fn test_missing_token_forces_logout_without_call() {
        let gateway = Arc::new(FakeEvents::default());
        let controller = EventController::new(
            AppStore::new(),
            gateway.clone(),
            Arc::new(MemoryStorage::new()),
        );
        controller.store().dispatch(SessionAction::Login(me())).await;

        let err = controller.load_events().await.unwrap_err();

        assert!(matches!(err, CalAppError::NotAuthenticated));
        assert!(gateway.calls().is_empty());
        let status = controller.store().read(|s| s.session.status()).await;
        assert_eq!(status, AuthStatus::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_create_appends_with_gateway_id_and_owner() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a")],
            next_id: "new-42",
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();
        controller
            .set_active_event(Some(EventId::new("1")))
            .await
            .unwrap();

        let outcome = controller.save_event(&draft("Planning")).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Created(EventId::new("new-42")));
        let state = controller.store().snapshot().await;
        assert_eq!(ids(state.calendar.events()), vec!["1", "new-42"]);
        let created = state.calendar.get(&EventId::new("new-42")).unwrap();
        assert_eq!(created.owner, me());
        assert_eq!(created.title, "Planning");
        assert!(state.calendar.active_event_id().is_none());
        assert_eq!(gateway.calls()[1], Call::Create(draft("Planning").payload()));
    }

    #[tokio::test]
    async fn test_update_replaces_only_matching_event() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a"), ("2", "b"), ("3", "c")],
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();
        let before = controller.store().snapshot().await;

        let mut edit = before.calendar.get(&EventId::new("2")).unwrap().to_draft();
        edit.title = "b, renamed".into();
        let outcome = controller.save_event(&edit).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Updated(EventId::new("2")));
        let after = controller.store().snapshot().await;
        let events = after.calendar.events();
        assert_eq!(ids(events), vec!["1", "2", "3"]);
        assert_eq!(events[0], before.calendar.events()[0]);
        assert_eq!(events[2], before.calendar.events()[2]);
        assert_eq!(events[1].title, "b, renamed");
        assert_eq!(events[1].owner, me());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_unchanged() {
        let gateway = Arc::new(FakeEvents {
            fail: true,
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway).await;
        let before = controller.store().snapshot().await;

        let err = controller.save_event(&draft("x")).await.unwrap_err();
        assert_eq!(err.user_message(), "Event not found");

        let mut edit = draft("y");
        edit.id = Some(EventId::new("1"));
        assert!(controller.save_event(&edit).await.is_err());

        assert_eq!(controller.store().snapshot().await, before);
    }

    #[tokio::test]
    async fn test_save_requires_signed_in_user() {
        let gateway = Arc::new(FakeEvents::default());
        let controller = EventController::new(
            AppStore::new(),
            gateway.clone(),
            Arc::new(MemoryStorage::with_token(Token::issued_now("t"))),
        );

        let err = controller.save_event(&draft("x")).await.unwrap_err();
        assert!(matches!(err, CalAppError::NotAuthenticated));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_active_event() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a")],
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();
        controller
            .set_active_event(Some(EventId::new("1")))
            .await
            .unwrap();

        let deleted = controller.delete_active_event().await.unwrap();

        assert_eq!(deleted, EventId::new("1"));
        let state = controller.store().snapshot().await;
        assert!(state.calendar.events().is_empty());
        assert!(state.calendar.active_event().is_none());
        assert_eq!(gateway.calls().last(), Some(&Call::Delete(EventId::new("1"))));
    }

    #[tokio::test]
    async fn test_delete_without_selection_is_error() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a")],
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();

        let err = controller.delete_active_event().await.unwrap_err();

        assert!(matches!(err, CalAppError::NoActiveEvent));
        assert_eq!(gateway.calls(), vec![Call::List]);
        assert_eq!(controller.store().read(|s| s.calendar.events().len()).await, 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_event_and_selection() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a")],
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway).await;
        controller.load_events().await.unwrap();
        controller
            .set_active_event(Some(EventId::new("1")))
            .await
            .unwrap();
        let before = controller.store().snapshot().await;

        let failing = EventController::new(
            controller.store().clone(),
            Arc::new(FakeEvents {
                fail: true,
                ..FakeEvents::default()
            }),
            Arc::new(MemoryStorage::with_token(Token::issued_now("t"))),
        );
        assert!(failing.delete_active_event().await.is_err());

        assert_eq!(controller.store().snapshot().await, before);
    }

    #[tokio::test]
    async fn test_set_active_event_rejects_unknown_id() {
        let controller = signed_in(Arc::new(FakeEvents::default())).await;
        let err = controller
            .set_active_event(Some(EventId::new("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, CalAppError::UnknownEvent(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_updates_to_same_event_are_serialized() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a"), ("2", "b")],
            delay: Some(Duration::from_millis(50)),
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();

        let mut first = draft("first");
        first.id = Some(EventId::new("1"));
        let mut second = draft("second");
        second.id = Some(EventId::new("1"));

        let (a, b) = tokio::join!(controller.save_event(&first), controller.save_event(&second));
        a.unwrap();
        b.unwrap();

        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
        let title = controller
            .store()
            .read(|s| s.calendar.get(&EventId::new("1")).map(|e| e.title.clone()))
            .await;
        assert_eq!(title.as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_updates_to_different_events_overlap() {
        let gateway = Arc::new(FakeEvents {
            remote: vec![("1", "a"), ("2", "b")],
            delay: Some(Duration::from_millis(50)),
            ..FakeEvents::default()
        });
        let controller = signed_in(gateway.clone()).await;
        controller.load_events().await.unwrap();

        let mut first = draft("first");
        first.id = Some(EventId::new("1"));
        let mut second = draft("second");
        second.id = Some(EventId::new("2"));

        let (a, b) = tokio::join!(controller.save_event(&first), controller.save_event(&second));
        a.unwrap();
        b.unwrap();

        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_idle_event_locks_are_dropped() {
        let locks = EventLocks::default();

        let held = locks.acquire(&EventId::new("1")).await;
        drop(locks.acquire(&EventId::new("2")).await);
        assert_eq!(locks.len().await, 2);

        // "2" is idle, "1" is still held
        drop(locks.acquire(&EventId::new("3")).await);
        assert_eq!(locks.len().await, 2);

        drop(held);
        drop(locks.acquire(&EventId::new("3")).await);
        assert_eq!(locks.len().await, 1);
    }
}
