//! Event store: the events known to the client and the active selection.

use crate::event::CalendarEvent;
use crate::ids::EventId;

/// Transitions on [`EventStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarAction {
    LoadEvents(Vec<CalendarEvent>),
    SetActiveEvent(Option<EventId>),
    AddNewEvent(CalendarEvent),
    UpdateEvent(CalendarEvent),
    /// Remove one event and clear the selection.
    DeleteEvent(EventId),
    Clear,
}

/// Events in insertion order, unique by id.
///
/// `active_event` always names an event present in `events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStore {
    is_loading_events: bool,
    events: Vec<CalendarEvent>,
    active_event: Option<EventId>,
}

impl Default for EventStore {
    fn default() -> Self {
        EventStore {
            is_loading_events: true,
            events: Vec::new(),
            active_event: None,
        }
    }
}

impl EventStore {
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn is_loading_events(&self) -> bool {
        self.is_loading_events
    }

    pub fn get(&self, id: &EventId) -> Option<&CalendarEvent> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.get(id).is_some()
    }

    pub fn active_event(&self) -> Option<&CalendarEvent> {
        self.active_event.as_ref().and_then(|id| self.get(id))
    }

    pub fn active_event_id(&self) -> Option<&EventId> {
        self.active_event.as_ref()
    }

    pub fn has_event_selected(&self) -> bool {
        self.active_event.is_some()
    }

    pub fn apply(&mut self, action: CalendarAction) {
        match action {
            CalendarAction::LoadEvents(payload) => {
                self.is_loading_events = false;
                for event in payload {
                    if !self.contains(&event.id) {
                        self.events.push(event);
                    }
                }
            }
            CalendarAction::SetActiveEvent(Some(id)) => {
                if self.contains(&id) {
                    self.active_event = Some(id);
                }
            }
            CalendarAction::SetActiveEvent(None) => {
                self.active_event = None;
            }
            CalendarAction::AddNewEvent(event) => {
                match self.events.iter_mut().find(|e| e.id == event.id) {
                    Some(existing) => *existing = event,
                    None => self.events.push(event),
                }
                self.active_event = None;
            }
            CalendarAction::UpdateEvent(event) => {
                if let Some(existing) = self.events.iter_mut().find(|e| e.id == event.id) {
                    *existing = event;
                }
            }
            CalendarAction::DeleteEvent(id) => {
                self.events.retain(|event| event.id != id);
                self.active_event = None;
            }
            CalendarAction::Clear => {
                *self = EventStore::default();
            }
        }
    }
}
