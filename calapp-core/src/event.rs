//! Calendar event types.
//!
//! [`CalendarEvent`] is the confirmed, server-assigned form held in the
//! event store. [`EventDraft`] is what the user edits; it has no id until the
//! server creates it. [`RawEvent`] is the wire form returned by `GET /events`,
//! turned into a `CalendarEvent` by [`RawEvent::ingest`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalAppError, CalAppResult};
use crate::ids::{EventId, RawId, first_present};
use crate::user::{RawUser, User};

/// A confirmed calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EventId,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub owner: User,
}

impl CalendarEvent {
    /// Combine a draft with the id the server assigned and the owning user.
    pub fn from_draft(draft: &EventDraft, id: EventId, owner: User) -> Self {
        CalendarEvent {
            id,
            title: draft.title.clone(),
            notes: draft.notes.clone(),
            start: draft.start,
            end: draft.end,
            owner,
        }
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner.id == user.id
    }

    /// A draft pre-filled from this event, for editing.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            notes: self.notes.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// An event as edited by the user. `id` is `None` for events not yet created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub id: Option<EventId>,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventDraft {
            id: None,
            title: title.into(),
            notes: String::new(),
            start,
            end,
        }
    }

    pub fn payload(&self) -> EventPayload {
        EventPayload {
            title: self.title.clone(),
            notes: self.notes.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Request body for `POST /events` and `PUT /events/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A date as the server may send it: an ISO 8601 string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Millis(i64),
    Text(String),
}

impl RawDate {
    pub fn to_utc(&self) -> CalAppResult<DateTime<Utc>> {
        match self {
            RawDate::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .ok_or_else(|| CalAppError::InvalidDate(ms.to_string())),
            RawDate::Text(s) => parse_timestamp(s),
        }
    }
}

/// Parse an ISO 8601 timestamp.
///
/// Strings without an offset are taken as UTC; a bare date is midnight UTC.
pub fn parse_timestamp(s: &str) -> CalAppResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CalAppError::InvalidDate(s.to_string()))
}

/// An event record from `GET /events`, before ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<RawId>,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub start: RawDate,
    pub end: RawDate,
    pub user: RawUser,
}

impl RawEvent {
    /// Convert dates into timestamps and resolve identity aliases on both the
    /// event and its owner.
    pub fn ingest(self) -> CalAppResult<CalendarEvent> {
        let id = first_present([self.id, self.object_id])
            .ok_or_else(|| CalAppError::Serialization("event record has no identifier".into()))?;

        Ok(CalendarEvent {
            id: EventId(id),
            title: self.title,
            notes: self.notes.unwrap_or_default(),
            start: self.start.to_utc()?,
            end: self.end.to_utc()?,
            owner: self.user.normalize()?,
        })
    }
}

/// Ingest a whole `GET /events` payload.
///
/// A single malformed record fails the batch, so the store never holds a
/// partial load.
pub fn ingest_events(raw: Vec<RawEvent>) -> CalAppResult<Vec<CalendarEvent>> {
    raw.into_iter().map(RawEvent::ingest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-20T15:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-20T17:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-20T15:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-20T15:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-20 15:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-03-20").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("next tuesday"),
            Err(CalAppError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_ingest_normalizes_ids_and_dates() {
        let json = r#"{
            "_id": "ev-1",
            "title": "Standup",
            "start": "2025-03-20T15:00:00.000Z",
            "end": 1742486400000,
            "user": { "_id": "u-1", "name": "Ana" }
        }"#;

        let raw: RawEvent = serde_json::from_str(json).unwrap();
        let event = raw.ingest().unwrap();

        assert_eq!(event.id, EventId::new("ev-1"));
        assert_eq!(event.notes, "");
        assert_eq!(event.start, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());
        assert_eq!(event.end, Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap());
        assert_eq!(event.owner, User::new("u-1", "Ana"));
    }

    #[test]
    fn test_ingest_accepts_numeric_ids() {
        let json = r#"{
            "id": 1,
            "title": "Standup",
            "start": "2025-03-20T15:00:00.000Z",
            "end": "2025-03-20T16:00:00.000Z",
            "user": { "id": 7, "name": "Ana" }
        }"#;

        let event = serde_json::from_str::<RawEvent>(json).unwrap().ingest().unwrap();
        assert_eq!(event.id, EventId::new("1"));
        assert_eq!(event.owner, User::new("7", "Ana"));
    }

    #[test]
    fn test_ingest_events_fails_whole_batch() {
        let json = r#"[
            {"id":"1","title":"ok","start":"2025-03-20","end":"2025-03-21","user":{"id":"u"}},
            {"id":"2","title":"bad","start":"someday","end":"2025-03-21","user":{"id":"u"}}
        ]"#;
        let raw: Vec<RawEvent> = serde_json::from_str(json).unwrap();
        assert!(ingest_events(raw).is_err());
    }

    #[test]
    fn test_ownership_uses_canonical_id() {
        let owner_json = r#"{"_id":"u-1","name":"Ana"}"#;
        let owner = serde_json::from_str::<RawUser>(owner_json).unwrap().normalize().unwrap();
        let session_user = User::new("u-1", "Ana María");

        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let draft = EventDraft::new("Review", start, start);
        let event = CalendarEvent::from_draft(&draft, EventId::new("e"), owner);

        assert!(event.is_owned_by(&session_user));
        assert!(!event.is_owned_by(&User::new("u-2", "Ana")));
    }
}
