//! Users and identity normalization.
//!
//! The server is inconsistent about how it names a user's identity: auth
//! responses carry `uid`, populated event owners carry `_id`, and some
//! payloads use plain `id`. [`RawUser::normalize`] is the one place that
//! resolves those aliases; everything downstream sees a single [`UserId`].

use serde::{Deserialize, Serialize};

use crate::error::{CalAppError, CalAppResult};
use crate::ids::{RawId, UserId, first_present};

/// An authenticated user (or the owner of an event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        User {
            id: UserId::new(id),
            name: name.into(),
        }
    }
}

/// A user record as it arrives over the wire, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default, rename = "_id")]
    pub object_id: Option<RawId>,
    #[serde(default)]
    pub uid: Option<RawId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl RawUser {
    /// Resolve the identity aliases into a canonical [`User`].
    ///
    /// Precedence is `id`, then `_id`, then `uid`. Empty strings count as absent.
    pub fn normalize(self) -> CalAppResult<User> {
        let id = first_present([self.id, self.object_id, self.uid])
            .ok_or_else(|| CalAppError::Serialization("user record has no identifier".into()))?;

        Ok(User {
            id: UserId(id),
            name: self.name.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CalAppResult<User> {
        serde_json::from_str::<RawUser>(json).unwrap().normalize()
    }

    #[test]
    fn test_normalize_accepts_each_alias() {
        let expected = UserId::new("67db4307");
        assert_eq!(parse(r#"{"id":"67db4307","name":"Ana"}"#).unwrap().id, expected);
        assert_eq!(parse(r#"{"_id":"67db4307","name":"Ana"}"#).unwrap().id, expected);
        assert_eq!(parse(r#"{"uid":"67db4307","name":"Ana"}"#).unwrap().id, expected);
    }

    #[test]
    fn test_normalize_prefers_plain_id() {
        let user = parse(r#"{"id":"a","_id":"b","uid":"c"}"#).unwrap();
        assert_eq!(user.id.as_str(), "a");
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_normalize_skips_empty_alias() {
        let user = parse(r#"{"id":"","_id":"b"}"#).unwrap();
        assert_eq!(user.id.as_str(), "b");
    }

    #[test]
    fn test_normalize_without_identifier_fails() {
        assert!(matches!(
            parse(r#"{"name":"Nobody"}"#),
            Err(CalAppError::Serialization(_))
        ));
    }
}
