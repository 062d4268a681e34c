//! Identifier newtypes.
//!
//! Ids are assigned by the server and are opaque strings on the client.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(EventId);

/// An identifier as it arrives over the wire: a string or a plain number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_text(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawId {
    fn from(id: &str) -> Self {
        RawId::Text(id.to_string())
    }
}

impl From<String> for RawId {
    fn from(id: String) -> Self {
        RawId::Text(id)
    }
}

/// The first non-empty candidate, in order.
///
/// Used wherever the server may name the same identifier more than one way.
pub(crate) fn first_present<const N: usize>(candidates: [Option<RawId>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(RawId::into_text)
        .find(|id| !id.is_empty())
}
