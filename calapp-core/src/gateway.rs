//! Remote service boundaries.
//!
//! Controllers talk to the server only through these traits. Every call
//! returns a [`CalAppResult`]; a rejected request is a value, never a panic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CalAppResult;
use crate::event::{EventPayload, RawEvent};
use crate::ids::EventId;
use crate::storage::Token;
use crate::user::User;

/// Body of `POST /auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A successful authentication: a fresh token and who it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: Token,
    pub user: User,
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> CalAppResult<AuthGrant>;
    async fn register(&self, profile: &Profile) -> CalAppResult<AuthGrant>;
    async fn renew(&self, token: &Token) -> CalAppResult<AuthGrant>;
}

#[async_trait]
pub trait EventGateway: Send + Sync {
    /// Raw records; ingestion happens in the controller.
    async fn list_events(&self, token: &Token) -> CalAppResult<Vec<RawEvent>>;
    /// Returns the id the server assigned.
    async fn create_event(&self, token: &Token, event: &EventPayload) -> CalAppResult<EventId>;
    async fn update_event(
        &self,
        token: &Token,
        id: &EventId,
        event: &EventPayload,
    ) -> CalAppResult<()>;
    async fn delete_event(&self, token: &Token, id: &EventId) -> CalAppResult<()>;
}
