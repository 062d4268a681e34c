//! HTTP implementation of the auth and event gateways.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CalAppError, CalAppResult};
use crate::event::{EventPayload, RawEvent};
use crate::gateway::{AuthGateway, AuthGrant, Credentials, EventGateway, Profile};
use crate::ids::{EventId, RawId, first_present};
use crate::storage::Token;
use crate::user::RawUser;

/// Header carrying the session token on authenticated requests.
pub const TOKEN_HEADER: &str = "x-token";

/// HTTP client for the calendar API.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
}

// Response types matching the server API

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
    #[serde(flatten)]
    user: RawUser,
}

#[derive(Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct CreatedEventResponse {
    event: CreatedEvent,
}

#[derive(Deserialize)]
struct CreatedEvent {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, rename = "_id")]
    object_id: Option<RawId>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default, alias = "msg")]
    message: Option<String>,
}

/// Which endpoint family a response came from; decides how a failure is
/// classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Login,
    Register,
    Renew,
    Events,
}

impl Endpoint {
    fn classify(self, status: StatusCode, message: String) -> CalAppError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return CalAppError::Authentication(message);
        }

        match self {
            Endpoint::Register
                if status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT =>
            {
                CalAppError::Validation(message)
            }
            Endpoint::Login | Endpoint::Register | Endpoint::Renew => {
                CalAppError::Authentication(message)
            }
            Endpoint::Events => CalAppError::Persistence(message),
        }
    }
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> CalAppResult<Self> {
        // A trailing slash keeps any path prefix ("/api") when joining endpoints
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| CalAppError::Config(format!("Invalid api_url '{}': {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalAppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpGateway { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> CalAppResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CalAppError::Config(format!("Invalid endpoint '{}': {}", path, e)))?;
        debug!(%method, %url, "request");
        Ok(self.http.request(method, url))
    }

    fn authed(&self, method: Method, path: &str, token: &Token) -> CalAppResult<RequestBuilder> {
        Ok(self
            .request(method, path)?
            .header(TOKEN_HEADER, token.value.as_str()))
    }

    async fn authenticate(&self, request: RequestBuilder, endpoint: Endpoint) -> CalAppResult<AuthGrant> {
        let resp = check(request.send().await?, endpoint).await?;
        let body: AuthResponse = resp.json().await?;

        Ok(AuthGrant {
            token: Token::issued_now(body.token),
            user: body.user.normalize()?,
        })
    }
}

/// Turn a non-success response into a classified error carrying the
/// server-provided message.
async fn check(resp: Response, endpoint: Endpoint) -> CalAppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp
        .json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_default();

    warn!(%status, ?endpoint, %message, "request rejected");
    Err(endpoint.classify(status, message))
}

#[async_trait]
impl AuthGateway for HttpGateway {
    /// POST /auth
    async fn login(&self, credentials: &Credentials) -> CalAppResult<AuthGrant> {
        let request = self.request(Method::POST, "auth")?.json(credentials);
        self.authenticate(request, Endpoint::Login).await
    }

    /// POST /auth/new
    async fn register(&self, profile: &Profile) -> CalAppResult<AuthGrant> {
        let request = self.request(Method::POST, "auth/new")?.json(profile);
        self.authenticate(request, Endpoint::Register).await
    }

    /// GET /auth/renew
    async fn renew(&self, token: &Token) -> CalAppResult<AuthGrant> {
        let request = self.authed(Method::GET, "auth/renew", token)?;
        self.authenticate(request, Endpoint::Renew).await
    }
}

#[async_trait]
impl EventGateway for HttpGateway {
    /// GET /events
    async fn list_events(&self, token: &Token) -> CalAppResult<Vec<RawEvent>> {
        let resp = self.authed(Method::GET, "events", token)?.send().await?;
        let body: EventsResponse = check(resp, Endpoint::Events).await?.json().await?;
        Ok(body.events)
    }

    /// POST /events
    async fn create_event(&self, token: &Token, event: &EventPayload) -> CalAppResult<EventId> {
        let resp = self
            .authed(Method::POST, "events", token)?
            .json(event)
            .send()
            .await?;
        let body: CreatedEventResponse = check(resp, Endpoint::Events).await?.json().await?;

        first_present([body.event.id, body.event.object_id])
            .map(EventId)
            .ok_or_else(|| CalAppError::Serialization("created event has no identifier".into()))
    }

    /// PUT /events/:id
    async fn update_event(
        &self,
        token: &Token,
        id: &EventId,
        event: &EventPayload,
    ) -> CalAppResult<()> {
        let resp = self
            .authed(Method::PUT, &format!("events/{}", id), token)?
            .json(event)
            .send()
            .await?;
        check(resp, Endpoint::Events).await?;
        Ok(())
    }

    /// DELETE /events/:id
    async fn delete_event(&self, token: &Token, id: &EventId) -> CalAppResult<()> {
        let resp = self
            .authed(Method::DELETE, &format!("events/{}", id), token)?
            .send()
            .await?;
        check(resp, Endpoint::Events).await?;
        Ok(())
    }
}
