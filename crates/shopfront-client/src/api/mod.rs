//! # API Client
//!
//! [`ApiClient`] is the single entry point the POS screens call. It attaches
//! the stored bearer token to every request and hands session-expired
//! failures to the [`ReauthGate`].
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ApiClient::send                                 │
//! │                                                                         │
//! │   request ──► Transport (token from SessionStore)                      │
//! │                  │                                                      │
//! │                  ├── 2xx ─────────────────────────────────► Ok          │
//! │                  ├── other error ─────────────────────────► Err         │
//! │                  ├── 401/419 on login/reauth path ────────► Err         │
//! │                  └── 401/419 elsewhere ──► ReauthGate ────► replayed    │
//! │                                                            outcome      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Endpoint Groups
//! - [`auth`] - login, logout, reauthentication
//! - [`pos`] - item search, stock checks, held sales
//! - [`sales`] - sale lifecycle, listings, summary, receipts

pub mod auth;
pub mod pos;
pub mod sales;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::reauth::{
    CredentialPrompt, Credentials, ReauthContext, ReauthGate, Reauthenticator, TokenGrant,
};
use crate::session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
use crate::transport::{ApiRequest, ApiResponse, Envelope, HttpTransport, Transport};

pub use pos::HeldSale;
pub use sales::{Page, Sale};

/// Authenticated client for the Shopfront backend.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    prompt: Arc<dyn CredentialPrompt>,
    reauthenticator: Arc<dyn Reauthenticator>,
    gate: ReauthGate,
}

impl ApiClient {
    /// Assembles a client from its collaborators.
    ///
    /// Reauthentication posts to `config.reauth_path` through the same
    /// transport unless replaced with [`ApiClient::with_reauthenticator`].
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self {
        let reauthenticator = Arc::new(EndpointReauthenticator::new(
            transport.clone(),
            config.reauth_path.clone(),
        ));
        let gate = ReauthGate::new(config.max_reauth_attempts);

        ApiClient {
            config,
            transport,
            store,
            prompt,
            reauthenticator,
            gate,
        }
    }

    /// Builds the production client: reqwest transport and a session store
    /// chosen by `config.session_file`.
    pub fn connect(config: ClientConfig, prompt: Arc<dyn CredentialPrompt>) -> ClientResult<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        let store: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStore::open(path)?),
            None => Arc::new(MemorySessionStore::new()),
        };
        Ok(Self::new(config, transport, store, prompt))
    }

    pub fn with_reauthenticator(mut self, reauthenticator: Arc<dyn Reauthenticator>) -> Self {
        self.reauthenticator = reauthenticator;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(self.store.as_ref())
    }

    pub fn gate(&self) -> &ReauthGate {
        &self.gate
    }

    /// Sends a request with the stored token, recovering from an expired
    /// session through the reauthentication gate.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let token = self.session().bearer_token();

        match self.transport.execute(&request, token.as_deref()).await {
            Err(err) if err.is_auth_failure() && !self.is_auth_endpoint(&request) => {
                debug!(path = %request.path, "Request hit an expired session");
                let ctx = ReauthContext {
                    transport: self.transport.as_ref(),
                    store: self.store.as_ref(),
                    prompt: self.prompt.as_ref(),
                    reauthenticator: self.reauthenticator.as_ref(),
                };
                self.gate.recover(request, &ctx).await
            }
            outcome => outcome,
        }
    }

    /// Sends a request and decodes the response envelope.
    pub async fn send_envelope(&self, request: ApiRequest) -> ClientResult<Envelope> {
        self.send(request).await?.into_envelope()
    }

    /// Sends a request and extracts one entity field from the envelope.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest, field: &str) -> ClientResult<T> {
        self.send_envelope(request).await?.take(field)
    }

    fn is_auth_endpoint(&self, request: &ApiRequest) -> bool {
        request.path == self.config.login_path || request.path == self.config.reauth_path
    }
}

// =============================================================================
// Endpoint Reauthenticator
// =============================================================================

/// Posts `{ username, password }` to the reauthentication endpoint and reads
/// `{ access_token, expires_at }` from the body.
///
/// Goes straight to the transport: a refusal here must reach the gate as a
/// status error, not open another episode.
pub struct EndpointReauthenticator {
    transport: Arc<dyn Transport>,
    path: String,
}

impl EndpointReauthenticator {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        EndpointReauthenticator {
            transport,
            path: path.into(),
        }
    }
}

#[async_trait]
impl Reauthenticator for EndpointReauthenticator {
    async fn reauthenticate(&self, credentials: &Credentials) -> ClientResult<TokenGrant> {
        let request = ApiRequest::post(self.path.as_str()).json(credentials)?;
        self.transport.execute(&request, None).await?.json()
    }
}
