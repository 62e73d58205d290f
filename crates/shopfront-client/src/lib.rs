//! # shopfront-client: Authenticated REST Client for Shopfront
//!
//! Everything the POS screens do over the network goes through [`ApiClient`].
//! The client keeps the session in a [`SessionStore`] and, when the backend
//! reports an expired session, parks the request behind a [`ReauthGate`] so
//! the cashier is asked for their password exactly once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Shopfront Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             shopfront-core (Cart, CheckoutPayload)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ shopfront-client (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐   ┌────────────┐   ┌─────────────────────┐     │   │
//! │  │   │ ApiClient │──►│ ReauthGate │──►│ CredentialPrompt    │     │   │
//! │  │   │  (api/)   │   │ (reauth)   │   │ (supplied by UI)    │     │   │
//! │  │   └─────┬─────┘   └─────┬──────┘   └─────────────────────┘     │   │
//! │  │         │               │                                       │   │
//! │  │   ┌─────▼───────────────▼─────┐   ┌─────────────────────┐     │   │
//! │  │   │ Transport (reqwest)       │   │ SessionStore        │     │   │
//! │  │   │ JSON envelope decoding    │   │ memory or file      │     │   │
//! │  │   └─────────────┬─────────────┘   └─────────────────────┘     │   │
//! │  └─────────────────┼───────────────────────────────────────────────┘   │
//! │                    │ HTTPS + bearer token                               │
//! │                    ▼                                                    │
//! │             Shopfront backend                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Endpoint calls (auth, POS, sales)
//! - [`reauth`] - Single-flight reauthentication gate
//! - [`transport`] - Request/response types and the reqwest transport
//! - [`session`] - Session storage and typed accessors
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Client error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use shopfront_client::{ApiClient, ClientConfig, CredentialPrompt, PromptOutcome, PromptRequest};
//! use std::sync::Arc;
//!
//! struct Terminal;
//!
//! #[async_trait]
//! impl CredentialPrompt for Terminal {
//!     async fn request_password(&self, _request: PromptRequest) -> PromptOutcome {
//!         PromptOutcome::Cancelled
//!     }
//! }
//!
//! # async fn run() -> shopfront_client::ClientResult<()> {
//! let config = ClientConfig::load_or_default(None);
//! let client = ApiClient::connect(config, Arc::new(Terminal))?;
//! let results = client.search_items(&"1".into(), "soap").await?;
//! println!("{} matches", results.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod reauth;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::auth::UserProfile;
pub use api::{ApiClient, EndpointReauthenticator, HeldSale, Page, Sale};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ReauthError};
pub use reauth::{
    CredentialPrompt, Credentials, PromptOutcome, PromptRequest, ReauthGate, Reauthenticator,
    TokenGrant,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::{ApiRequest, ApiResponse, Envelope, HttpTransport, Method, Transport};
