//! # Reauthentication Gate
//!
//! Recovers requests that failed because the session expired. The first
//! failing request opens a single password prompt; every request that fails
//! while the prompt is open waits behind it and is replayed with the new
//! token once the user signs back in.
//!
//! ## Episode Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Reauthentication Episode                          │
//! │                                                                         │
//! │   ┌──────┐  401/419 (leader)   ┌───────────────────┐                   │
//! │   │ Idle │ ──────────────────► │ Awaiting password │◄──┐ wrong password│
//! │   └──────┘                     └─────────┬─────────┘───┘ (re-prompt)   │
//! │      ▲                                   │                              │
//! │      │         401/419 while awaiting:   │ token issued                 │
//! │      │         queue (request, reply)    ▼                              │
//! │      │                         ┌───────────────────┐                    │
//! │      ├──────────────────────── │     Replaying     │                    │
//! │      │  queue drained          │ trigger, then FIFO│                    │
//! │      │                         └───────────────────┘                    │
//! │      │                                                                  │
//! │      └──── cancel / reauth error: trigger and every queued request     │
//! │            fail with the same ReauthError                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! `refreshing` and the queue sit behind a `std::sync::Mutex` that is only
//! taken in short synchronous sections, never across an `.await`. The last
//! "queue is empty" check and the reset to Idle happen under the same lock,
//! so a request cannot be queued into an episode that has already finished.
//!
//! ## Ordering
//! The trigger's replay completes before any queued request is replayed.
//! Queued requests are then replayed one after another in the order they
//! failed, each with its own outcome. A replay that fails again is returned
//! as-is; it never opens a second episode.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult, ReauthError};
use crate::session::{Session, SessionStore};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Shown in the prompt after the backend refused a password.
pub const REJECTED_CREDENTIALS_MESSAGE: &str = "Authentication failed. Try again.";

// =============================================================================
// Collaborators
// =============================================================================

/// Body of a reauthentication request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Token issued by the reauthentication endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// What the prompt is asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub username: String,
    /// Set when re-asking after a refused password. The prompt that is
    /// already open should display it instead of opening another one.
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Submitted(String),
    Cancelled,
}

/// Asks the user for their password.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn request_password(&self, request: PromptRequest) -> PromptOutcome;
}

/// Exchanges credentials for a fresh token.
///
/// A refused password must surface as a 401/419/422 [`ClientError::Status`];
/// any other error ends the episode.
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    async fn reauthenticate(&self, credentials: &Credentials) -> ClientResult<TokenGrant>;
}

/// Everything an episode needs, borrowed from the owning client.
pub struct ReauthContext<'a> {
    pub transport: &'a dyn Transport,
    pub store: &'a dyn SessionStore,
    pub prompt: &'a dyn CredentialPrompt,
    pub reauthenticator: &'a dyn Reauthenticator,
}

// =============================================================================
// Gate
// =============================================================================

struct QueuedRequest {
    request: ApiRequest,
    reply: oneshot::Sender<ClientResult<ApiResponse>>,
}

#[derive(Default)]
struct GateState {
    refreshing: bool,
    queue: VecDeque<QueuedRequest>,
}

enum Role {
    Leader(ApiRequest),
    Follower(oneshot::Receiver<ClientResult<ApiResponse>>),
}

/// Single-flight reauthentication gate.
///
/// One instance per client session. Cheap to construct; holds no
/// collaborators itself.
pub struct ReauthGate {
    state: Mutex<GateState>,
    max_attempts: u32,
}

impl ReauthGate {
    /// `max_attempts` bounds refused passwords per episode (0 = unbounded).
    pub fn new(max_attempts: u32) -> Self {
        ReauthGate {
            state: Mutex::new(GateState::default()),
            max_attempts,
        }
    }

    /// True while an episode is open.
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of requests waiting for the open episode.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Recovers a request that failed with 401/419.
    ///
    /// Resolves to the outcome of replaying `request` with a fresh token, or
    /// to [`ClientError::Reauth`] if the episode was cancelled or failed.
    pub async fn recover(
        &self,
        request: ApiRequest,
        ctx: &ReauthContext<'_>,
    ) -> ClientResult<ApiResponse> {
        let trigger = match self.join(request) {
            Role::Leader(trigger) => trigger,
            Role::Follower(reply) => {
                return reply.await.unwrap_or_else(|_| {
                    Err(ReauthError::Failed("reauthentication was interrupted".into()).into())
                });
            }
        };

        info!(path = %trigger.path, "Session expired, starting reauthentication");
        let mut episode = EpisodeGuard::new(self);

        let token = match self.obtain_token(ctx).await {
            Ok(token) => token,
            Err(err) => {
                episode.fail(err.clone());
                return Err(err.into());
            }
        };

        let outcome = ctx.transport.execute(&trigger, Some(token.as_str())).await;
        debug!(path = %trigger.path, ok = outcome.is_ok(), "Replayed triggering request");

        let replayed = self.drain(&token, ctx).await;
        episode.finished();
        info!(replayed, "Reauthentication complete");

        outcome
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Becomes the episode leader, or queues behind the open episode.
    fn join(&self, request: ApiRequest) -> Role {
        let mut state = self.lock();
        if state.refreshing {
            let (reply, receiver) = oneshot::channel();
            state.queue.push_back(QueuedRequest { request, reply });
            debug!(queued = state.queue.len(), "Request queued behind reauthentication");
            Role::Follower(receiver)
        } else {
            state.refreshing = true;
            Role::Leader(request)
        }
    }

    /// Prompts until a token is issued or the episode must end.
    async fn obtain_token(&self, ctx: &ReauthContext<'_>) -> Result<String, ReauthError> {
        let session = Session::new(ctx.store);
        let username = session
            .username()
            .ok_or_else(|| ReauthError::Failed("no signed-in user to reauthenticate".into()))?;

        let mut last_error = None;
        let mut attempts: u32 = 0;

        loop {
            let prompt = PromptRequest {
                username: username.clone(),
                last_error: last_error.take(),
            };
            let password = match ctx.prompt.request_password(prompt).await {
                PromptOutcome::Submitted(password) => password,
                PromptOutcome::Cancelled => {
                    info!("Reauthentication cancelled by user");
                    return Err(ReauthError::Cancelled);
                }
            };

            attempts += 1;
            let credentials = Credentials {
                username: username.clone(),
                password,
            };

            match ctx.reauthenticator.reauthenticate(&credentials).await {
                Ok(grant) => {
                    session
                        .store_token(&grant.access_token, grant.expires_at.as_deref())
                        .map_err(|e| ReauthError::Failed(e.to_string()))?;
                    return Ok(grant.access_token);
                }
                Err(err) if err.is_credentials_rejected() => {
                    warn!(attempts, "Reauthentication refused");
                    if self.max_attempts != 0 && attempts >= self.max_attempts {
                        return Err(ReauthError::Failed(err.to_string()));
                    }
                    last_error = Some(REJECTED_CREDENTIALS_MESSAGE.to_string());
                }
                Err(err) => {
                    warn!(error = %err, "Reauthentication request failed");
                    return Err(ReauthError::Failed(err.to_string()));
                }
            }
        }
    }

    /// Replays queued requests in FIFO order until the queue stays empty,
    /// then returns the gate to Idle. Returns how many were replayed.
    async fn drain(&self, token: &str, ctx: &ReauthContext<'_>) -> usize {
        let mut replayed = 0;

        loop {
            let batch = {
                let mut state = self.lock();
                if state.queue.is_empty() {
                    state.refreshing = false;
                    break;
                }
                std::mem::take(&mut state.queue)
            };

            for queued in batch {
                let outcome = ctx.transport.execute(&queued.request, Some(token)).await;
                debug!(path = %queued.request.path, ok = outcome.is_ok(), "Replayed queued request");
                if queued.reply.send(outcome).is_err() {
                    debug!("Queued caller went away before its replay finished");
                }
                replayed += 1;
            }
        }

        replayed
    }

    /// Ends the episode, failing every queued request with `err`.
    fn fail_all(&self, err: ReauthError) {
        let queue = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.queue)
        };

        if !queue.is_empty() {
            info!(queued = queue.len(), error = %err, "Failing queued requests");
        }
        for queued in queue {
            let _ = queued.reply.send(Err(ClientError::Reauth(err.clone())));
        }
    }
}

impl Default for ReauthGate {
    fn default() -> Self {
        ReauthGate::new(0)
    }
}

/// Returns the gate to Idle if the leader is dropped mid-episode.
struct EpisodeGuard<'a> {
    gate: &'a ReauthGate,
    open: bool,
}

impl<'a> EpisodeGuard<'a> {
    fn new(gate: &'a ReauthGate) -> Self {
        EpisodeGuard { gate, open: true }
    }

    fn fail(&mut self, err: ReauthError) {
        self.open = false;
        self.gate.fail_all(err);
    }

    fn finished(&mut self) {
        self.open = false;
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if self.open {
            warn!("Reauthentication leader dropped before the episode ended");
            self.gate
                .fail_all(ReauthError::Failed("reauthentication was interrupted".into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{keys, MemorySessionStore};
    use crate::test_support::{FakePrompt, FakeReauthenticator, FakeTransport};
    use std::future::Future;
    use std::pin::Pin;
    use std::task::Poll;

    fn signed_in_store() -> MemorySessionStore {
        let store = MemorySessionStore::new();
        store.set(keys::USER, "alice").unwrap();
        store.set(keys::TOKEN, "stale").unwrap();
        store
    }

    #[tokio::test]
    async fn test_single_request_recovers() {
        let transport = FakeTransport::accepting("fresh");
        let store = signed_in_store();
        let prompt = FakePrompt::answering(["secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        let response = gate.recover(ApiRequest::get("/sales"), &ctx).await.unwrap();

        assert_eq!(response.body["path"], "/sales");
        assert_eq!(prompt.calls(), 1);
        assert_eq!(store.get(keys::TOKEN).as_deref(), Some("fresh"));
        assert_eq!(store.get(keys::TOKEN_EXPIRE).as_deref(), Some("2030-01-01T00:00:00Z"));
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn test_wrong_password_reprompts_with_message() {
        let transport = FakeTransport::accepting("fresh");
        let store = signed_in_store();
        let prompt = FakePrompt::answering(["wrong-one", "secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        gate.recover(ApiRequest::get("/sales"), &ctx).await.unwrap();

        let requests = prompt.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].last_error, None);
        assert_eq!(
            requests[1].last_error.as_deref(),
            Some(REJECTED_CREDENTIALS_MESSAGE)
        );
        assert_eq!(requests[1].username, "alice");
    }

    #[tokio::test]
    async fn test_attempt_limit_ends_episode() {
        let transport = FakeTransport::accepting("fresh");
        let store = signed_in_store();
        let prompt = FakePrompt::answering(["bad-one", "bad-two", "secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(2);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        let err = gate.recover(ApiRequest::get("/sales"), &ctx).await.unwrap_err();

        assert!(matches!(err, ClientError::Reauth(ReauthError::Failed(_))));
        assert_eq!(prompt.calls(), 2);
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn test_backend_error_during_reauth_is_terminal() {
        let transport = FakeTransport::accepting("fresh");
        let store = signed_in_store();
        let prompt = FakePrompt::answering(["secret1", "secret1"]);
        let reauth = FakeReauthenticator::failing(503);
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        let err = gate.recover(ApiRequest::get("/sales"), &ctx).await.unwrap_err();

        assert!(matches!(err, ClientError::Reauth(ReauthError::Failed(_))));
        assert_eq!(prompt.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_user_fails_without_prompt() {
        let transport = FakeTransport::accepting("fresh");
        let store = MemorySessionStore::new();
        let prompt = FakePrompt::answering(["secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        let err = gate.recover(ApiRequest::get("/sales"), &ctx).await.unwrap_err();

        assert!(matches!(err, ClientError::Reauth(ReauthError::Failed(_))));
        assert_eq!(prompt.calls(), 0);
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn test_replay_failure_is_returned_without_new_episode() {
        // The fresh token is still refused for this path.
        let transport = FakeTransport::accepting("fresh").refusing_path("/admin");
        let store = signed_in_store();
        let prompt = FakePrompt::answering(["secret1", "secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        let err = gate.recover(ApiRequest::get("/admin"), &ctx).await.unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert_eq!(prompt.calls(), 1);
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn test_dropped_leader_returns_gate_to_idle() {
        let transport = FakeTransport::accepting("fresh");
        let store = signed_in_store();
        let prompt = FakePrompt::held(["secret1"]);
        let reauth = FakeReauthenticator::accepting("secret1", "fresh");
        let gate = ReauthGate::new(0);
        let ctx = ReauthContext {
            transport: &transport,
            store: &store,
            prompt: &prompt,
            reauthenticator: &reauth,
        };

        {
            let leader = gate.recover(ApiRequest::get("/sales"), &ctx);
            tokio::pin!(leader);
            // Poll once so the leader opens the prompt, then drop it.
            assert!(futures_poll_once(leader.as_mut()).await.is_none());
            assert!(gate.is_refreshing());
        }

        assert!(!gate.is_refreshing());
    }

    /// Polls a future a single time.
    async fn futures_poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
        let mut fut = fut;
        std::future::poll_fn(|cx| {
            Poll::Ready(match Pin::new(&mut fut).poll(cx) {
                Poll::Ready(output) => Some(output),
                Poll::Pending => None,
            })
        })
        .await
    }
}
