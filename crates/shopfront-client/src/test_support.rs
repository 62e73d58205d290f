//! In-memory fakes for the client's collaborators.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

use crate::error::{ClientError, ClientResult};
use crate::reauth::{CredentialPrompt, Credentials, PromptOutcome, PromptRequest, Reauthenticator, TokenGrant};
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

pub(crate) const GRANT_EXPIRY: &str = "2030-01-01T00:00:00Z";

/// Installs a test subscriber once; `RUST_LOG` controls the output.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unauthorized() -> ClientError {
    ClientError::Status {
        status: 401,
        message: "Unauthenticated.".into(),
    }
}

// =============================================================================
// Transport
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub token: Option<String>,
}

enum Route {
    /// Served only with the valid token.
    Protected(Value),
    /// Served with any token (or none).
    Public(Value),
    /// Always fails with this status.
    Status(u16, String),
    /// Reauthentication endpoint accepting one password.
    Reauth { password: String, grant: Value },
}

/// Backend stand-in: protected paths need `valid_token`, unknown protected
/// paths echo `{ status: true, path }`.
pub(crate) struct FakeTransport {
    valid_token: String,
    routes: HashMap<String, Route>,
    calls: Mutex<Vec<Call>>,
    /// `(path, token)` pairs that wait for [`FakeTransport::release_held`].
    holds: Vec<(String, Option<String>)>,
    held: Semaphore,
    waiting: AtomicUsize,
}

impl FakeTransport {
    pub fn accepting(valid_token: &str) -> Self {
        FakeTransport {
            valid_token: valid_token.to_string(),
            routes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            holds: Vec::new(),
            held: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Calls to `path` carrying `token` block until released, one per
    /// release, in the order they arrived.
    pub fn holding(mut self, path: &str, token: Option<&str>) -> Self {
        self.holds
            .push((path.to_string(), token.map(str::to_string)));
        self
    }

    pub fn release_held(&self) {
        self.held.add_permits(1);
    }

    /// Calls currently blocked by [`FakeTransport::holding`].
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn with_json(mut self, path: &str, body: Value) -> Self {
        self.routes.insert(path.to_string(), Route::Protected(body));
        self
    }

    pub fn with_public(mut self, path: &str, body: Value) -> Self {
        self.routes.insert(path.to_string(), Route::Public(body));
        self
    }

    pub fn with_status(mut self, path: &str, status: u16, message: &str) -> Self {
        self.routes
            .insert(path.to_string(), Route::Status(status, message.to_string()));
        self
    }

    pub fn refusing_path(self, path: &str) -> Self {
        self.with_status(path, 401, "Unauthenticated.")
    }

    pub fn with_reauth(mut self, path: &str, password: &str) -> Self {
        let grant = json!({
            "access_token": self.valid_token,
            "expires_at": GRANT_EXPIRY,
        });
        self.routes.insert(
            path.to_string(),
            Route::Reauth {
                password: password.to_string(),
                grant,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// `(path, token)` pairs in call order.
    pub fn log(&self) -> Vec<(String, Option<String>)> {
        self.calls()
            .into_iter()
            .map(|call| (call.path, call.token))
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<ApiResponse> {
        self.calls.lock().unwrap().push(Call {
            method: request.method,
            path: request.path.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            token: token.map(str::to_string),
        });

        let is_held = self
            .holds
            .iter()
            .any(|(path, held_token)| path == &request.path && held_token.as_deref() == token);
        if is_held {
            self.waiting.fetch_add(1, Ordering::SeqCst);
            self.held.acquire().await.expect("hold semaphore closed").forget();
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }

        let authorized = token == Some(self.valid_token.as_str());
        match self.routes.get(&request.path) {
            Some(Route::Status(status, message)) => Err(ClientError::Status {
                status: *status,
                message: message.clone(),
            }),
            Some(Route::Public(body)) => Ok(ApiResponse::new(200, body.clone())),
            Some(Route::Reauth { password, grant }) => {
                let given = request
                    .body
                    .as_ref()
                    .and_then(|body| body.get("password"))
                    .and_then(Value::as_str);
                if given == Some(password.as_str()) {
                    Ok(ApiResponse::new(200, grant.clone()))
                } else {
                    Err(ClientError::Status {
                        status: 422,
                        message: "Invalid credentials".into(),
                    })
                }
            }
            _ if !authorized => Err(unauthorized()),
            Some(Route::Protected(body)) => Ok(ApiResponse::new(200, body.clone())),
            None => Ok(ApiResponse::new(
                200,
                json!({ "status": true, "path": request.path }),
            )),
        }
    }
}

// =============================================================================
// Prompt
// =============================================================================

/// Scripted password prompt. Cancels once the script runs out.
pub(crate) struct FakePrompt {
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<PromptRequest>>,
    /// When set, each answer waits for a [`FakePrompt::release`].
    gate: Option<Semaphore>,
}

impl FakePrompt {
    pub fn answering<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FakePrompt {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn cancelling() -> Self {
        Self::answering(Vec::<String>::new())
    }

    /// Like [`FakePrompt::answering`], but holds each answer until released.
    pub fn held<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prompt = Self::answering(answers);
        prompt.gate = Some(Semaphore::new(0));
        prompt
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialPrompt for FakePrompt {
    async fn request_password(&self, request: PromptRequest) -> PromptOutcome {
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("prompt semaphore closed").forget();
        }

        match self.answers.lock().unwrap().pop_front() {
            Some(password) => PromptOutcome::Submitted(password),
            None => PromptOutcome::Cancelled,
        }
    }
}

// =============================================================================
// Reauthenticator
// =============================================================================

pub(crate) enum FakeReauthenticator {
    Accepting { password: String, token: String },
    Failing(u16),
}

impl FakeReauthenticator {
    pub fn accepting(password: &str, token: &str) -> Self {
        FakeReauthenticator::Accepting {
            password: password.to_string(),
            token: token.to_string(),
        }
    }

    pub fn failing(status: u16) -> Self {
        FakeReauthenticator::Failing(status)
    }
}

#[async_trait]
impl Reauthenticator for FakeReauthenticator {
    async fn reauthenticate(&self, credentials: &Credentials) -> ClientResult<TokenGrant> {
        match self {
            FakeReauthenticator::Accepting { password, token } if &credentials.password == password => {
                Ok(TokenGrant {
                    access_token: token.clone(),
                    expires_at: Some(GRANT_EXPIRY.to_string()),
                })
            }
            FakeReauthenticator::Accepting { .. } => Err(ClientError::Status {
                status: 422,
                message: "Invalid credentials".into(),
            }),
            FakeReauthenticator::Failing(status) => Err(ClientError::Status {
                status: *status,
                message: "Service unavailable".into(),
            }),
        }
    }
}
