//! # HTTP Transport
//!
//! Replayable request descriptors, the [`Transport`] seam and its reqwest
//! implementation, plus decoding of the backend's response envelope.
//!
//! ## Response Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "status": true, "message": "Sale saved", "sale": { ... } }           │
//! │     │                 │                      │                          │
//! │     │                 │                      └── entity field, named    │
//! │     │                 │                          per endpoint           │
//! │     │                 └── optional human-readable text                  │
//! │     └── false ⇒ ClientError::Rejected(message) even on HTTP 200         │
//! │                                                                         │
//! │  Non-2xx ⇒ ClientError::Status { status, message }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Request / Response
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outbound call, complete enough to be sent again after reauthentication.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        ApiResponse { status, body }
    }

    /// Decodes the body as a backend envelope.
    pub fn into_envelope(self) -> ClientResult<Envelope> {
        Envelope::from_value(self.body)
    }

    /// Decodes the whole body (for endpoints that answer without an envelope).
    pub fn json<T: DeserializeOwned>(self) -> ClientResult<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// The `{ status, message, <entity> }` wrapper every endpoint returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_status() -> bool {
    true
}

impl Envelope {
    /// Parses an envelope, turning `status: false` into [`ClientError::Rejected`].
    pub fn from_value(body: Value) -> ClientResult<Self> {
        if !body.is_object() {
            return Err(ClientError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                body
            )));
        }

        let envelope: Envelope = serde_json::from_value(body)?;
        if !envelope.status {
            return Err(ClientError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Request was not successful".to_string()),
            ));
        }
        Ok(envelope)
    }

    /// Removes and decodes a named entity field.
    pub fn take<T: DeserializeOwned>(&mut self, field: &str) -> ClientResult<T> {
        let value = self
            .fields
            .remove(field)
            .ok_or_else(|| ClientError::InvalidResponse(format!("missing `{}` field", field)))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Like [`Envelope::take`], but a missing or `null` field yields `None`.
    pub fn take_optional<T: DeserializeOwned>(&mut self, field: &str) -> ClientResult<Option<T>> {
        match self.fields.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

/// Human-readable message for a failed response.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

// =============================================================================
// Transport
// =============================================================================

/// Executes requests against the backend.
///
/// Implementations return `Ok` only for 2xx responses; anything else is a
/// [`ClientError::Status`] carrying the envelope message when present.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<ApiResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(HttpTransport {
            client,
            config: config.clone(),
        })
    }

    async fn handle_response(response: reqwest::Response) -> ClientResult<ApiResponse> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| ClientError::InvalidResponse(format!("body is not JSON: {}", e)))?
        };

        Ok(ApiResponse::new(status.as_u16(), body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<ApiResponse> {
        let url = self.config.endpoint_url(&request.path)?;
        debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        Self::handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/inventories/search")
            .query("location_id", 3)
            .query("keyword", "soap");

        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.query,
            vec![
                ("location_id".to_string(), "3".to_string()),
                ("keyword".to_string(), "soap".to_string())
            ]
        );
        assert!(request.body.is_none());

        let request = ApiRequest::post("/pos/hold")
            .json(&json!({ "notes": "later" }))
            .unwrap();
        assert_eq!(request.body, Some(json!({ "notes": "later" })));
    }

    #[test]
    fn test_envelope_take_entity() {
        let mut envelope = Envelope::from_value(json!({
            "status": true,
            "message": "ok",
            "stock": 12
        }))
        .unwrap();

        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert_eq!(envelope.take::<i64>("stock").unwrap(), 12);
        assert!(matches!(
            envelope.take::<i64>("stock"),
            Err(ClientError::InvalidResponse(_))
        ));
        assert_eq!(envelope.take_optional::<i64>("missing").unwrap(), None);
    }

    #[test]
    fn test_envelope_status_false_is_rejected() {
        let err = Envelope::from_value(json!({
            "status": false,
            "message": "Item not found"
        }))
        .unwrap_err();

        match err {
            ClientError::Rejected(message) => assert_eq!(message, "Item not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_envelope_requires_object() {
        assert!(matches!(
            Envelope::from_value(json!([1, 2])),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        assert_eq!(
            error_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":"Bad password"}"#),
            "Bad password"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, "<html>"),
            "Unauthorized"
        );
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
