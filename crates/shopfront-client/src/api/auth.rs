//! Login and logout.
//!
//! Login writes the whole session (token, user, role, permissions, location);
//! logout clears it even when the server could not process the request.

use serde::{Deserialize, Serialize};
use shopfront_core::validation::validate_credentials;
use shopfront_core::{Id, Location};
use tracing::{info, warn};

use super::ApiClient;
use crate::error::ClientResult;
use crate::session::keys;
use crate::transport::{ApiRequest, ApiResponse};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    location_id: &'a Id,
}

#[derive(Debug, Deserialize)]
struct AuthObject {
    access_token: String,
    username: String,
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    roles: Vec<RoleGrant>,
}

#[derive(Debug, Deserialize)]
struct RoleGrant {
    name: String,
    #[serde(default)]
    permissions: Vec<PermissionGrant>,
}

#[derive(Debug, Deserialize)]
struct PermissionGrant {
    name: String,
}

/// The signed-in user as recorded in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub username: String,
    /// First role granted to the user.
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub location: Option<Location>,
}

impl ApiClient {
    /// Signs in at a selling location and stores the session.
    ///
    /// The form is validated before any request is sent.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        location_id: &Id,
    ) -> ClientResult<UserProfile> {
        validate_credentials(username, password)?;

        let request = ApiRequest::post(self.config.login_path.as_str()).json(&LoginRequest {
            username,
            password,
            location_id,
        })?;
        let auth: AuthObject = self.fetch(request, "auth_object").await?;

        let role = auth.roles.into_iter().next();
        let profile = UserProfile {
            username: auth.username,
            role: role.as_ref().map(|r| r.name.clone()),
            permissions: role
                .map(|r| r.permissions.into_iter().map(|p| p.name).collect())
                .unwrap_or_default(),
            location: auth.location,
        };

        let session = self.session();
        session.store_token(&auth.access_token, auth.expires_at.as_deref())?;
        self.store.set(keys::USER, &profile.username)?;
        match &profile.role {
            Some(role) => self.store.set(keys::ROLE, role)?,
            None => self.store.remove(keys::ROLE)?,
        }
        self.store
            .set(keys::PERMISSIONS, &serde_json::to_string(&profile.permissions)?)?;
        match &profile.location {
            Some(location) => {
                self.store.set(keys::LOCATION, &location.name)?;
                self.store.set(keys::LOCATION_ID, location.id.as_str())?;
            }
            None => {
                self.store.remove(keys::LOCATION)?;
                self.store.remove(keys::LOCATION_ID)?;
            }
        }

        info!(username = %profile.username, role = ?profile.role, "Logged in");
        Ok(profile)
    }

    /// Signs out and clears the session.
    ///
    /// Sent without the reauthentication gate: an expired session must not
    /// ask for a password just to log out.
    pub async fn logout(&self) -> ClientResult<()> {
        let token = self.session().bearer_token();
        let request = ApiRequest::post(self.config.logout_path.as_str());

        match self
            .transport
            .execute(&request, token.as_deref())
            .await
            .and_then(ApiResponse::into_envelope)
        {
            Ok(envelope) => info!(message = ?envelope.message, "Logged out"),
            Err(err) => warn!(error = %err, "Server could not process logout request"),
        }

        self.session().clear()
    }

    /// Profile of the signed-in user, read back from the session.
    pub fn current_user(&self) -> Option<UserProfile> {
        let session = self.session();
        let username = session.username()?;
        let location = match (session.location_id(), self.store.get(keys::LOCATION)) {
            (Some(id), name) => Some(Location {
                id: Id::new(id),
                name: name.unwrap_or_default(),
            }),
            (None, _) => None,
        };

        Some(UserProfile {
            username,
            role: session.role(),
            permissions: session.permissions(),
            location,
        })
    }
}
