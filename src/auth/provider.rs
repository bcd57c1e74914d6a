//! Adapter for the external identity provider. The provider is an opaque
//! authentication oracle: given credentials (or the completion payload of a
//! provider-controlled federated flow) it returns a verified [`Identity`].
//! [`HttpIdentityProvider`] speaks the hosted provider's REST surface and maps
//! its error codes onto the [`IdentityError`] taxonomy so forms can show
//! targeted messages.

use crate::auth::types::Identity;
use crate::config::{join_url, AppConfig};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Failures raised by identity-provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account with this email already exists")]
    EmailInUse,
    #[error("Sign-in was cancelled")]
    ProviderCancelled,
    #[error("{0}")]
    Other(String),
}

/// The identity oracle. Implemented over HTTP in production and by an
/// in-process fake in tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity the provider restores at startup, if any.
    async fn current_identity(&self) -> Option<Identity>;

    /// Creates a new identity, then sets its profile fields.
    async fn register_with_password(
        &self,
        email: &str,
        password: &SecretString,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Identity, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError>;

    /// Completes a federated sign-in with the payload produced by the
    /// provider-controlled interactive flow.
    async fn sign_in_federated(&self, assertion: &str) -> Result<Identity, IdentityError>;

    /// Never fails for "already signed out".
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// REST implementation against the hosted identity provider. The last
/// verified identity is kept in the provider's own state file (separate from
/// the application token slot) so it is restored at startup, the way the
/// provider's SDK restores its current user.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    state_file: Option<PathBuf>,
    current: RwLock<Option<Identity>>,
}

impl HttpIdentityProvider {
    /// # Errors
    /// Returns `IdentityError::Other` if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::api::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| IdentityError::Other(format!("Failed to build HTTP client: {err}")))?;

        let state_file = if config.token_file.as_os_str().is_empty() {
            None
        } else {
            Some(config.identity_state_file())
        };
        let current = RwLock::new(state_file.as_deref().and_then(load_identity));

        Ok(Self {
            http,
            base_url: config.identity_base_url.clone(),
            api_key: config.identity_api_key.clone(),
            state_file,
            current,
        })
    }

    fn remember(&self, identity: &Identity) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(identity.clone());
        if let Some(path) = &self.state_file {
            persist_identity(path, identity);
        }
    }

    fn forget(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        if let Some(path) = &self.state_file {
            if let Err(err) = std::fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Error removing identity state file: {err}");
                }
            }
        }
    }

    /// Posts one `accounts:{operation}` call and returns the JSON body.
    async fn call(&self, operation: &str, payload: &Value) -> Result<Value, IdentityError> {
        let url = join_url(&self.base_url, &format!("accounts:{operation}"));

        debug!("identity provider call: {operation}");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|err| {
                IdentityError::Other(format!("Unable to reach the identity provider: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_default();
            let code = provider_error_code(&body);
            return Err(map_provider_error(code, status.as_u16()));
        }

        response.json().await.map_err(|err| {
            IdentityError::Other(format!("Invalid identity provider response: {err}"))
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_identity(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[instrument(skip(self, password))]
    async fn register_with_password(
        &self,
        email: &str,
        password: &SecretString,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<Identity, IdentityError> {
        let body = self
            .call(
                "signUp",
                &json!({
                    "email": email,
                    "password": password.expose_secret(),
                    "returnSecureToken": true
                }),
            )
            .await?;

        let mut identity = identity_from_response(&body)?;

        if display_name.is_some() || photo_url.is_some() {
            let id_token = body.get("idToken").and_then(Value::as_str).ok_or_else(|| {
                IdentityError::Other(
                    "Invalid identity provider response: no idToken found".to_string(),
                )
            })?;

            self.call(
                "update",
                &json!({
                    "idToken": id_token,
                    "displayName": display_name,
                    "photoUrl": photo_url,
                    "returnSecureToken": false
                }),
            )
            .await?;

            identity.display_name = display_name.map(str::to_string);
            identity.photo_url = photo_url.map(str::to_string);
        }

        self.remember(&identity);
        Ok(identity)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        let body = self
            .call(
                "signInWithPassword",
                &json!({
                    "email": email,
                    "password": password.expose_secret(),
                    "returnSecureToken": true
                }),
            )
            .await?;

        let identity = identity_from_response(&body)?;
        self.remember(&identity);
        Ok(identity)
    }

    #[instrument(skip(self, assertion))]
    async fn sign_in_federated(&self, assertion: &str) -> Result<Identity, IdentityError> {
        let body = self
            .call(
                "signInWithIdp",
                &json!({
                    "postBody": assertion,
                    "requestUri": "http://localhost",
                    "returnSecureToken": true
                }),
            )
            .await?;

        let identity = identity_from_response(&body)?;
        self.remember(&identity);
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        // Provider-side sessions are client-held; dropping the restored user
        // is all there is to do. Clearing server-side state belongs to the
        // session bootstrap.
        self.forget();
        Ok(())
    }
}

fn load_identity(path: &Path) -> Option<Identity> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(identity) => Some(identity),
        Err(err) => {
            warn!("Error reading identity state file: {err}");
            None
        }
    }
}

/// Atomic replace, same discipline as the token file.
fn persist_identity(path: &Path, identity: &Identity) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("Error creating identity state directory: {err}");
                return;
            }
        }
    }

    let serialized = match serde_json::to_string(identity) {
        Ok(serialized) => serialized,
        Err(err) => {
            warn!("Error encoding identity state: {err}");
            return;
        }
    };

    let tmp = path.with_extension("tmp");
    if let Err(err) = std::fs::write(&tmp, serialized) {
        warn!("Error writing identity state file: {err}");
        return;
    }
    if let Err(err) = std::fs::rename(&tmp, path) {
        warn!("Error replacing identity state file: {err}");
    }
}

fn provider_error_code(body: &Value) -> &str {
    body.get("error")
        .and_then(|err| err.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn map_provider_error(code: &str, status: u16) -> IdentityError {
    let base = code.split(&[' ', ':'][..]).next().unwrap_or(code);
    match base {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
            IdentityError::InvalidCredentials
        }
        "EMAIL_EXISTS" => IdentityError::EmailInUse,
        "USER_CANCELLED" | "FEDERATED_USER_ID_ALREADY_LINKED" => IdentityError::ProviderCancelled,
        "" => IdentityError::Other(format!("Identity provider error ({status})")),
        other => IdentityError::Other(format!("Identity provider error: {other}")),
    }
}

fn identity_from_response(body: &Value) -> Result<Identity, IdentityError> {
    let uid = body
        .get("localId")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            IdentityError::Other("Invalid identity provider response: no localId found".to_string())
        })?
        .to_string();

    let email = body
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            IdentityError::Other("Invalid identity provider response: no email found".to_string())
        })?
        .to_string();

    Ok(Identity {
        uid,
        email,
        display_name: body
            .get("displayName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        photo_url: body
            .get("photoUrl")
            .and_then(Value::as_str)
            .filter(|photo| !photo.is_empty())
            .map(str::to_string),
    })
}
