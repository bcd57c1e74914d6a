//! Identity and session wire types. The identity fields are read-only
//! assertions from the external provider; the session token is minted by the
//! backend and never appears in these payloads in the clear.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user as asserted by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Request body for `POST /jwt`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

/// Response body of `POST /jwt`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Response body of `GET /verify-token`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Profile payload for the idempotent `POST /users` upsert.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: Option<String>,
    pub email: String,
    pub photo: Option<String>,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Builds the default-role record for a freshly asserted identity.
    #[must_use]
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            photo: identity.photo_url.clone(),
            role: "user".to_string(),
            created_at: Utc::now(),
        }
    }
}
