//! Client wrappers for the backend's session endpoints. These keep endpoint
//! paths and payload shapes in one place; all calls go through the shared
//! pipeline, so authorization failures are already handled by the time an
//! error reaches the caller.

use crate::api::{ApiClient, ApiError};
use crate::auth::types::{TokenRequest, TokenResponse, UserRecord, VerifyResponse};
use secrecy::SecretString;

/// Mints a session token for a verified email.
///
/// # Errors
/// Returns `ApiError` if the mint call fails; the caller decides whether the
/// previously stored token stays in use.
pub async fn mint_token(api: &ApiClient, email: &str) -> Result<SecretString, ApiError> {
    let response: TokenResponse = api
        .post_json(
            "/jwt",
            &TokenRequest {
                email: email.to_string(),
            },
        )
        .await?;
    Ok(SecretString::from(response.token))
}

/// Invalidates server-side session state for the caller.
///
/// # Errors
/// Returns `ApiError` on failure; callers treat this as best effort.
pub async fn logout(api: &ApiClient) -> Result<(), ApiError> {
    api.post_empty("/logout").await
}

/// Asks the backend whether the persisted token is still accepted.
///
/// # Errors
/// Returns `ApiError::Authorization` when the backend rejects the token
/// outright, or another `ApiError` on transport/decoding failure.
pub async fn verify_token(api: &ApiClient) -> Result<bool, ApiError> {
    let response: VerifyResponse = api.get_json("/verify-token").await?;
    Ok(response.valid)
}

/// Idempotent profile upsert. Both fresh creation and "already exists"
/// responses count as success.
///
/// # Errors
/// Returns `ApiError` only for failures other than "already exists".
pub async fn upsert_user(api: &ApiClient, record: &UserRecord) -> Result<(), ApiError> {
    match api.post_json_unit("/users", record).await {
        Ok(()) => Ok(()),
        Err(ApiError::Http { message, .. }) if message.contains("already exists") => Ok(()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{mint_token, upsert_user, verify_token};
    use crate::api::{ApiClient, ApiError};
    use crate::auth::guards::MemoryNavigator;
    use crate::auth::state::SessionStore;
    use crate::auth::types::{Identity, UserRecord};
    use crate::config::AppConfig;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let config = AppConfig::new(&server.uri(), "http://identity.test", "key", PathBuf::new());
        ApiClient::new(
            &config,
            Arc::new(SessionStore::in_memory()),
            Arc::new(MemoryNavigator::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn mint_token_returns_the_backend_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .and(body_partial_json(json!({"email": "a@x.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "minted"})))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let token = mint_token(&api, "a@x.com").await.unwrap();
        assert_eq!(token.expose_secret(), "minted");
    }

    #[tokio::test]
    async fn verify_token_reports_backend_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/verify-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": false})))
            .mount(&server)
            .await;

        let api = client_for(&server);
        assert!(!verify_token(&api).await.unwrap());
    }

    #[tokio::test]
    async fn upsert_user_treats_already_exists_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(
                ResponseTemplate::new(409).set_body_string("User already exists in database"),
            )
            .mount(&server)
            .await;

        let api = client_for(&server);
        let identity = Identity {
            uid: "uid".to_string(),
            email: "a@x.com".to_string(),
            display_name: None,
            photo_url: None,
        };

        assert!(upsert_user(&api, &UserRecord::from_identity(&identity))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn upsert_user_surfaces_other_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let api = client_for(&server);
        let identity = Identity {
            uid: "uid".to_string(),
            email: "a@x.com".to_string(),
            display_name: None,
            photo_url: None,
        };

        let err = upsert_user(&api, &UserRecord::from_identity(&identity))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }
}
