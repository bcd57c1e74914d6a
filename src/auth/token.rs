//! Token exchange: converts a verified identity into a backend-trusted
//! session token. A successful mint fully replaces the persisted token; a
//! failed mint leaves the previous token in place. Each mint is keyed to the
//! identity epoch that triggered it, and a result arriving after the identity
//! has changed again is discarded rather than stored.

use crate::api::ApiClient;
use crate::auth::bridge::IdentityBridge;
use crate::auth::client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Mint call failed; any previously stored token remains valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to mint session token: {0}")]
pub struct TokenMintError(#[source] pub crate::api::ApiError);

/// Converts identities into persisted session tokens.
pub struct TokenExchange {
    bridge: Arc<IdentityBridge>,
    api: Arc<ApiClient>,
}

impl TokenExchange {
    #[must_use]
    pub fn new(bridge: Arc<IdentityBridge>, api: Arc<ApiClient>) -> Self {
        Self { bridge, api }
    }

    /// Mints a token for `email`, storing it only if the identity stream has
    /// not advanced past `epoch` while the call was in flight.
    ///
    /// # Errors
    /// Returns `TokenMintError` when the mint call fails; the previous token
    /// is untouched either way.
    #[instrument(skip(self))]
    pub async fn mint(&self, email: &str, epoch: u64) -> Result<(), TokenMintError> {
        let token = client::mint_token(&self.api, email)
            .await
            .map_err(TokenMintError)?;

        if self.bridge.current_epoch() == epoch {
            self.api.session().set_token(token);
        } else {
            debug!("discarding stale mint for epoch {epoch}");
        }

        Ok(())
    }

    /// Removes the persisted token unconditionally.
    pub fn clear(&self) {
        self.api.session().clear_token();
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenExchange, TokenMintError};
    use crate::api::{ApiClient, ApiError};
    use crate::auth::bridge::tests::FakeProvider;
    use crate::auth::bridge::IdentityBridge;
    use crate::auth::guards::MemoryNavigator;
    use crate::auth::state::SessionStore;
    use crate::config::AppConfig;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn exchange_for(server: &MockServer) -> (TokenExchange, Arc<SessionStore>) {
        let session = Arc::new(SessionStore::in_memory());
        let config = AppConfig::new(&server.uri(), "http://identity.test", "key", PathBuf::new());
        let api = Arc::new(
            ApiClient::new(
                &config,
                Arc::clone(&session),
                Arc::new(MemoryNavigator::new()),
            )
            .unwrap(),
        );
        let bridge = Arc::new(IdentityBridge::init(Arc::new(FakeProvider::default())).await);
        (TokenExchange::new(bridge, api), session)
    }

    #[tokio::test]
    async fn mint_replaces_the_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
            .mount(&server)
            .await;

        let (exchange, session) = exchange_for(&server).await;
        session.set_token(SecretString::from("old".to_string()));

        exchange.mint("a@x.com", 0).await.unwrap();
        assert_eq!(session.token().unwrap().expose_secret(), "fresh");
    }

    #[tokio::test]
    async fn failed_mint_keeps_the_previous_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(500).set_body_string("mint broke"))
            .mount(&server)
            .await;

        let (exchange, session) = exchange_for(&server).await;
        session.set_token(SecretString::from("still-valid".to_string()));

        let err = exchange.mint("a@x.com", 0).await.unwrap_err();
        assert!(matches!(err, TokenMintError(ApiError::Http { .. })));
        assert_eq!(session.token().unwrap().expose_secret(), "still-valid");
    }

    #[tokio::test]
    async fn stale_mint_is_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "stale"})))
            .mount(&server)
            .await;

        let (exchange, session) = exchange_for(&server).await;
        // The identity stream is at epoch 0; a mint keyed to an older view
        // must not store its result.
        let result = exchange.mint("a@x.com", 42).await;
        assert!(result.is_ok());
        assert!(session.token().is_none());
    }
}
