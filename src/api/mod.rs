//! Shared HTTP pipeline for all backend calls. Every request goes through one
//! [`ApiClient`]: the persisted bearer token is attached when present, a fixed
//! timeout bounds each call, and authorization failures are handled in exactly
//! one place: the token is cleared and the navigator sent to the login route
//! before the error is propagated to the caller. Timeouts and transport
//! failures surface as [`ApiError::Network`] and never touch the session.

pub mod error;

pub use error::ApiError;

use crate::auth::guards::{Navigator, Route};
use crate::auth::state::SessionStore;
use crate::config::{join_url, AppConfig};
use error::{map_request_error, sanitize_body};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The single shared client used for every backend call.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Builds the client from configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is unusable or the HTTP
    /// client cannot be constructed.
    pub fn new(
        config: &AppConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        validate_base_url(&config.api_base_url)?;

        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
            navigator,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Fetches JSON from `path`.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or decoding failure.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.http.get(self.url(path))).await?;
        handle_json_response(response).await
    }

    /// Fetches JSON from `path` with query parameters.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or decoding failure.
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self
            .send(self.http.get(self.url(path)).query(query))
            .await?;
        handle_json_response(response).await
    }

    /// Posts JSON to `path` and parses a JSON response.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or decoding failure.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        handle_json_response(response).await
    }

    /// Posts JSON to `path`, ignoring the response body.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or HTTP failure.
    pub async fn post_json_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.send(self.http.post(self.url(path)).json(body)).await?;
        handle_empty_response(response).await
    }

    /// Posts an empty body to `path`.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or HTTP failure.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(self.http.post(self.url(path))).await?;
        handle_empty_response(response).await
    }

    /// Patches `path` with a JSON body.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or HTTP failure.
    pub async fn patch_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self
            .send(self.http.patch(self.url(path)).json(body))
            .await?;
        handle_empty_response(response).await
    }

    /// Deletes the resource at `path`.
    ///
    /// # Errors
    /// Returns `ApiError` on transport, authorization, or HTTP failure.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.send(self.http.delete(self.url(path))).await?;
        handle_empty_response(response).await
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Request phase: attach the bearer token when one is stored. Response
    /// phase: a 401/403 clears the session and redirects to login before the
    /// error is returned, so "session expired" is detected exactly once here.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        debug!("response status: {status}");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("authorization failure ({status}), clearing session");
            self.session.clear_token();
            self.navigator.goto(Route::Login { from: None });
            return Err(ApiError::Authorization {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ApiError> {
    let url = Url::parse(base_url)
        .map_err(|err| ApiError::Config(format!("Error parsing base URL: {err}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ApiError::Config(format!(
                "Error parsing base URL: unsupported scheme {scheme}"
            )))
        }
    }

    if url.host().is_none() {
        return Err(ApiError::Config(
            "Error parsing base URL: no host specified".to_string(),
        ));
    }

    Ok(())
}

async fn handle_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(body),
        })
    }
}

async fn handle_empty_response(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_base_url, ApiClient, ApiError};
    use crate::auth::guards::{MemoryNavigator, Navigator, Route};
    use crate::auth::state::SessionStore;
    use crate::config::AppConfig;
    use secrecy::SecretString;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> AppConfig {
        AppConfig::new(base_url, "http://identity.test", "key", PathBuf::new())
    }

    fn client_with(
        base_url: &str,
        session: Arc<SessionStore>,
        navigator: Arc<MemoryNavigator>,
    ) -> ApiClient {
        ApiClient::new(&test_config(base_url), session, navigator).unwrap()
    }

    #[test]
    fn base_url_must_be_http_with_host() {
        assert!(validate_base_url("https://api.servesync.dev").is_ok());
        assert!(validate_base_url("ftp://api.servesync.dev").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer-posts"))
            .and(header("Authorization", "Bearer sekret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(SessionStore::in_memory());
        session.set_token(SecretString::from("sekret".to_string()));
        let client = client_with(&server.uri(), session, Arc::new(MemoryNavigator::new()));

        let posts: Vec<serde_json::Value> = client.get_json("/volunteer-posts").await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_response_clears_session_and_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer-posts/user/a@x.com"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = Arc::new(SessionStore::in_memory());
        session.set_token(SecretString::from("stale".to_string()));
        let navigator = Arc::new(MemoryNavigator::new());
        let client = client_with(&server.uri(), Arc::clone(&session), Arc::clone(&navigator));

        let result: Result<Vec<serde_json::Value>, ApiError> =
            client.get_json("/volunteer-posts/user/a@x.com").await;

        // The caller still observes the failure.
        assert_eq!(result.unwrap_err(), ApiError::Authorization { status: 401 });
        assert!(session.token().is_none());
        assert_eq!(navigator.current(), Some(Route::Login { from: None }));
    }

    #[tokio::test]
    async fn timeout_is_a_network_error_and_keeps_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volunteer-posts"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let session = Arc::new(SessionStore::in_memory());
        session.set_token(SecretString::from("still-here".to_string()));
        let navigator = Arc::new(MemoryNavigator::new());

        let mut config = test_config(&server.uri());
        config.timeout = Duration::from_millis(200);
        let client =
            ApiClient::new(
                &config,
                Arc::clone(&session),
                Arc::clone(&navigator) as Arc<dyn Navigator>,
            )
            .unwrap();

        let result: Result<Vec<serde_json::Value>, ApiError> =
            client.get_json("/volunteer-posts").await;

        assert!(result.unwrap_err().is_network());
        assert!(session.token().is_some());
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn http_errors_surface_a_sanitized_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/volunteer-posts"))
            .respond_with(ResponseTemplate::new(500).set_body_string("  boom  "))
            .mount(&server)
            .await;

        let client = client_with(
            &server.uri(),
            Arc::new(SessionStore::in_memory()),
            Arc::new(MemoryNavigator::new()),
        );

        let result = client.post_json_unit("/volunteer-posts", &json!({})).await;
        assert_eq!(
            result.unwrap_err(),
            ApiError::Http {
                status: 500,
                message: "boom".to_string()
            }
        );
    }
}
