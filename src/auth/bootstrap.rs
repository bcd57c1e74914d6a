//! Session bootstrap: the one process-wide subscriber to the identity-change
//! stream. Each emission with an identity triggers the idempotent profile
//! upsert followed by exactly one token mint keyed to that emission's epoch;
//! each emission without an identity tells the backend to drop its
//! server-side session (best effort, while the token is still attached) and
//! then clears the token unconditionally. Interactive flows await the settled
//! epoch of their own emission instead of minting a second time.
//!
//! The subscription is a watch channel, so emissions arriving while one is
//! being processed coalesce: only the latest identity is acted on. A rapid
//! sign-in followed by sign-out may therefore skip the sign-in's mint
//! entirely; the final state still matches the latest emission.

use crate::api::ApiClient;
use crate::auth::bridge::{IdentityBridge, IdentityChange};
use crate::auth::client;
use crate::auth::token::TokenExchange;
use crate::auth::types::UserRecord;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to the running bootstrap task. Dropping it stops the subscription.
pub struct SessionBootstrap {
    task: JoinHandle<()>,
    settled: watch::Receiver<Option<u64>>,
}

impl SessionBootstrap {
    /// Spawns the bootstrap task. The startup emission (the identity the
    /// provider restored, possibly absent) is processed first, so a restored
    /// session re-mints its token and an absent one is cleared.
    #[must_use]
    pub fn spawn(bridge: Arc<IdentityBridge>, api: Arc<ApiClient>) -> Self {
        let exchange = TokenExchange::new(Arc::clone(&bridge), Arc::clone(&api));
        let (settled_tx, settled) = watch::channel(None);
        let mut changes = bridge.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let change = changes.borrow_and_update().clone();
                process_change(&api, &exchange, &change).await;
                let _ = settled_tx.send(Some(change.epoch));

                if changes.changed().await.is_err() {
                    debug!("identity bridge dropped, stopping session bootstrap");
                    break;
                }
            }
        });

        Self { task, settled }
    }

    /// Waits until the emission with `epoch` (or a later one) has been fully
    /// processed: its mint settled or its sign-out clear completed.
    pub async fn settled(&self, epoch: u64) {
        let mut settled = self.settled.clone();
        let _ = settled
            .wait_for(|processed| processed.is_some_and(|e| e >= epoch))
            .await;
    }
}

impl Drop for SessionBootstrap {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn process_change(api: &ApiClient, exchange: &TokenExchange, change: &IdentityChange) {
    match &change.identity {
        Some(identity) => {
            // Profile upsert is tolerant: "already exists" is success inside
            // upsert_user, and anything else must not block the mint.
            if let Err(err) = client::upsert_user(api, &UserRecord::from_identity(identity)).await {
                warn!("Error saving user profile: {err}");
            }

            if let Err(err) = exchange.mint(&identity.email, change.epoch).await {
                warn!("Error minting session token: {err}");
            }
        }
        None => {
            // Logout goes out first so the request still carries the bearer
            // token and the backend can tell whose session to drop. The
            // client-side clear is unconditional either way; a 401 on the
            // logout already cleared the token through the pipeline.
            if let Err(err) = client::logout(api).await {
                debug!("Error clearing server-side session: {err}");
            }
            exchange.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionBootstrap;
    use crate::api::ApiClient;
    use crate::auth::bridge::tests::FakeProvider;
    use crate::auth::bridge::IdentityBridge;
    use crate::auth::guards::MemoryNavigator;
    use crate::auth::state::SessionStore;
    use crate::config::AppConfig;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Harness {
        bridge: Arc<IdentityBridge>,
        session: Arc<SessionStore>,
        bootstrap: SessionBootstrap,
    }

    async fn harness(server: &MockServer) -> Harness {
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
        let bootstrap = SessionBootstrap::spawn(Arc::clone(&bridge), api);
        Harness {
            bridge,
            session,
            bootstrap,
        }
    }

    async fn mount_defaults(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(204))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sign_in_mints_and_stores_a_token() {
        let server = MockServer::start().await;
        mount_defaults(&server).await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "minted"})))
            .expect(1)
            .mount(&server)
            .await;

        let harness = harness(&server).await;
        let password = SecretString::from("pw".to_string());
        let (_, epoch) = harness
            .bridge
            .sign_in_with_password("a@x.com", &password)
            .await
            .unwrap();
        harness.bootstrap.settled(epoch).await;

        assert_eq!(harness.session.token().unwrap().expose_secret(), "minted");
    }

    #[tokio::test]
    async fn sign_out_clears_the_token_even_if_logout_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "minted"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .mount(&server)
            .await;

        let harness = harness(&server).await;
        let password = SecretString::from("pw".to_string());
        let (_, epoch) = harness
            .bridge
            .sign_in_with_password("a@x.com", &password)
            .await
            .unwrap();
        harness.bootstrap.settled(epoch).await;
        assert!(harness.session.token().is_some());

        let epoch = harness.bridge.sign_out().await;
        harness.bootstrap.settled(epoch).await;
        assert!(harness.session.token().is_none());
    }

    #[tokio::test]
    async fn logout_carries_the_session_token_before_the_clear() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-x"})))
            .mount(&server)
            .await;
        // The backend can only drop the right session if the logout request
        // still carries the bearer token.
        Mock::given(method("POST"))
            .and(path("/logout"))
            .and(header("Authorization", "Bearer jwt-x"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let harness = harness(&server).await;
        let password = SecretString::from("pw".to_string());
        let (_, epoch) = harness
            .bridge
            .sign_in_with_password("a@x.com", &password)
            .await
            .unwrap();
        harness.bootstrap.settled(epoch).await;

        let epoch = harness.bridge.sign_out().await;
        harness.bootstrap.settled(epoch).await;

        assert!(harness.session.token().is_none());
        server.verify().await;
    }

    #[tokio::test]
    async fn slow_mint_resolving_after_sign_out_is_discarded() {
        let server = MockServer::start().await;
        mount_defaults(&server).await;
        Mock::given(method("POST"))
            .and(path("/jwt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"token": "late"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let harness = harness(&server).await;
        let password = SecretString::from("pw".to_string());
        let (_, _) = harness
            .bridge
            .sign_in_with_password("a@x.com", &password)
            .await
            .unwrap();
        // Sign out while the mint for a@x.com is still in flight.
        let signed_out = harness.bridge.sign_out().await;
        harness.bootstrap.settled(signed_out).await;

        assert!(harness.session.token().is_none());
    }
}
