//! The identity bridge adapts the external provider to the application: one
//! process-wide, strictly ordered stream of identity changes, plus the
//! sign-in/sign-out operations that feed it. Every emission carries a
//! monotonically increasing epoch so downstream work (token minting) can be
//! keyed to the identity that triggered it and discarded when stale.

use crate::auth::provider::{IdentityError, IdentityProvider};
use crate::auth::types::Identity;
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// One emission on the identity-change stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityChange {
    /// Monotonic per-process counter; epoch 0 is the startup emission.
    pub epoch: u64,
    pub identity: Option<Identity>,
}

/// Wraps the identity provider and owns the identity-change stream.
pub struct IdentityBridge {
    provider: Arc<dyn IdentityProvider>,
    changes: watch::Sender<IdentityChange>,
}

impl IdentityBridge {
    /// Builds the bridge, seeding the stream with the identity the provider
    /// restores at startup (possibly absent). Subscribers observe this
    /// initial value before any further change.
    pub async fn init(provider: Arc<dyn IdentityProvider>) -> Self {
        let identity = provider.current_identity().await;
        debug!(restored = identity.is_some(), "identity bridge initialized");
        let (changes, _) = watch::channel(IdentityChange { epoch: 0, identity });
        Self { provider, changes }
    }

    /// Subscribes to identity changes. The receiver yields the current value
    /// immediately and every subsequent emission in order.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IdentityChange> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.changes.borrow().identity.clone()
    }

    /// Epoch of the most recent emission. A mint keyed to an older epoch is
    /// stale and must be discarded.
    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        self.changes.borrow().epoch
    }

    /// # Errors
    /// Returns `IdentityError` on duplicate email, weak credentials, or
    /// provider/network failure.
    #[instrument(skip(self, password))]
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &SecretString,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<(Identity, u64), IdentityError> {
        let identity = self
            .provider
            .register_with_password(email, password, display_name, photo_url)
            .await?;
        let epoch = self.emit(Some(identity.clone()));
        Ok((identity, epoch))
    }

    /// # Errors
    /// Returns `IdentityError::InvalidCredentials` for rejected credentials,
    /// distinctly from other failures.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(Identity, u64), IdentityError> {
        let identity = self
            .provider
            .sign_in_with_password(email, password)
            .await?;
        let epoch = self.emit(Some(identity.clone()));
        Ok((identity, epoch))
    }

    /// # Errors
    /// Returns `IdentityError::ProviderCancelled` when the user abandons the
    /// provider-controlled flow.
    #[instrument(skip(self, assertion))]
    pub async fn sign_in_federated(
        &self,
        assertion: &str,
    ) -> Result<(Identity, u64), IdentityError> {
        let identity = self.provider.sign_in_federated(assertion).await?;
        let epoch = self.emit(Some(identity.clone()));
        Ok((identity, epoch))
    }

    /// Signs out. The identity is cleared and the sign-out emitted even if
    /// the provider-side sign-out fails; never fails for "already signed out".
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> u64 {
        if let Err(err) = self.provider.sign_out().await {
            warn!("Error signing out of identity provider: {err}");
        }
        self.emit(None)
    }

    fn emit(&self, identity: Option<Identity>) -> u64 {
        let mut epoch = 0;
        self.changes.send_modify(|change| {
            change.epoch += 1;
            change.identity = identity;
            epoch = change.epoch;
        });
        debug!("identity change emitted, epoch {epoch}");
        epoch
    }
}
