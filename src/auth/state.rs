//! Persisted session state. One storage slot holds the current bearer token:
//! in memory behind a lock, mirrored to a single private file so the session
//! survives restarts. Writes are full replacements; the on-disk mirror is
//! written to a temporary file and renamed so a reader never observes a
//! half-written token.

use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Holder of the persisted bearer token.
///
/// Written by the token exchange and by the request pipeline's
/// authorization-failure handler; read by every outgoing request.
#[derive(Debug)]
pub struct SessionStore {
    token: RwLock<Option<SecretString>>,
    token_file: Option<PathBuf>,
}

impl SessionStore {
    /// Store without a disk mirror, for tests and ephemeral sessions.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            token: RwLock::new(None),
            token_file: None,
        }
    }

    /// Opens the store backed by `token_file`, restoring any persisted token.
    /// An absent or empty file means unauthenticated.
    #[must_use]
    pub fn open(token_file: PathBuf) -> Self {
        let token = load_token(&token_file);
        Self {
            token: RwLock::new(token),
            token_file: Some(token_file),
        }
    }

    /// Current token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token()
            .is_some_and(|token| !token.expose_secret().is_empty())
    }

    /// Replaces the stored token. A new value fully overwrites the previous
    /// one; partial states never occur.
    pub fn set_token(&self, token: SecretString) {
        {
            let mut slot = self
                .token
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *slot = Some(token.clone());
        }
        if let Some(path) = &self.token_file {
            persist_token(path, &token);
        }
        debug!("session token replaced");
    }

    /// Removes the stored token unconditionally. Idempotent.
    pub fn clear_token(&self) {
        {
            let mut slot = self
                .token
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *slot = None;
        }
        if let Some(path) = &self.token_file {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Error removing token file: {err}");
                }
            }
        }
        debug!("session token cleared");
    }
}

fn load_token(path: &Path) -> Option<SecretString> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let trimmed = contents.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(SecretString::from(trimmed.to_string()))
            }
        }
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!("Error reading token file: {err}");
            }
            None
        }
    }
}

/// Atomic replace: write a sibling temp file, restrict permissions, rename.
fn persist_token(path: &Path, token: &SecretString) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("Error creating token directory: {err}");
                return;
            }
        }
    }

    let tmp = path.with_extension("tmp");
    if let Err(err) = fs::write(&tmp, token.expose_secret()) {
        warn!("Error writing token file: {err}");
        return;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)) {
            warn!("Error restricting token file permissions: {err}");
        }
    }

    if let Err(err) = fs::rename(&tmp, path) {
        warn!("Error replacing token file: {err}");
    }
}
