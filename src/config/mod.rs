//! Client configuration for backend and identity-provider endpoints. Values
//! come from CLI flags or environment variables and are normalized before use
//! so trailing slashes and stray whitespace never leak into request URLs.
//! Configuration values are public; the bearer token is never stored here.

use std::path::PathBuf;
use std::time::Duration;

/// Fixed timeout applied to every backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Endpoint configuration for the Serve Sync client.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the Serve Sync backend API.
    pub api_base_url: String,
    /// Base URL of the external identity provider.
    pub identity_base_url: String,
    /// API key appended to identity-provider requests.
    pub identity_api_key: String,
    /// File holding the persisted bearer token; absent file means unauthenticated.
    pub token_file: PathBuf,
    /// Per-request timeout for backend calls.
    pub timeout: Duration,
}

impl AppConfig {
    /// File where the identity provider adapter keeps its restored user,
    /// next to the token file. This mirrors the provider SDK keeping its own
    /// session storage separate from the application's token slot.
    #[must_use]
    pub fn identity_state_file(&self) -> PathBuf {
        match self.token_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join("identity.json"),
            _ => PathBuf::from("identity.json"),
        }
    }

    #[must_use]
    pub fn new(
        api_base_url: &str,
        identity_base_url: &str,
        identity_api_key: &str,
        token_file: PathBuf,
    ) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            identity_base_url: normalize_base_url(identity_base_url),
            identity_api_key: identity_api_key.trim().to_string(),
            token_file,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Trims whitespace and trailing slashes so paths can be appended verbatim.
fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Joins a base URL and a path, tolerating slashes on either side.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::{join_url, normalize_base_url, AppConfig};
    use std::path::PathBuf;

    #[test]
    fn normalize_base_url_trims_and_strips_slash() {
        assert_eq!(
            normalize_base_url("  https://api.servesync.dev/ "),
            "https://api.servesync.dev"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(
            join_url("https://api.servesync.dev", "/jwt"),
            "https://api.servesync.dev/jwt"
        );
        assert_eq!(
            join_url("https://api.servesync.dev/", "jwt"),
            "https://api.servesync.dev/jwt"
        );
        assert_eq!(join_url("", "/jwt"), "/jwt");
    }

    #[test]
    fn identity_state_file_sits_next_to_the_token_file() {
        let config = AppConfig::new(
            "https://api.servesync.dev",
            "https://identity.example.com",
            "key",
            PathBuf::from("/home/ada/.config/serve-sync/token"),
        );
        assert_eq!(
            config.identity_state_file(),
            PathBuf::from("/home/ada/.config/serve-sync/identity.json")
        );
    }

    #[test]
    fn new_normalizes_fields() {
        let config = AppConfig::new(
            " https://api.servesync.dev/ ",
            "https://identity.example.com/v1/",
            " key-123 ",
            PathBuf::from("/tmp/token"),
        );

        assert_eq!(config.api_base_url, "https://api.servesync.dev");
        assert_eq!(config.identity_base_url, "https://identity.example.com/v1");
        assert_eq!(config.identity_api_key, "key-123");
        assert_eq!(config.timeout, super::REQUEST_TIMEOUT);
    }
}
