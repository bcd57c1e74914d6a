use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub identity_url: String,
    pub identity_key: String,
    pub token_file: PathBuf,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error when a required connection argument is missing from
    /// both the command line and the environment.
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            api_url: matches
                .get_one::<String>("api-url")
                .cloned()
                .context("missing required argument: --api-url")?,
            identity_url: matches
                .get_one::<String>("identity-url")
                .cloned()
                .context("missing required argument: --identity-url")?,
            identity_key: matches
                .get_one::<String>("identity-key")
                .cloned()
                .context("missing required argument: --identity-key")?,
            token_file: matches
                .get_one::<PathBuf>("token-file")
                .cloned()
                .unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> AppConfig {
        AppConfig::new(
            &self.api_url,
            &self.identity_url,
            &self.identity_key,
            self.token_file.clone(),
        )
    }
}
