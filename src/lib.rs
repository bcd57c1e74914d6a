//! Client library for the Serve Sync volunteer opportunity platform.
//!
//! The core of this crate is the session bootstrap protocol: the
//! [`auth::bridge::IdentityBridge`] adapts the external identity provider and
//! emits epoch-stamped identity changes, the [`auth::token::TokenExchange`]
//! converts each verified identity into a backend-issued bearer token, the
//! shared [`api::ApiClient`] attaches the persisted token to every request and
//! handles authorization failures in one place, and the
//! [`auth::guards::RouteGuard`] gates protected views on a fresh token
//! verification. Everything else (volunteer posts, applications) consumes the
//! same pipeline.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod posts;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub(crate) mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Short git commit hash recorded at build time, or "unknown" outside a checkout.
pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH_SHORT {
    Some(hash) => hash,
    None => "unknown",
};
