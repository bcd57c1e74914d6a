//! Session bootstrap and guarded navigation.
//!
//! Flow overview:
//! - the [`bridge::IdentityBridge`] wraps the identity provider and emits
//!   epoch-stamped identity changes, starting with the restored identity;
//! - the [`bootstrap::SessionBootstrap`] subscribes once, upserting the user
//!   profile and minting one token per emission (stale mints discarded), or
//!   clearing the token and logging out on sign-out;
//! - the [`state::SessionStore`] holds the persisted bearer token read by the
//!   request pipeline;
//! - the [`guards::RouteGuard`] verifies identity and token before a
//!   protected view renders, redirecting to login with the requested route.

pub mod bootstrap;
pub mod bridge;
pub mod client;
pub mod guards;
pub mod provider;
pub mod state;
pub mod token;
pub mod types;
