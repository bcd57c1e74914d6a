//! Volunteer-need posts and applications: wire types, resource clients, and
//! the debounced search used by the browse view.

pub mod client;
pub mod types;

use crate::api::{ApiClient, ApiError};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use types::VolunteerPost;

/// Quiet period before a search term is sent to the backend.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// One search request: an empty or blank term falls back to the full listing,
/// matching the browse view's behavior.
///
/// # Errors
/// Returns `ApiError` on transport, authorization, or decoding failure; the
/// caller offers a scoped retry rather than reloading everything.
pub async fn search(api: &ApiClient, term: &str) -> Result<Vec<VolunteerPost>, ApiError> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        client::list_posts(api).await
    } else {
        client::search_posts(api, trimmed).await
    }
}

/// Coalesces keystroke-driven work: each submission cancels the previous
/// pending one, and only a submission that survives the quiet period runs.
///
/// This is a facility for interactive frontends embedding the crate, where
/// [`search`] runs once per keystroke. One-shot callers (the bundled CLI,
/// scripts) have a single term and call [`search`] directly.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedules `work` after the quiet period, superseding any pending work.
    pub fn submit<F, Fut>(&self, work: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let delay = self.delay;
        let task = tokio::spawn(async move {
            sleep(delay).await;
            work().await;
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Cancels any pending work, for view teardown.
    pub fn cancel(&self) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
