//! Route guarding for protected views. A [`RouteGuard`] resolution walks the
//! Pending -> Verifying -> Authorized/Denied state machine for one navigation
//! attempt: identity must be present and the persisted token must still be
//! accepted by the backend, otherwise the navigator is redirected to the login
//! route carrying the originally requested location. Dropping the resolution
//! future cancels the in-flight verification.

use crate::api::ApiClient;
use crate::auth::bridge::IdentityBridge;
use crate::auth::client;
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Application routes, mirroring the views of the web client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login { from: Option<Box<Route>> },
    Register,
    AllPosts,
    PostDetails(String),
    AddPost,
    ManageMyPosts,
    MyApplications,
    NotFound,
}

impl Route {
    /// Login route remembering where the user was headed.
    #[must_use]
    pub fn login_from(requested: Route) -> Self {
        Self::Login {
            from: Some(Box::new(requested)),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login { .. } => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::AllPosts => "/all-volunteer-posts".to_string(),
            Self::PostDetails(id) => format!("/volunteer-posts/{id}"),
            Self::AddPost => "/add-volunteer-post".to_string(),
            Self::ManageMyPosts => "/manage-my-posts".to_string(),
            Self::MyApplications => "/my-applications".to_string(),
            Self::NotFound => "/not-found".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path())
    }
}

/// Navigation sink shared by the request pipeline and the route guard.
pub trait Navigator: Send + Sync {
    fn goto(&self, route: Route);
}

/// In-memory navigator recording visited routes; the headless stand-in for
/// the browser's location. The last login redirect's `from` field is kept as
/// the post-login return path.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently visited route.
    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.lock().last().cloned()
    }

    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.lock().clone()
    }

    /// Takes the return path recorded by the latest login redirect, if any.
    #[must_use]
    pub fn take_return_path(&self) -> Option<Route> {
        let mut history = self.lock();
        for index in (0..history.len()).rev() {
            if let Route::Login { from } = &mut history[index] {
                return from.take().map(|route| *route);
            }
        }
        None
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Route>> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Navigator for MemoryNavigator {
    fn goto(&self, route: Route) {
        debug!("navigating to {route}");
        self.lock().push(route);
    }
}

/// Guard resolution states for a single navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Identity and token validity are both unknown; nothing renders.
    Pending,
    /// Identity present; token verification in flight.
    Verifying,
    /// Identity present and token confirmed; protected children may render.
    Authorized,
    /// No identity, or token rejected, or verification not confirmed.
    Denied,
}

/// Gate deciding whether a protected view may render.
pub struct RouteGuard {
    bridge: Arc<IdentityBridge>,
    api: Arc<ApiClient>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<GuardState>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(
        bridge: Arc<IdentityBridge>,
        api: Arc<ApiClient>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(GuardState::Pending);
        Self {
            bridge,
            api,
            navigator,
            state,
        }
    }

    /// Observable guard state; updates stop once the guard is dropped.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Resolves one navigation attempt to `requested`.
    ///
    /// A denial redirects to the login route carrying `requested` so a later
    /// successful login can return there. Verification failures of any kind,
    /// network errors included, deny rather than grant.
    pub async fn resolve(&self, requested: Route) -> GuardState {
        self.state.send_replace(GuardState::Pending);

        if self.bridge.current_identity().is_none() {
            debug!("no identity present, denying {requested}");
            return self.deny(requested);
        }

        self.state.send_replace(GuardState::Verifying);

        let confirmed = match client::verify_token(&self.api).await {
            Ok(valid) => valid,
            Err(err) => {
                warn!("token verification not confirmed: {err}");
                false
            }
        };

        if confirmed {
            self.state.send_replace(GuardState::Authorized);
            GuardState::Authorized
        } else {
            self.deny(requested)
        }
    }

    fn deny(&self, requested: Route) -> GuardState {
        self.state.send_replace(GuardState::Denied);
        self.navigator.goto(Route::login_from(requested));
        GuardState::Denied
    }
}
