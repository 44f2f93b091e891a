//! Applies guard decisions and redirect intents to the current route.
//!
//! The [`Navigator`] is the only component that moves the user. Envelope
//! interpreters and the guard only describe where the user should go; the
//! navigator decides whether that still makes sense and updates the
//! [`CurrentRoute`].

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::guard::{
    CurrentRoute, GuardOutcome, NavigationGuard, NavigationIntent, PermissionSet,
    RedirectReceiver, RouteMeta, SessionVerifier,
};

/// What happened to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The route was entered; `location` is now current.
    Entered { route: RouteMeta, location: String },
    /// The user was sent to the login route instead.
    Redirected(NavigationIntent),
    /// Signed in, but the user lacks the route's permissions.
    Forbidden { route: RouteMeta },
    /// A newer navigation took over; nothing changed.
    Ignored,
}

pub struct Navigator<V> {
    guard: NavigationGuard<V>,
    location: CurrentRoute,
    redirects: Mutex<RedirectReceiver>,
    pending_destination: RwLock<Option<String>>,
    permissions: RwLock<Option<PermissionSet>>,
    home_route: String,
}

impl<V: SessionVerifier> Navigator<V> {
    /// `location` must be the handle the envelope interpreters read from, and
    /// `redirects` the receiver paired with their sender.
    pub fn new(
        guard: NavigationGuard<V>,
        location: CurrentRoute,
        redirects: RedirectReceiver,
        home_route: impl Into<String>,
    ) -> Self {
        Self {
            guard,
            location,
            redirects: Mutex::new(redirects),
            pending_destination: RwLock::new(None),
            permissions: RwLock::new(None),
            home_route: home_route.into(),
        }
    }

    pub fn guard(&self) -> &NavigationGuard<V> {
        &self.guard
    }

    /// Location the user is currently on, including any query string.
    pub fn location(&self) -> String {
        self.location.get()
    }

    /// Destination to resume after the next login.
    pub fn pending_destination(&self) -> Option<String> {
        self.pending_destination.read().clone()
    }

    /// Set the signed-in user's permissions. `None` skips permission checks.
    pub fn set_permissions(&self, permissions: Option<PermissionSet>) {
        *self.permissions.write() = permissions;
    }

    /// Navigate to `target`, running the guard first.
    pub async fn navigate(&self, target: &str) -> Navigation {
        let decision = self.guard.navigate(target).await;

        match decision.outcome {
            GuardOutcome::Superseded => Navigation::Ignored,
            GuardOutcome::Redirect(intent) => {
                self.apply_redirect(&intent);
                Navigation::Redirected(intent)
            }
            GuardOutcome::Allowed => {
                if self.guard.current_navigation() != Some(decision.navigation) {
                    return Navigation::Ignored;
                }
                let route = decision.route;
                if route.requires_auth && !self.permits(&route) {
                    info!(path = target, route = %route.name, "navigation forbidden");
                    return Navigation::Forbidden { route };
                }
                self.location.set(target);
                debug!(path = target, route = %route.name, "route entered");
                Navigation::Entered {
                    route,
                    location: target.to_string(),
                }
            }
        }
    }

    /// Apply redirect intents emitted by envelope interpreters.
    ///
    /// Returns the intent that moved the user, if any. Intents arriving while
    /// the user is already on the login route are dropped, so a burst of
    /// concurrent expiries produces a single redirect.
    pub fn process_redirects(&self) -> Option<NavigationIntent> {
        let mut receiver = self.redirects.lock();
        let mut applied = None;

        while let Some(intent) = receiver.try_next() {
            if self.location.path() == self.guard.login_route() {
                debug!(location = %intent.location(), "redirect coalesced");
                continue;
            }
            self.apply_redirect(&intent);
            applied = Some(intent);
        }
        applied
    }

    /// Continue to the remembered destination, or home, after a login.
    pub async fn after_login(&self) -> Navigation {
        let destination = self
            .pending_destination
            .write()
            .take()
            .unwrap_or_else(|| self.home_route.clone());
        self.navigate(&destination).await
    }

    fn permits(&self, route: &RouteMeta) -> bool {
        self.permissions
            .read()
            .as_ref()
            .is_none_or(|p| p.allows(route))
    }

    fn apply_redirect(&self, intent: &NavigationIntent) {
        let location = intent.location();
        info!(location = %location, "redirecting to login");

        *self.pending_destination.write() = intent.redirect_target.clone();
        *self.permissions.write() = None;
        self.location.set(location);
    }
}

impl<V> std::fmt::Debug for Navigator<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("location", &self.location.get())
            .field("home_route", &self.home_route)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClassifiedError, ErrorKind, ErrorSource};
    use crate::guard::{redirect_channel, RedirectSender, RouteTable};
    use crate::session::{Credential, MemorySessionStore, SessionStore, SharedSessionStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedVerifier(Result<(), ClassifiedError>);

    #[async_trait]
    impl SessionVerifier for FixedVerifier {
        async fn verify_session(&self) -> Result<(), ClassifiedError> {
            self.0.clone()
        }
    }

    fn navigator(
        token: Option<&str>,
        verdict: Result<(), ClassifiedError>,
    ) -> (Navigator<FixedVerifier>, SharedSessionStore, RedirectSender) {
        let session: SharedSessionStore = Arc::new(MemorySessionStore::new());
        if let Some(token) = token {
            session.set(Credential::new(token));
        }
        let (tx, rx) = redirect_channel();
        let guard = NavigationGuard::new(
            RouteTable::console(),
            session.clone(),
            FixedVerifier(verdict),
            "/login",
        );
        let navigator = Navigator::new(guard, CurrentRoute::new("/"), rx, "/");
        (navigator, session, tx)
    }

    #[tokio::test]
    async fn test_public_route_entered() {
        let (nav, _, _) = navigator(None, Ok(()));
        let result = nav.navigate("/login").await;
        assert!(matches!(result, Navigation::Entered { ref location, .. } if location == "/login"));
        assert_eq!(nav.location(), "/login");
    }

    #[tokio::test]
    async fn test_redirect_remembers_destination() {
        let (nav, session, _) = navigator(None, Ok(()));

        let result = nav.navigate("/configs").await;
        assert!(matches!(result, Navigation::Redirected(_)));
        assert_eq!(nav.location(), "/login?redirect=%2Fconfigs");
        assert_eq!(nav.pending_destination().as_deref(), Some("/configs"));

        session.set(Credential::new("T"));
        let result = nav.after_login().await;
        assert!(matches!(result, Navigation::Entered { ref location, .. } if location == "/configs"));
        assert_eq!(nav.pending_destination(), None);
    }

    #[tokio::test]
    async fn test_after_login_defaults_home() {
        let (nav, _, _) = navigator(Some("T"), Ok(()));
        let result = nav.after_login().await;
        assert!(matches!(result, Navigation::Entered { ref location, .. } if location == "/"));
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden() {
        let (nav, _, _) = navigator(Some("T"), Ok(()));
        nav.set_permissions(Some(PermissionSet::new(["message_task:view"])));

        let result = nav.navigate("/configs").await;
        assert!(matches!(result, Navigation::Forbidden { ref route } if route.name == "ConfigList"));
        assert_eq!(nav.location(), "/");

        let result = nav.navigate("/message-tasks").await;
        assert!(matches!(result, Navigation::Entered { .. }));
    }

    #[tokio::test]
    async fn test_failed_verification_redirects_with_reason() {
        let verdict = Err(ClassifiedError::new(
            ErrorKind::Network,
            None,
            ErrorSource::NoEnvelope,
        ));
        let (nav, session, _) = navigator(Some("T"), verdict);

        let result = nav.navigate("/dashboard").await;
        assert!(matches!(result, Navigation::Redirected(_)));
        assert_eq!(
            nav.location(),
            "/login?redirect=%2Fdashboard&error=session_expired"
        );
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_process_redirects_coalesces() {
        let (nav, _, tx) = navigator(Some("T"), Ok(()));
        tx.emit(NavigationIntent::session_expired("/login", "/configs"));
        tx.emit(NavigationIntent::session_expired("/login", "/configs"));
        tx.emit(NavigationIntent::session_expired("/login", "/message-tasks"));

        let applied = nav.process_redirects().unwrap();
        assert_eq!(applied.redirect_target.as_deref(), Some("/configs"));
        assert_eq!(
            nav.location(),
            "/login?redirect=%2Fconfigs&error=session_expired"
        );
        assert_eq!(nav.pending_destination().as_deref(), Some("/configs"));

        assert!(nav.process_redirects().is_none());
    }

    #[test]
    fn test_process_redirects_on_login_route_is_noop() {
        let (nav, _, tx) = navigator(None, Ok(()));
        nav.location.set("/login");
        tx.emit(NavigationIntent::session_expired("/login", "/login"));

        assert!(nav.process_redirects().is_none());
        assert_eq!(nav.location(), "/login");
    }
}
