//! Redirect intents and the channel carrying them to the navigator.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// Why a navigation was redirected to the login route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectReason {
    SessionExpired,
}

impl RedirectReason {
    /// Tag carried in the login location's `error` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
        }
    }
}

impl std::fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A navigation the router should perform: go to `target`, remembering
/// where the user was headed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    pub target: String,
    pub redirect_target: Option<String>,
    pub reason: Option<RedirectReason>,
}

impl NavigationIntent {
    /// Redirect to login because no credential is held.
    pub fn login(login_route: impl Into<String>, redirect_target: impl Into<String>) -> Self {
        Self {
            target: login_route.into(),
            redirect_target: Some(redirect_target.into()),
            reason: None,
        }
    }

    /// Redirect to login because the held credential was rejected.
    pub fn session_expired(
        login_route: impl Into<String>,
        redirect_target: impl Into<String>,
    ) -> Self {
        Self {
            reason: Some(RedirectReason::SessionExpired),
            ..Self::login(login_route, redirect_target)
        }
    }

    /// Router location, e.g. `/login?redirect=%2Fconfigs&error=session_expired`.
    pub fn location(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(redirect) = &self.redirect_target {
            query.append_pair("redirect", redirect);
        }
        if let Some(reason) = self.reason {
            query.append_pair("error", reason.as_str());
        }
        let query = query.finish();

        if query.is_empty() {
            self.target.clone()
        } else {
            format!("{}?{}", self.target, query)
        }
    }
}

/// Sending half of the redirect channel, held by envelope interpreters.
#[derive(Debug, Clone)]
pub struct RedirectSender(mpsc::UnboundedSender<NavigationIntent>);

impl RedirectSender {
    /// Announce a redirect. Dropped silently when nobody is listening.
    pub fn emit(&self, intent: NavigationIntent) {
        if self.0.send(intent).is_err() {
            debug!("redirect intent dropped: no navigator listening");
        }
    }
}

/// Receiving half of the redirect channel, owned by the navigator.
#[derive(Debug)]
pub struct RedirectReceiver(mpsc::UnboundedReceiver<NavigationIntent>);

impl RedirectReceiver {
    /// Next queued intent without waiting.
    pub fn try_next(&mut self) -> Option<NavigationIntent> {
        self.0.try_recv().ok()
    }

    /// Wait for the next intent. `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<NavigationIntent> {
        self.0.recv().await
    }
}

/// Create a connected redirect channel.
pub fn redirect_channel() -> (RedirectSender, RedirectReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RedirectSender(tx), RedirectReceiver(rx))
}

/// Shared handle on the route the user is currently viewing.
#[derive(Debug, Clone)]
pub struct CurrentRoute(Arc<RwLock<String>>);

impl CurrentRoute {
    pub fn new(initial: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(initial.into())))
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }

    pub fn set(&self, location: impl Into<String>) {
        *self.0.write() = location.into();
    }

    /// Path part of the current location, without the query string.
    pub fn path(&self) -> String {
        let location = self.0.read();
        location
            .split_once('?')
            .map(|(path, _)| path.to_string())
            .unwrap_or_else(|| location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_for_session_expired() {
        let intent = NavigationIntent::session_expired("/login", "/dashboard");
        assert_eq!(
            intent.location(),
            "/login?redirect=%2Fdashboard&error=session_expired"
        );
    }

    #[test]
    fn test_location_without_reason() {
        let intent = NavigationIntent::login("/login", "/configs/site name");
        assert_eq!(intent.location(), "/login?redirect=%2Fconfigs%2Fsite+name");
    }

    #[test]
    fn test_location_bare() {
        let intent = NavigationIntent {
            target: "/login".to_string(),
            redirect_target: None,
            reason: None,
        };
        assert_eq!(intent.location(), "/login");
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (tx, mut rx) = redirect_channel();
        tx.emit(NavigationIntent::login("/login", "/a"));
        tx.emit(NavigationIntent::login("/login", "/b"));

        assert_eq!(rx.try_next().unwrap().redirect_target.as_deref(), Some("/a"));
        assert_eq!(rx.try_next().unwrap().redirect_target.as_deref(), Some("/b"));
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn test_emit_without_receiver_does_not_panic() {
        let (tx, rx) = redirect_channel();
        drop(rx);
        tx.emit(NavigationIntent::login("/login", "/a"));
    }

    #[test]
    fn test_current_route_path_strips_query() {
        let route = CurrentRoute::new("/login?redirect=%2F");
        assert_eq!(route.path(), "/login");
        route.set("/configs");
        assert_eq!(route.path(), "/configs");
    }
}
