//! Navigation guard for protected routes.
//!
//! This module provides:
//! - [`NavigationGuard`] - Per-navigation state machine deciding allow vs. redirect
//! - [`SessionVerifier`] - Trait for the backend call confirming a credential
//! - [`RouteTable`] / [`RouteMeta`] - Route declarations with auth metadata
//! - [`NavigationIntent`] and the redirect channel used to reach the navigator
//!
//! # State Machine
//!
//! ```text
//! Idle -> CheckingLocal -> Allowed
//!                       -> Redirecting            (no credential)
//!                       -> Verifying -> Allowed
//!                                    -> Redirecting (verification failed)
//! ```
//!
//! `Verifying` is the only state that waits. Every navigation gets a
//! [`NavigationId`]; when a newer navigation starts while an older one is
//! still verifying, the older one's outcome is discarded as
//! [`GuardOutcome::Superseded`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::ClassifiedError;
use crate::session::SharedSessionStore;

mod intent;
mod routes;

pub use intent::{
    redirect_channel, CurrentRoute, NavigationIntent, RedirectReason, RedirectReceiver,
    RedirectSender,
};
pub use routes::{PermissionSet, RouteError, RouteMeta, RouteTable, ADMIN_PERMISSION};

/// Confirms with the backend that the stored credential is still valid.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Succeeds iff the current credential is accepted.
    async fn verify_session(&self) -> Result<(), ClassifiedError>;
}

#[async_trait]
impl<V: SessionVerifier + ?Sized> SessionVerifier for Arc<V> {
    async fn verify_session(&self) -> Result<(), ClassifiedError> {
        (**self).verify_session().await
    }
}

/// Sequence number of a navigation attempt. Later navigations compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationId(u64);

impl NavigationId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NavigationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "nav#{}", self.0)
    }
}

/// State of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    CheckingLocal,
    Verifying,
    Allowed,
    Redirecting(NavigationIntent),
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Allowed | Self::Redirecting(_))
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::CheckingLocal => "CheckingLocal",
            Self::Verifying => "Verifying",
            Self::Allowed => "Allowed",
            Self::Redirecting(_) => "Redirecting",
        }
    }
}

/// Final result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Proceed to the target unmodified.
    Allowed,
    /// Go to the login route instead.
    Redirect(NavigationIntent),
    /// A newer navigation started; this result must not be applied.
    Superseded,
}

/// Outcome of [`NavigationGuard::navigate`] tied to its navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    pub navigation: NavigationId,
    pub target: String,
    pub route: RouteMeta,
    pub outcome: GuardOutcome,
}

/// Gate evaluated before entering a route.
pub struct NavigationGuard<V> {
    routes: RouteTable,
    session: SharedSessionStore,
    verifier: V,
    login_route: String,
    latest: AtomicU64,
    applied: RwLock<Option<GuardDecision>>,
}

impl<V: SessionVerifier> NavigationGuard<V> {
    pub fn new(
        routes: RouteTable,
        session: SharedSessionStore,
        verifier: V,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            routes,
            session,
            verifier,
            login_route: login_route.into(),
            latest: AtomicU64::new(0),
            applied: RwLock::new(None),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Most recent decision that was not superseded.
    pub fn last_applied(&self) -> Option<GuardDecision> {
        self.applied.read().clone()
    }

    /// Id of the newest navigation started so far.
    pub fn current_navigation(&self) -> Option<NavigationId> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(NavigationId(n)),
        }
    }

    /// Decide whether `target` may be entered.
    pub async fn navigate(&self, target: &str) -> GuardDecision {
        let id = NavigationId(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        let route = self.routes.resolve(target);

        let mut state = GuardState::Idle;
        self.transition(id, &mut state, GuardState::CheckingLocal);

        if !route.requires_auth {
            self.transition(id, &mut state, GuardState::Allowed);
        } else if self.session.get().is_none() {
            let intent = NavigationIntent::login(&self.login_route, target);
            self.transition(id, &mut state, GuardState::Redirecting(intent));
        } else {
            self.transition(id, &mut state, GuardState::Verifying);
            let verified = self.verifier.verify_session().await;

            if !self.is_current(id) {
                debug!(navigation = %id, path = target, "verification result discarded, navigation superseded");
                return GuardDecision {
                    navigation: id,
                    target: target.to_string(),
                    route,
                    outcome: GuardOutcome::Superseded,
                };
            }

            match verified {
                Ok(()) => self.transition(id, &mut state, GuardState::Allowed),
                Err(e) => {
                    info!(navigation = %id, path = target, "session verification failed: {}", e);
                    // The interpreter already cleared the store for SessionExpired.
                    if !e.is_session_expired() {
                        self.session.clear();
                    }
                    let intent = NavigationIntent::session_expired(&self.login_route, target);
                    self.transition(id, &mut state, GuardState::Redirecting(intent));
                }
            }
        }

        let outcome = match state {
            GuardState::Redirecting(intent) => GuardOutcome::Redirect(intent),
            _ => GuardOutcome::Allowed,
        };
        let decision = GuardDecision {
            navigation: id,
            target: target.to_string(),
            route,
            outcome,
        };
        self.apply(decision)
    }

    fn is_current(&self, id: NavigationId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.0
    }

    fn apply(&self, decision: GuardDecision) -> GuardDecision {
        let mut applied = self.applied.write();
        if !self.is_current(decision.navigation) {
            return GuardDecision {
                outcome: GuardOutcome::Superseded,
                ..decision
            };
        }
        *applied = Some(decision.clone());
        decision
    }

    fn transition(&self, id: NavigationId, state: &mut GuardState, next: GuardState) {
        debug_assert!(!state.is_terminal(), "transition out of terminal state");
        debug!(navigation = %id, from = state.name(), to = next.name(), "guard transition");
        *state = next;
    }
}

impl<V> std::fmt::Debug for NavigationGuard<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationGuard")
            .field("routes", &self.routes.routes().len())
            .field("login_route", &self.login_route)
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .finish()
    }
}
