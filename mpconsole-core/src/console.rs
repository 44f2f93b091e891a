//! Wiring of the request pipeline, the session and the navigator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::auth::SessionGrant;
use crate::client::ApiClient;
use crate::config::ConsoleConfig;
use crate::envelope::{DecodePolicy, EnvelopeInterpreter};
use crate::error::{ClassifiedError, ConsoleError};
use crate::guard::{
    redirect_channel, CurrentRoute, NavigationGuard, RouteError, RouteMeta, RouteTable,
};
use crate::navigator::{Navigation, Navigator};
use crate::session::{create_session_store, SharedSessionStore};
use crate::transport::HttpTransport;

/// A fully wired console client.
///
/// The [`ApiClient`], the navigation guard and the navigator share one
/// session store and one current-route handle.
pub struct Console {
    client: Arc<ApiClient>,
    navigator: Navigator<Arc<ApiClient>>,
    config: ConsoleConfig,
}

impl Console {
    /// Build a console using the session backend named in `config`.
    pub fn from_config(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let session = create_session_store(config.session_backend, config.session_file.clone());
        Self::with_session(config, session)
    }

    /// Build a console around an existing session store.
    pub fn with_session(
        config: ConsoleConfig,
        session: SharedSessionStore,
    ) -> Result<Self, ConsoleError> {
        config.validate()?;

        let (redirects, receiver) = redirect_channel();
        let location = CurrentRoute::new(config.home_route.as_str());

        let transport = HttpTransport::new(&config.base_url, config.timeout(), session.clone())?;
        let interpreter = EnvelopeInterpreter::new(
            session.clone(),
            redirects,
            location.clone(),
            config.login_route.as_str(),
        )
        .with_policy(DecodePolicy {
            http_401_expires_session: config.http_401_expires_session,
        });
        let client = Arc::new(ApiClient::new(Arc::new(transport), interpreter));

        let guard = NavigationGuard::new(
            console_routes(&config.login_route)?,
            session,
            client.clone(),
            config.login_route.as_str(),
        );
        let navigator = Navigator::new(guard, location, receiver, config.home_route.as_str());

        debug!(base_url = %config.base_url, "console ready");
        Ok(Self {
            client,
            navigator,
            config,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn navigator(&self) -> &Navigator<Arc<ApiClient>> {
        &self.navigator
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Log in and continue to where the user was headed.
    ///
    /// The user's permissions are loaded for route checks; if that lookup
    /// fails, permission checks are skipped rather than failing the login.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(SessionGrant, Navigation), ClassifiedError> {
        let grant = self.client.login(username, password).await?;

        match self.client.current_user().await {
            Ok(user) => self.navigator.set_permissions(Some(user.permission_set())),
            Err(e) => {
                debug!("could not load permissions after login: {}", e);
                self.navigator.set_permissions(None);
            }
        }

        let navigation = self.navigator.after_login().await;
        Ok((grant, navigation))
    }

    /// Log out and return to the login route.
    pub async fn logout(&self) -> Result<(), ClassifiedError> {
        let result = self.client.logout().await;
        self.navigator.set_permissions(None);
        self.navigator.navigate(&self.config.login_route).await;
        info!(location = %self.navigator.location(), "signed out");
        result
    }
}

/// Console routes with `login_route` enterable without a session.
///
/// A login route that collides with a declared route is rejected; guarding
/// it would redirect the login screen to itself.
fn console_routes(login_route: &str) -> Result<RouteTable, RouteError> {
    let mut routes = RouteTable::console();
    if routes.resolve(login_route).requires_auth {
        routes.add(RouteMeta::public(login_route, "Login"))?;
    }
    Ok(routes)
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("client", &self.client)
            .field("navigator", &self.navigator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_login_route_kept() {
        let routes = console_routes("/login").unwrap();
        assert_eq!(routes.routes().len(), RouteTable::console().routes().len());
        assert!(!routes.resolve("/login").requires_auth);
    }

    #[test]
    fn test_custom_login_route_is_public() {
        let routes = console_routes("/signin").unwrap();
        let route = routes.resolve("/signin?redirect=%2Fconfigs");
        assert!(!route.requires_auth);
        assert_eq!(route.name, "Login");
    }

    #[test]
    fn test_login_route_colliding_with_protected_route_rejected() {
        assert!(matches!(
            console_routes("/configs"),
            Err(RouteError::Duplicate { .. })
        ));
    }
}
