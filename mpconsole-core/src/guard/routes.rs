//! Route metadata consulted by the navigation guard.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission tag granting every route.
pub const ADMIN_PERMISSION: &str = "admin";

/// Error type for route declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Route patterns must be absolute.
    #[error("route pattern must start with '/': {pattern}")]
    InvalidPattern { pattern: String },

    /// The same pattern was declared twice.
    #[error("route declared twice: {pattern}")]
    Duplicate { pattern: String },
}

/// Metadata declared by a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Path pattern; segments starting with `:` match any single segment.
    pub pattern: String,
    /// Route name, for display.
    pub name: String,
    /// Whether entering the route needs a valid session.
    pub requires_auth: bool,
    /// Permission tags of which the user needs at least one.
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RouteMeta {
    pub fn public(pattern: &str, name: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            name: name.to_string(),
            requires_auth: false,
            permissions: Vec::new(),
        }
    }

    pub fn protected(pattern: &str, name: &str) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(pattern, name)
        }
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }

    fn matches(&self, path: &str) -> bool {
        let pattern = segments(&self.pattern);
        let path = segments(path);
        pattern.len() == path.len()
            && pattern
                .iter()
                .zip(&path)
                .all(|(p, s)| p.starts_with(':') || p == s)
    }

    fn is_static(&self) -> bool {
        !self.pattern.split('/').any(|s| s.starts_with(':'))
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// Ordered set of route declarations.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteMeta>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a route.
    pub fn add(&mut self, route: RouteMeta) -> Result<(), RouteError> {
        if !route.pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern {
                pattern: route.pattern,
            });
        }
        if self.routes.iter().any(|r| r.pattern == route.pattern) {
            return Err(RouteError::Duplicate {
                pattern: route.pattern,
            });
        }
        self.routes.push(route);
        Ok(())
    }

    /// The routes of the subscription admin console.
    pub fn console() -> Self {
        let routes = vec![
            RouteMeta::public("/login", "Login"),
            RouteMeta::protected("/", "Home"),
            RouteMeta::protected("/change-password", "ChangePassword"),
            RouteMeta::protected("/edit-user", "EditUser"),
            RouteMeta::protected("/add-subscription", "AddSubscription"),
            RouteMeta::protected("/wechat/mp", "WeChatMpManagement")
                .with_permissions(&["wechat:manage"]),
            RouteMeta::protected("/configs", "ConfigList").with_permissions(&["config:view"]),
            RouteMeta::protected("/configs/:key", "ConfigDetail")
                .with_permissions(&["config:view"]),
            RouteMeta::protected("/message-tasks", "MessageTaskList")
                .with_permissions(&["message_task:view"]),
            RouteMeta::protected("/message-tasks/add", "MessageTaskAdd")
                .with_permissions(&["message_task:edit"]),
            RouteMeta::protected("/message-tasks/edit/:id", "MessageTaskEdit")
                .with_permissions(&["message_task:edit"]),
            RouteMeta::protected("/sys-info", "SysInfo").with_permissions(&[ADMIN_PERMISSION]),
        ];
        Self { routes }
    }

    /// Find the route for a path. Static patterns win over parameterized ones.
    pub fn find(&self, path: &str) -> Option<&RouteMeta> {
        self.routes
            .iter()
            .filter(|r| r.matches(path))
            .max_by_key(|r| r.is_static())
    }

    /// Route metadata for a path. Unknown paths are treated as protected.
    pub fn resolve(&self, path: &str) -> RouteMeta {
        self.find(path)
            .cloned()
            .unwrap_or_else(|| RouteMeta::protected(path, "Unknown"))
    }

    pub fn routes(&self) -> &[RouteMeta] {
        &self.routes
    }
}

/// Permission tags held by the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(HashSet<String>);

impl PermissionSet {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Whether the route may be entered with these permissions.
    ///
    /// Routes without tags are open to every signed-in user; `admin` opens
    /// everything.
    pub fn allows(&self, route: &RouteMeta) -> bool {
        route.permissions.is_empty()
            || self.contains(ADMIN_PERMISSION)
            || route.permissions.iter().any(|p| self.contains(p))
    }
}
