//! Login, logout, verification and explicit token refresh.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::ClassifiedError;
use crate::request::RequestSpec;
use crate::session::Credential;

pub const LOGIN_PATH: &str = "/wx/auth/login";
pub const LOGOUT_PATH: &str = "/wx/auth/logout";
pub const VERIFY_PATH: &str = "/wx/auth/verify";
pub const REFRESH_PATH: &str = "/wx/auth/refresh";

/// Token payload of the login and refresh endpoints.
///
/// Backends have returned the credential as either `token` or
/// `access_token`; both are accepted.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Non-secret details of a freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionGrant {
    pub token_type: String,
    /// Lifetime in seconds, when the backend reports it.
    pub expires_in: Option<u64>,
}

impl TokenPayload {
    fn into_grant(self) -> Result<(Credential, SessionGrant), ClassifiedError> {
        let token = self
            .token
            .or(self.access_token)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClassifiedError::payload("response carried no token"))?;

        let grant = SessionGrant {
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in: self.expires_in,
        };
        Ok((Credential::new(token), grant))
    }
}

impl ApiClient {
    /// Sign in with a username and password.
    ///
    /// The request never carries the stored credential. The credential from
    /// the response replaces whatever the session held. A rejected login is
    /// an `Application` error; the session is left untouched in that case.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionGrant, ClassifiedError> {
        let request = RequestSpec::post(LOGIN_PATH)
            .form([("username", username), ("password", password)])
            .anonymous()
            .without_expiry_notice();

        let payload: TokenPayload = self.call_as(request).await?;
        let (credential, grant) = payload.into_grant()?;

        self.session().set(credential);
        info!(username, "Logged in");
        Ok(grant)
    }

    /// Sign out.
    ///
    /// The backend is told first; the local credential is cleared whether or
    /// not that call succeeds. The backend error, if any, is returned after
    /// clearing.
    pub async fn logout(&self) -> Result<(), ClassifiedError> {
        let result = if self.session().is_authenticated() {
            self.call_unit(RequestSpec::post(LOGOUT_PATH).without_expiry_notice())
                .await
        } else {
            Ok(())
        };

        self.session().clear();
        match &result {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!("Logged out locally, backend logout failed: {}", e),
        }
        result
    }

    /// Ask the backend whether the stored credential is still valid.
    ///
    /// Expiry detected here clears the session but is not announced: the
    /// caller (normally the navigation guard) owns the redirect.
    pub async fn verify(&self) -> Result<(), ClassifiedError> {
        self.call_unit(RequestSpec::get(VERIFY_PATH).without_expiry_notice())
            .await
    }

    /// Exchange the current credential for a new one.
    ///
    /// Only ever invoked explicitly; nothing refreshes in the background.
    pub async fn refresh(&self) -> Result<SessionGrant, ClassifiedError> {
        let payload: TokenPayload = self.call_as(RequestSpec::post(REFRESH_PATH)).await?;
        let (credential, grant) = payload.into_grant()?;
        self.session().set(credential);
        info!("Session refreshed");
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_field_variants() {
        let payload: TokenPayload = serde_json::from_value(json!({"token": "T"})).unwrap();
        let (credential, grant) = payload.into_grant().unwrap();
        assert_eq!(credential.expose(), "T");
        assert_eq!(grant.token_type, "bearer");

        let payload: TokenPayload = serde_json::from_value(json!({
            "access_token": "A",
            "token_type": "bearer",
            "expires_in": 3600
        }))
        .unwrap();
        let (credential, grant) = payload.into_grant().unwrap();
        assert_eq!(credential.expose(), "A");
        assert_eq!(grant.expires_in, Some(3600));
    }

    #[test]
    fn test_missing_token_is_payload_error() {
        let payload: TokenPayload = serde_json::from_value(json!({"token": " "})).unwrap();
        let err = payload.into_grant().unwrap_err();
        assert!(err.message().contains("no token"));
    }
}
